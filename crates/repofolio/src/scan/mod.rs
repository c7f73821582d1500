//! Account scanning.
//!
//! # Module Structure
//!
//! - [`types`] - `ScanOptions`, `AccountReport`, `ScanSummary`
//! - [`filter`] - Listing filters and account/name list parsing
//! - [`progress`] - Progress reporting: `ScanProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - `scan_account()`, `scan_accounts()`

pub mod engine;
pub mod filter;
mod progress;
mod types;

pub use engine::{scan_account, scan_accounts};
pub use filter::{ExclusionReason, RepoFilter, parse_name_list};
pub use progress::{ProgressCallback, ScanProgress, emit};
pub use types::{AccountReport, ScanOptions, ScanSummary};
