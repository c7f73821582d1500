//! Repofolio - static HTML reports of the public repositories owned by a set
//! of forge accounts.
//!
//! Every API call goes through a retrying fetcher that reads the forge's
//! rate-limit headers and waits instead of failing when the quota runs out.
//! Accounts are listed page by page, each kept repository is resolved through
//! the single-repository endpoint (falling back to listing data when that
//! fails), and the results are rendered into one HTML page.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use repofolio::forge::{ForgeClient, DEFAULT_API_BASE};
//! use repofolio::report::{ReportOptions, render_report};
//! use repofolio::retry::RetryConfig;
//! use repofolio::scan::{ScanOptions, scan_accounts};
//!
//! let retry = RetryConfig::with_max_attempts(6);
//! let client = ForgeClient::new(DEFAULT_API_BASE, token, retry, Duration::from_secs(30))?;
//! let reports = scan_accounts(&client, &accounts, &ScanOptions::default(), None).await;
//! let html = render_report(&reports, &ReportOptions::default())?;
//! ```

pub mod debug;
pub mod forge;
pub mod http;
pub mod rate_limit;
pub mod record;
pub mod report;
pub mod retry;
pub mod scan;

pub use debug::{DebugSink, FileDebugSink};
pub use forge::{FetchError, ForgeClient};
pub use rate_limit::RateLimitSnapshot;
pub use record::{LicenseInfo, ParentInfo, RecordSource, RepositoryRecord};
pub use report::{ReportError, ReportOptions, render_report, write_report};
pub use retry::{RetryConfig, clamp_max_attempts};
pub use scan::{AccountReport, ScanOptions, ScanProgress, scan_accounts};
