//! Forge REST API access.
//!
//! Every request goes through [`ForgeClient::fetch_json`], which retries
//! failed attempts and honors the rate-limit headers of each response.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for fetch operations
//! - [`types`] - Payload shapes for listing, detail and rate-limit endpoints
//! - [`outcome`] - Per-attempt classification and tolerant body decoding
//! - [`client`] - Client construction and the retry loop
//! - `repo` - Account listing and detail lookups
//! - [`convert`] - Conversion from payloads to report records
//!
//! ```ignore
//! use repofolio::forge::{ForgeClient, DEFAULT_API_BASE};
//! use repofolio::retry::RetryConfig;
//! use repofolio::scan::RepoFilter;
//!
//! let client = ForgeClient::new(DEFAULT_API_BASE, None, RetryConfig::default(), timeout)?;
//! let repos = client.list_account_repos("octocat", &RepoFilter::default(), None).await?;
//! ```

pub mod client;
pub mod convert;
pub mod error;
pub mod outcome;
mod repo;
pub mod types;

pub use client::{DEFAULT_API_BASE, DEFAULT_USER_AGENT, ForgeClient};
pub use convert::{record_from_detail, record_from_summary, spdx_license_url};
pub use error::{FetchError, short_error_message};
pub use outcome::{BODY_PREVIEW_CHARS, FetchOutcome};
pub use repo::PAGE_SIZE;
pub use types::{
    ApiLicense, ApiOwner, ApiParent, RateLimitResource, RateLimitResources, RateLimitResponse,
    RepoDetail, RepoSummary,
};
