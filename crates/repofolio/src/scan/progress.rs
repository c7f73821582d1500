//! Progress reporting types for account scans.

use crate::record::RecordSource;

/// Progress events emitted while scanning accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanProgress {
    /// Starting a scan over several accounts.
    ScanningAccounts {
        /// Number of accounts, duplicates included.
        count: usize,
    },

    /// Starting to list repositories for an account.
    FetchingRepos { account: String },

    /// Fetched a page of the account listing.
    FetchedPage {
        account: String,
        /// Page number (1-indexed).
        page: u32,
        /// Repositories on this page, before filtering.
        count: usize,
        /// Repositories kept so far, after filtering.
        kept_so_far: usize,
    },

    /// The first listing page could not be fetched.
    AccountInaccessible { account: String, error: String },

    /// A later listing page could not be fetched; earlier pages are kept.
    ListingTruncated {
        account: String,
        page: u32,
        error: String,
    },

    /// Listing finished.
    FetchComplete {
        account: String,
        /// Repositories seen across all pages.
        listed: usize,
        /// Repositories left after filtering.
        kept: usize,
    },

    /// Starting detail lookups for an account.
    ResolvingDetails { account: String, count: usize },

    /// One repository resolved.
    ResolvedRepo {
        account: String,
        full_name: String,
        source: RecordSource,
    },

    /// A detail lookup failed and listing data is used instead.
    DetailFallback {
        account: String,
        full_name: String,
        error: String,
    },

    /// Account finished.
    AccountComplete { account: String, records: usize },

    /// All accounts finished.
    ScanComplete {
        accounts: usize,
        records: usize,
        inaccessible: usize,
    },
}

/// Progress callback for scan operations.
pub type ProgressCallback = Box<dyn Fn(ScanProgress) + Send + Sync>;

/// Emit a progress event if a callback is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: ScanProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
