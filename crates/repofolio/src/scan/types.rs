//! Scan options and per-account results.

use serde::Serialize;

use super::filter::RepoFilter;
use crate::record::RepositoryRecord;

/// Options for scanning accounts.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Listing filters.
    pub filter: RepoFilter,
}

/// Result of scanning a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountReport {
    /// The account as given on input.
    pub account: String,
    /// Resolved records, in listing order.
    pub records: Vec<RepositoryRecord>,
    /// False when the first listing page could not be fetched.
    pub accessible: bool,
    /// Error if the account could not be listed at all.
    pub error: Option<String>,
}

impl AccountReport {
    /// Number of records resolved from listing data only.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_fallback()).count()
    }
}

/// Totals over a whole scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub accounts: usize,
    pub records: usize,
    pub inaccessible: usize,
    pub fallbacks: usize,
}

impl ScanSummary {
    #[must_use]
    pub fn from_reports(reports: &[AccountReport]) -> Self {
        reports.iter().fold(Self::default(), |mut acc, report| {
            acc.accounts += 1;
            acc.records += report.records.len();
            acc.fallbacks += report.fallback_count();
            if !report.accessible {
                acc.inaccessible += 1;
            }
            acc
        })
    }
}
