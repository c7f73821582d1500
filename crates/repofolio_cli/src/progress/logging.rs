use repofolio::RecordSource;
use repofolio::scan::ScanProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: ScanProgress) {
        match event {
            ScanProgress::ScanningAccounts { count } => {
                tracing::info!(count, "Scanning accounts");
            }

            ScanProgress::FetchingRepos { account } => {
                tracing::info!(account = %account, "Listing repositories");
            }

            ScanProgress::FetchedPage {
                account,
                page,
                count,
                kept_so_far,
            } => {
                tracing::debug!(account = %account, page, count, kept_so_far, "Fetched page");
            }

            ScanProgress::AccountInaccessible { account, error } => {
                tracing::warn!(account = %account, error = %error, "Account inaccessible");
            }

            ScanProgress::ListingTruncated {
                account,
                page,
                error,
            } => {
                tracing::warn!(account = %account, page, error = %error, "Listing truncated");
            }

            ScanProgress::FetchComplete {
                account,
                listed,
                kept,
            } => {
                tracing::info!(account = %account, listed, kept, "Listing complete");
            }

            ScanProgress::ResolvingDetails { account, count } => {
                tracing::debug!(account = %account, count, "Resolving details");
            }

            ScanProgress::ResolvedRepo {
                full_name, source, ..
            } => {
                let fallback = source == RecordSource::ListFallback;
                tracing::debug!(repo = %full_name, fallback, "Resolved");
            }

            ScanProgress::DetailFallback {
                full_name, error, ..
            } => {
                tracing::warn!(repo = %full_name, error = %error, "Using listing data");
            }

            ScanProgress::AccountComplete { account, records } => {
                tracing::info!(account = %account, records, "Account complete");
            }

            ScanProgress::ScanComplete {
                accounts,
                records,
                inaccessible,
            } => {
                tracing::info!(accounts, records, inaccessible, "All accounts scanned");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
