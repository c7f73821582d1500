use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use repofolio::RecordSource;
use repofolio::scan::ScanProgress;

/// Bar and counters for one account.
struct AccountState {
    bar: ProgressBar,
    fallbacks: usize,
    done: bool,
}

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Account bars by account name.
    accounts: HashMap<String, AccountState>,
}

/// Interactive progress reporter using indicatif.
///
/// Each account starts as a spinner while its listing pages come in, then
/// becomes a bar over its kept repositories while details are resolved.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Reporter that never draws, for tests.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(
            indicatif::ProgressDrawTarget::hidden(),
        ))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn handle(&self, event: ScanProgress) {
        let mut state = self.lock();

        match event {
            ScanProgress::FetchingRepos { account } => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::spinner_style());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar.set_prefix(format!("{:16}", account));
                bar.set_message("Listing repositories...");

                state.accounts.insert(
                    account,
                    AccountState {
                        bar,
                        fallbacks: 0,
                        done: false,
                    },
                );
            }

            ScanProgress::FetchedPage {
                account,
                page,
                kept_so_far,
                ..
            } => {
                if let Some(s) = state.accounts.get(&account) {
                    s.bar
                        .set_message(format!("Page {} ({} repos kept)", page, kept_so_far));
                }
            }

            ScanProgress::ListingTruncated {
                account,
                page,
                error,
            } => {
                let _ = self.multi.println(format!(
                    "⚠ {}: listing stopped at page {}: {}",
                    account, page, error
                ));
            }

            ScanProgress::FetchComplete {
                account,
                listed,
                kept,
            } => {
                if let Some(s) = state.accounts.get(&account) {
                    s.bar
                        .set_message(format!("Listed {} repos, kept {}", listed, kept));
                }
            }

            ScanProgress::ResolvingDetails { account, count } => {
                if let Some(s) = state.accounts.get(&account) {
                    s.bar.disable_steady_tick();
                    s.bar.set_length(count as u64);
                    s.bar.set_position(0);
                    s.bar.set_style(Self::bar_style());
                    s.bar.set_message("Resolving details...");
                }
            }

            ScanProgress::ResolvedRepo {
                account,
                full_name,
                source,
            } => {
                if let Some(s) = state.accounts.get_mut(&account) {
                    if source == RecordSource::ListFallback {
                        s.fallbacks += 1;
                    }
                    s.bar.inc(1);
                    s.bar.set_message(full_name);
                }
            }

            ScanProgress::DetailFallback {
                full_name, error, ..
            } => {
                let _ = self.multi.println(format!(
                    "· {}: using listing data ({})",
                    full_name, error
                ));
            }

            ScanProgress::AccountInaccessible { account, error } => {
                if let Some(s) = state.accounts.get_mut(&account) {
                    s.done = true;
                    s.bar.disable_steady_tick();
                    s.bar.set_style(Self::spinner_style());
                    s.bar.finish_with_message(format!("✗ inaccessible: {}", error));
                }
            }

            ScanProgress::AccountComplete { account, records } => {
                if let Some(s) = state.accounts.get_mut(&account) {
                    s.done = true;
                    let msg = if s.fallbacks > 0 {
                        format!("✓ {} repos ({} from listing data)", records, s.fallbacks)
                    } else {
                        format!("✓ {} repos", records)
                    };
                    s.bar.finish_with_message(msg);
                }
            }

            _ => {}
        }
    }

    /// Finish any bars still running.
    pub fn finish(&self) {
        let state = self.lock();
        for s in state.accounts.values().filter(|s| !s.done) {
            s.bar.abandon();
        }
    }

    /// Names of accounts whose bars have finished, sorted.
    #[cfg(test)]
    pub fn finished_accounts(&self) -> Vec<String> {
        let state = self.lock();
        let mut names: Vec<String> = state
            .accounts
            .iter()
            .filter(|(_, s)| s.done)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
