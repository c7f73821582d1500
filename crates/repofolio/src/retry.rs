//! Retry policy for forge API calls.
//!
//! Each logical fetch owns a [`RetryState`]: an attempt counter plus an
//! exponential backoff sequence. After a failed attempt the state picks the
//! wait from the response's rate-limit headers when the server gave one, and
//! from the backoff sequence otherwise.

use std::fmt;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};

use crate::rate_limit::RateLimitSnapshot;

/// Smallest accepted attempt budget.
pub const MIN_ATTEMPTS: u32 = 1;
/// Largest accepted attempt budget.
pub const MAX_ATTEMPTS: u32 = 20;
/// Attempt budget when nothing else is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
/// First backoff delay; doubles on every failed attempt.
pub const BASE_DELAY: Duration = Duration::from_secs(1);
/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(300);
/// Added to every wait derived from `X-RateLimit-Reset`.
pub const RESET_SAFETY_MARGIN: Duration = Duration::from_secs(2);

/// Clamp a requested attempt budget into `[MIN_ATTEMPTS, MAX_ATTEMPTS]`.
#[must_use]
pub fn clamp_max_attempts(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_ATTEMPTS), i64::from(MAX_ATTEMPTS)) as u32
}

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// First backoff delay.
    pub min_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Total attempts per fetch, including the first one.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: BASE_DELAY,
            max_delay: MAX_BACKOFF_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryConfig {
    /// Default delays with the given attempt budget, clamped to the allowed range.
    #[must_use]
    pub fn with_max_attempts(max_attempts: i64) -> Self {
        Self {
            max_attempts: clamp_max_attempts(max_attempts),
            ..Self::default()
        }
    }

    /// Build an exponential backoff strategy from this configuration.
    ///
    /// No jitter: delays run 1, 2, 4 seconds and so on up to `max_delay`.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts as usize)
    }
}

/// Why the fetcher is about to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// The server sent `Retry-After`.
    RetryAfter,
    /// The quota is exhausted; waiting for `X-RateLimit-Reset`.
    RateLimitReset,
    /// Generic failure; exponential backoff.
    Backoff,
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WaitReason::RetryAfter => "retry-after",
            WaitReason::RateLimitReset => "rate-limit reset",
            WaitReason::Backoff => "backoff",
        };
        f.write_str(label)
    }
}

/// A chosen wait before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDelay {
    pub duration: Duration,
    pub reason: WaitReason,
}

/// Attempt bookkeeping for one logical fetch.
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    max_delay: Duration,
    backoff: ExponentialBackoff,
}

impl RetryState {
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        let max_attempts = config.max_attempts.clamp(MIN_ATTEMPTS, MAX_ATTEMPTS);
        let backoff = RetryConfig {
            max_attempts,
            ..config.clone()
        }
        .into_backoff()
        .build();

        Self {
            attempt: 0,
            max_attempts,
            max_delay: config.max_delay,
            backoff,
        }
    }

    /// Record the start of a new attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Attempts started so far.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True once the attempt budget is spent.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Decide how long to wait after a failed attempt.
    ///
    /// `snapshot` is `None` when no response arrived. `now_epoch` is the
    /// current Unix time in seconds. The backoff sequence advances on every
    /// call, so the backoff delay always matches the attempt number even when
    /// earlier attempts waited on headers instead.
    pub fn next_delay(
        &mut self,
        snapshot: Option<&RateLimitSnapshot>,
        now_epoch: i64,
    ) -> RetryDelay {
        let backoff = self.backoff.next().unwrap_or(self.max_delay);

        if let Some(snapshot) = snapshot {
            if let Some(secs) = snapshot.retry_after_seconds.filter(|s| *s > 0) {
                return RetryDelay {
                    duration: Duration::from_secs(secs as u64),
                    reason: WaitReason::RetryAfter,
                };
            }

            if snapshot.is_exhausted()
                && let Some(reset) = snapshot.reset_epoch_seconds
            {
                return RetryDelay {
                    duration: reset_wait(reset, now_epoch),
                    reason: WaitReason::RateLimitReset,
                };
            }
        }

        RetryDelay {
            duration: backoff,
            reason: WaitReason::Backoff,
        }
    }
}

/// Wait until `reset_epoch` plus the safety margin, never less than the margin.
#[must_use]
pub fn reset_wait(reset_epoch: i64, now_epoch: i64) -> Duration {
    let wait = reset_epoch.saturating_sub(now_epoch).max(0);
    Duration::from_secs(wait as u64) + RESET_SAFETY_MARGIN
}
