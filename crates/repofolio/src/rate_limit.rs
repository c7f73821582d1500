//! Rate-limit signals carried in forge API response headers.

use chrono::{DateTime, Utc};

use crate::http::{HttpHeaders, header_get};

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RESET_HEADER: &str = "x-ratelimit-reset";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Rate-limit fields read from a single response.
///
/// Every field is optional: a header that is missing or does not parse as an
/// integer is simply absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Requests left in the current window.
    pub remaining: Option<i64>,
    /// Size of the window quota.
    pub limit: Option<i64>,
    /// Unix timestamp at which the window resets.
    pub reset_epoch_seconds: Option<i64>,
    /// Explicit server instruction to wait this many seconds.
    pub retry_after_seconds: Option<i64>,
}

impl RateLimitSnapshot {
    /// Read the rate-limit headers from a header set.
    #[must_use]
    pub fn from_headers(headers: &HttpHeaders) -> Self {
        Self {
            remaining: parse_header(headers, REMAINING_HEADER),
            limit: parse_header(headers, LIMIT_HEADER),
            reset_epoch_seconds: parse_header(headers, RESET_HEADER),
            retry_after_seconds: parse_header(headers, RETRY_AFTER_HEADER),
        }
    }

    /// True when the server reported a fully consumed quota.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// The reset time, if present and representable.
    #[must_use]
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset_epoch_seconds
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

fn parse_header(headers: &HttpHeaders, name: &str) -> Option<i64> {
    header_get(headers, name)?.trim().parse::<i64>().ok()
}
