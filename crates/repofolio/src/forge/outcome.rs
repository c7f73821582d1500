//! Classification of a single HTTP attempt.

use std::fmt;

use serde_json::Value;

use crate::http::HttpResponse;
use crate::rate_limit::RateLimitSnapshot;

/// Maximum characters of a response body kept for diagnostics.
pub const BODY_PREVIEW_CHARS: usize = 800;

/// Result of one attempt against the forge API.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 2xx response with its decoded body.
    Success {
        payload: Value,
        snapshot: RateLimitSnapshot,
    },
    /// 403/429 carrying an exhausted quota or a `Retry-After` instruction.
    RateLimited {
        status: u16,
        snapshot: RateLimitSnapshot,
    },
    /// 5xx, other 403/429, or no response at all.
    TransientError { status: Option<u16>, reason: String },
    /// Any other non-2xx status.
    PermanentError { status: u16, body_preview: String },
}

impl FetchOutcome {
    /// Classify a response. `snapshot` must come from the same response.
    #[must_use]
    pub fn classify(response: &HttpResponse, snapshot: RateLimitSnapshot) -> Self {
        let status = response.status;
        match status {
            200..=299 => FetchOutcome::Success {
                payload: decode_body(&response.body),
                snapshot,
            },
            403 | 429
                if snapshot.is_exhausted() || snapshot.retry_after_seconds.is_some() =>
            {
                FetchOutcome::RateLimited { status, snapshot }
            }
            403 | 429 | 500..=599 => FetchOutcome::TransientError {
                status: Some(status),
                reason: format!("HTTP {status}"),
            },
            _ => FetchOutcome::PermanentError {
                status,
                body_preview: body_preview(&response.body),
            },
        }
    }

    /// HTTP status of a failed attempt, `None` for success or when no
    /// response arrived.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::RateLimited { status, .. } => Some(*status),
            FetchOutcome::TransientError { status, .. } => *status,
            FetchOutcome::PermanentError { status, .. } => Some(*status),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Success { .. } => f.write_str("success"),
            FetchOutcome::RateLimited { status, .. } => write!(f, "rate limited (HTTP {status})"),
            FetchOutcome::TransientError {
                status: Some(_),
                reason,
            } => write!(f, "transient error ({reason})"),
            FetchOutcome::TransientError {
                status: None,
                reason,
            } => write!(f, "network error ({reason})"),
            FetchOutcome::PermanentError { status, .. } => write!(f, "HTTP {status}"),
        }
    }
}

/// Decode a success body without ever failing.
///
/// An empty (or whitespace-only) body decodes to `Null`; a body that is not
/// valid JSON is returned verbatim as a `String`.
#[must_use]
pub fn decode_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// First [`BODY_PREVIEW_CHARS`] characters of a body, lossily decoded.
#[must_use]
pub fn body_preview(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(BODY_PREVIEW_CHARS)
        .collect()
}
