//! Forge API error types.

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when fetching from the forge API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt in the budget failed.
    #[error(
        "gave up on {url} after {attempts} attempt(s), last status: {}",
        .last_status.map_or_else(|| "no response".to_string(), |s| s.to_string())
    )]
    Exhausted {
        url: String,
        last_status: Option<u16>,
        attempts: u32,
    },

    /// A successful response did not have the expected shape.
    #[error("unexpected payload from {url}: {message}")]
    Decode { url: String, message: String },

    /// The configured API base URL is unusable.
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The HTTP client could not be set up.
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] HttpError),
}

impl FetchError {
    /// Last HTTP status seen before giving up, if any.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        match self {
            FetchError::Exhausted { last_status, .. } => *last_status,
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, FetchError::Exhausted { .. })
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which keeps progress output on
/// a single line.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}
