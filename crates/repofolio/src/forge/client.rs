//! Forge API client and the resilient fetch loop.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use serde_json::Value;
use url::Url;

use super::error::FetchError;
use super::outcome::{FetchOutcome, body_preview};
use super::types::RateLimitResponse;
use crate::debug::{DebugArtifact, DebugSink};
use crate::http::{HttpHeaders, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::rate_limit::RateLimitSnapshot;
use crate::retry::{RetryConfig, RetryState};

/// Default API host.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = "repofolio";

/// Forge REST API client.
///
/// Every call goes through [`ForgeClient::fetch_json`], which retries failed
/// attempts according to the client's [`RetryConfig`]. Calls are strictly
/// sequential; the client holds no mutable state.
#[derive(Clone)]
pub struct ForgeClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    token: Option<String>,
    user_agent: String,
    retry: RetryConfig,
    debug_sink: Option<Arc<dyn DebugSink>>,
}

impl ForgeClient {
    /// Create a client backed by reqwest, with `timeout` per request.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use std::time::Duration;
    /// use repofolio::forge::{ForgeClient, DEFAULT_API_BASE};
    /// use repofolio::retry::RetryConfig;
    ///
    /// let client = ForgeClient::new(DEFAULT_API_BASE, None, RetryConfig::default(), Duration::from_secs(30))?;
    /// let repos = client.fetch_json("https://api.github.com/users/octocat/repos", "list").await?;
    /// ```
    pub fn new(
        base_url: &str,
        token: Option<String>,
        retry: RetryConfig,
        timeout: StdDuration,
    ) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Self::new_with_transport(base_url, token, retry, Arc::new(transport))
    }

    pub fn new_with_transport(
        base_url: &str,
        token: Option<String>,
        retry: RetryConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, FetchError> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| FetchError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(FetchError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        Ok(Self {
            transport,
            base_url: parsed,
            token: token.filter(|t| !t.trim().is_empty()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retry,
            debug_sink: None,
        })
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Persist responses to `sink` while fetching.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Build an API URL from path segments and query parameters.
    ///
    /// Segments are percent-encoded, so a `/` inside a segment cannot change
    /// the route.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url.to_string()
    }

    fn request_headers(&self) -> HttpHeaders {
        let mut headers = vec![
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            ("User-Agent".to_string(), self.user_agent.clone()),
        ];
        if let Some(token) = &self.token {
            headers.push(("Authorization".to_string(), format!("token {token}")));
        }
        headers
    }

    /// GET `url` and decode its JSON body, retrying failed attempts.
    ///
    /// Any non-2xx response and any transport failure counts as a failed
    /// attempt, 404 included. Between attempts the client sleeps for the
    /// `Retry-After` value, until the rate-limit reset (plus a margin) when
    /// the quota is exhausted, or for the exponential backoff delay.
    ///
    /// `label` names debug artifacts for this call. The payload is `Null` for
    /// an empty body and a JSON string for a body that is not JSON.
    pub async fn fetch_json(&self, url: &str, label: &str) -> Result<Value, FetchError> {
        let mut state = RetryState::new(&self.retry);
        let mut last_status = None;

        loop {
            let attempt = state.begin_attempt();
            let request = HttpRequest {
                url: url.to_string(),
                headers: self.request_headers(),
            };

            let (outcome, snapshot) = match self.transport.get(request).await {
                Ok(response) => {
                    let snapshot = RateLimitSnapshot::from_headers(&response.headers);
                    tracing::debug!(
                        url,
                        attempt,
                        status = response.status,
                        remaining = ?snapshot.remaining,
                        limit = ?snapshot.limit,
                        "Forge API response"
                    );
                    let outcome = FetchOutcome::classify(&response, snapshot);
                    self.record_response(label, url, attempt, &response);
                    (outcome, Some(snapshot))
                }
                Err(e) => {
                    let reason = e.to_string();
                    tracing::debug!(url, attempt, error = %reason, "Forge API request failed");
                    self.record_transport_failure(label, url, attempt, &reason);
                    (
                        FetchOutcome::TransientError {
                            status: None,
                            reason,
                        },
                        None,
                    )
                }
            };

            let outcome = match outcome {
                FetchOutcome::Success { payload, .. } => return Ok(payload),
                failed => failed,
            };
            last_status = outcome.status().or(last_status);

            if state.is_exhausted() {
                tracing::warn!(
                    url,
                    attempts = state.attempt(),
                    last_status = ?last_status,
                    "Giving up: {}",
                    outcome
                );
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    last_status,
                    attempts: state.attempt(),
                });
            }

            let delay = state.next_delay(snapshot.as_ref(), Utc::now().timestamp());
            tracing::warn!(
                url,
                attempt,
                max_attempts = state.max_attempts(),
                wait_secs = delay.duration.as_secs(),
                reason = %delay.reason,
                reset_at = ?snapshot.as_ref().and_then(RateLimitSnapshot::reset_at),
                "Request failed ({}), retrying",
                outcome
            );
            tokio::time::sleep(delay.duration).await;
        }
    }

    /// Fetch `/rate_limit`.
    pub async fn get_rate_limits(&self) -> Result<RateLimitResponse, FetchError> {
        let url = self.endpoint(&["rate_limit"], &[]);
        let payload = self.fetch_json(&url, "rate_limit").await?;
        serde_json::from_value(payload).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }

    fn record_response(&self, label: &str, url: &str, attempt: u32, response: &HttpResponse) {
        let Some(sink) = &self.debug_sink else {
            return;
        };
        let body = if response.is_success() {
            String::from_utf8_lossy(&response.body).into_owned()
        } else {
            body_preview(&response.body)
        };
        sink.record(&DebugArtifact {
            prefix: label,
            url,
            attempt,
            status: Some(response.status),
            headers: &response.headers,
            body: &body,
        });
    }

    fn record_transport_failure(&self, label: &str, url: &str, attempt: u32, reason: &str) {
        if let Some(sink) = &self.debug_sink {
            sink.record(&DebugArtifact {
                prefix: label,
                url,
                attempt,
                status: None,
                headers: &HttpHeaders::new(),
                body: reason,
            });
        }
    }
}
