use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// HTTP headers represented as key/value pairs.
///
/// Header names are treated case-insensitively by helper functions.
pub type HttpHeaders = Vec<(String, String)>;

/// A GET request against the forge API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HttpHeaders,
}

/// A minimal HTTP response. Headers are kept for every status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for GET {url}")]
    NoMockResponse { url: String },
}

/// Transport boundary for all HTTP I/O.
///
/// Implementations return `Ok` for any response the server produced, whatever
/// its status; `Err` means no response arrived at all.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Forge transport over a pooled `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Transport whose requests fail after `timeout` without a full response.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map(Self::new)
            .map_err(transport_error)
    }
}

fn transport_error(e: reqwest::Error) -> HttpError {
    HttpError::Transport(e.to_string())
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let builder = request
            .headers
            .iter()
            .fold(self.client.get(&request.url), |b, (k, v)| b.header(k, v));
        let resp = builder.send().await.map_err(transport_error)?;

        let status = resp.status().as_u16();
        // Values that are not visible ASCII are kept as empty strings
        let headers: HttpHeaders = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = resp.bytes().await.map_err(transport_error)?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Scripted transport for unit tests.
///
/// Each URL has a FIFO queue of outcomes; every request is recorded.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: std::sync::Arc<std::sync::Mutex<MockState>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockState {
    queued: std::collections::HashMap<String, std::collections::VecDeque<MockOutcome>>,
    seen: Vec<HttpRequest>,
}

#[cfg(test)]
enum MockOutcome {
    Respond(HttpResponse),
    Fail(String),
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue `response` for the next unanswered GET of `url`.
    pub fn push_response(&self, url: impl Into<String>, response: HttpResponse) {
        self.enqueue(url.into(), MockOutcome::Respond(response));
    }

    /// Queue a connection-level failure for `url`.
    pub fn push_failure(&self, url: impl Into<String>, reason: impl Into<String>) {
        self.enqueue(url.into(), MockOutcome::Fail(reason.into()));
    }

    fn enqueue(&self, url: String, outcome: MockOutcome) {
        self.state().queued.entry(url).or_default().push_back(outcome);
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().seen.clone()
    }

    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        self.state().seen.iter().filter(|r| r.url == url).count()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut state = self.state();
        let url = request.url.clone();
        state.seen.push(request);

        match state.queued.get_mut(&url).and_then(std::collections::VecDeque::pop_front) {
            Some(MockOutcome::Respond(resp)) => Ok(resp),
            Some(MockOutcome::Fail(reason)) => Err(HttpError::Transport(reason)),
            None => Err(HttpError::NoMockResponse { url }),
        }
    }
}
