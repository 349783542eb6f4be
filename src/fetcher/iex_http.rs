//! HTTP transport for IEX Cloud calls
//!
//! The executor only needs "send this GET, give me status and body". That
//! seam is the [`HttpTransport`] trait: [`ReqwestTransport`] is the
//! production implementation, tests substitute an in-memory one.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::downloader::config::{HTTP_CONNECT_TIMEOUT_SECS, HTTP_REQUEST_TIMEOUT_SECS};
use crate::fetcher::{FetcherError, FetcherResult};

/// HTTP method set used by IEX Cloud endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
}

/// Wire request produced by a request descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method
    pub method: HttpMethod,
    /// Fully built URL including query string
    pub url: String,
}

impl HttpRequest {
    /// GET request for `url`
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
        }
    }
}

/// Wire response: status line and fully buffered body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Body bytes
    pub body: Bytes,
}

impl HttpResponse {
    /// Response with the given status and body
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in 200-299
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Canonical reason phrase for the status ("Too Many Requests")
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown Status")
    }
}

/// Transport contract: send one request, return the buffered response
///
/// Only transport-level failures are errors here; every HTTP status,
/// including 4xx and 5xx, is returned as a response for the executor to
/// classify.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and buffer the response
    async fn send(&self, request: HttpRequest) -> FetcherResult<HttpResponse>;
}

/// Production transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    /// Create a transport with connect and request timeouts applied
    ///
    /// # Errors
    /// [`FetcherError::Transport`] if the HTTP client cannot be initialised
    /// (for example when no TLS backend is available).
    pub fn try_new() -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetcherError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client))
    }

    /// Like [`try_new`](Self::try_new), falling back to reqwest's defaults
    ///
    /// The fallback has no connect or request timeout and is logged.
    ///
    /// # Panics
    /// Panics if reqwest cannot build even a default client.
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|e| {
            warn!(error = %e, "using an HTTP client without timeouts");
            Self::with_client(Client::new())
        })
    }

    /// Wrap a caller-configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> FetcherResult<HttpResponse> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
        };

        let response = builder.send().await.map_err(|e| {
            // reqwest includes the URL in its messages; drop it so the token never leaks
            let e = e.without_url();
            if e.is_timeout() {
                FetcherError::Transport(format!("request timeout: {e}"))
            } else if e.is_connect() {
                FetcherError::Transport(format!("connection failed: {e}"))
            } else {
                FetcherError::Transport(format!("request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            FetcherError::Transport(format!("failed to read response body: {}", e.without_url()))
        })?;

        debug!(status, bytes = body.len(), "HTTP response received");
        Ok(HttpResponse { status, body })
    }
}
