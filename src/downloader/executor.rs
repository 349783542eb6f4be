//! Request executor
//!
//! Runs any [`IexRequest`] through the same pipeline: wait for the rate
//! limiter, build the wire request, send it, classify the status and hand the
//! body back to the request for decoding.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::downloader::config::{ERROR_BODY_PREVIEW_BYTES, IEX_BASE_URL};
use crate::downloader::rate_limit::RateLimiter;
use crate::fetcher::iex_http::{HttpResponse, HttpTransport, ReqwestTransport};
use crate::fetcher::{FetcherError, FetcherResult, IexRequest};
use crate::metrics::{self, RequestMetrics};

/// Shared request executor
///
/// Cloning is cheap; clones share the transport and the rate limiter, so
/// every clone counts against the same request budget.
#[derive(Clone)]
pub struct Executor {
    transport: Arc<dyn HttpTransport>,
    rate_limiter: Arc<RateLimiter>,
    base_url: String,
}

impl Executor {
    /// Create an executor over `transport`, gated by `rate_limiter`
    pub fn new(transport: Arc<dyn HttpTransport>, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            transport,
            rate_limiter,
            base_url: IEX_BASE_URL.to_string(),
        }
    }

    /// Point requests at a different API root (sandbox, proxy, local stub)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// API root requests are built against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Rate limiter gating this executor
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Execute one request
    ///
    /// # Errors
    /// - [`FetcherError::Transport`] when no response was received
    /// - [`FetcherError::Provider`] for any status outside 200-299; the body
    ///   is not decoded
    /// - [`FetcherError::Decode`] when a 2xx body does not decode
    pub async fn execute<R: IexRequest>(&self, request: &R) -> FetcherResult<R::Output> {
        let waited = self.rate_limiter.ready().await;
        metrics::record_rate_limit_wait(waited);

        let http_request = request.build_request(&self.base_url);
        let request_metrics = RequestMetrics::start(R::ENDPOINT);

        debug!(endpoint = R::ENDPOINT, op = %request.op(), "Sending IEX Cloud request");

        let response = match self.transport.send(http_request).await {
            Ok(response) => response,
            Err(e) => {
                let duration = request_metrics.record_transport_error();
                warn!(
                    endpoint = R::ENDPOINT,
                    duration_ms = as_millis_u64(duration),
                    error = %e,
                    "IEX Cloud request failed"
                );
                return Err(e);
            }
        };

        let duration = request_metrics.record_status(response.status);

        if !response.is_success() {
            let err = provider_error(request.op(), &response);
            warn!(
                endpoint = R::ENDPOINT,
                status = response.status,
                duration_ms = as_millis_u64(duration),
                "IEX Cloud returned an error status"
            );
            return Err(err);
        }

        debug!(
            endpoint = R::ENDPOINT,
            status = response.status,
            bytes = response.body.len(),
            duration_ms = as_millis_u64(duration),
            "IEX Cloud response received"
        );

        request.decode(&response.body).map_err(|e| {
            if let Some(stage) = e.decode_stage() {
                metrics::record_decode_error(R::ENDPOINT, stage);
            }
            warn!(endpoint = R::ENDPOINT, error = %e, "Failed to decode IEX Cloud response");
            e
        })
    }

    /// Execute one request, giving up once `deadline` has elapsed
    ///
    /// The deadline covers the rate limiter wait as well as the call itself.
    /// A request abandoned mid-flight is dropped and its response discarded.
    pub async fn execute_with_deadline<R: IexRequest>(
        &self,
        request: &R,
        deadline: Duration,
    ) -> FetcherResult<R::Output> {
        match tokio::time::timeout(deadline, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    endpoint = R::ENDPOINT,
                    deadline_ms = as_millis_u64(deadline),
                    "IEX Cloud request deadline exceeded"
                );
                Err(FetcherError::DeadlineExceeded {
                    op: request.op(),
                    deadline,
                })
            }
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(
            Arc::new(ReqwestTransport::new()),
            Arc::new(RateLimiter::default()),
        )
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("base_url", &self.base_url)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn provider_error(op: String, response: &HttpResponse) -> FetcherError {
    let preview = &response.body[..response.body.len().min(ERROR_BODY_PREVIEW_BYTES)];
    FetcherError::Provider {
        op,
        status: response.status,
        reason: response.reason().to_string(),
        body: String::from_utf8_lossy(preview).into_owned(),
    }
}
