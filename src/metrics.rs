//! Observability metrics for IEX Cloud calls
//!
//! Recorded through the `metrics` facade, so every call is a no-op until a
//! recorder is installed. [`init_metrics`] installs the Prometheus exporter
//! with a scrape endpoint.
//!
//! - `iex_requests_total{endpoint,status}`: one per completed call; `status`
//!   is the HTTP code or `transport_error`
//! - `iex_request_duration_seconds{endpoint}`: send-to-response latency
//! - `iex_decode_errors_total{endpoint,stage}`: bodies that failed to decode
//! - `rate_limit_wait_seconds`: time spent waiting for a rate limiter permit

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::fetcher::DecodeStage;

/// Global metrics registry initialization flag
static METRICS_INITIALIZED: Lazy<RwLock<bool>> = Lazy::new(|| RwLock::new(false));

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus exporter could not be installed (address in use, recorder already set)
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Initialize metrics with a Prometheus exporter listening on `addr`
///
/// Idempotent: later calls return `Ok(())` without reinstalling.
pub async fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut initialized = METRICS_INITIALIZED.write().await;
    if *initialized {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!(
        "iex_requests_total",
        Unit::Count,
        "Total number of IEX Cloud requests by endpoint and status"
    );
    describe_histogram!(
        "iex_request_duration_seconds",
        Unit::Seconds,
        "IEX Cloud request duration in seconds"
    );
    describe_counter!(
        "iex_decode_errors_total",
        Unit::Count,
        "Total number of IEX Cloud responses that failed to decode"
    );
    describe_histogram!(
        "rate_limit_wait_seconds",
        Unit::Seconds,
        "Time spent waiting for the request rate limiter"
    );

    *initialized = true;
    info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Check if the metrics exporter is installed
pub async fn is_initialized() -> bool {
    *METRICS_INITIALIZED.read().await
}

/// Timing and outcome of a single IEX Cloud request
#[derive(Debug)]
pub struct RequestMetrics {
    endpoint: &'static str,
    start_time: Instant,
}

impl RequestMetrics {
    /// Start timing a request to `endpoint`
    pub fn start(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start_time: Instant::now(),
        }
    }

    /// Record a response with `status`
    pub fn record_status(&self, status: u16) -> Duration {
        self.record(status.to_string())
    }

    /// Record a request that failed before producing a response
    pub fn record_transport_error(&self) -> Duration {
        self.record("transport_error".to_string())
    }

    fn record(&self, status: String) -> Duration {
        let duration = self.start_time.elapsed();

        counter!(
            "iex_requests_total",
            "endpoint" => self.endpoint,
            "status" => status,
        )
        .increment(1);

        histogram!(
            "iex_request_duration_seconds",
            "endpoint" => self.endpoint,
        )
        .record(duration.as_secs_f64());

        duration
    }
}

/// Record a response body that failed to decode
pub fn record_decode_error(endpoint: &'static str, stage: DecodeStage) {
    counter!(
        "iex_decode_errors_total",
        "endpoint" => endpoint,
        "stage" => stage.as_str(),
    )
    .increment(1);
}

/// Record time spent waiting on the rate limiter
pub fn record_rate_limit_wait(wait: Duration) {
    histogram!("rate_limit_wait_seconds").record(wait.as_secs_f64());

    if wait > Duration::from_secs(1) {
        warn!(wait_ms = wait.as_millis(), "Long rate limiter wait");
    }
}
