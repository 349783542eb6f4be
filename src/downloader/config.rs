//! Provider and transport configuration constants

use std::time::Duration;

/// IEX Cloud API root; request paths are appended with a single `/`.
pub const IEX_BASE_URL: &str = "https://cloud.iexapis.com/stable";

/// Minimum spacing between outbound requests.
/// IEX Cloud allows 100 requests per second per token; 10ms keeps every
/// client at or under that ceiling.
pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_millis(10);

/// Maximum number of symbols the batch endpoint accepts per call.
pub const MAX_BATCH_SYMBOLS: usize = 100;

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Bytes of an error response body kept in a provider error for diagnostics.
pub const ERROR_BODY_PREVIEW_BYTES: usize = 512;

/// Environment variable holding the IEX Cloud secret token.
pub const SECRET_ENV_VAR: &str = "IEX_CLOUD_SECRET";

/// Environment variable overriding [`IEX_BASE_URL`] (sandbox, proxies).
pub const BASE_URL_ENV_VAR: &str = "IEX_BASE_URL";

/// Join the base URL and an endpoint path with exactly one `/`.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
