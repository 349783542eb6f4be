//! IEX Cloud request descriptors, decoders and client

use std::time::Duration;

pub mod iex_cloud;
pub mod iex_http;
pub mod iex_parser;
pub mod iex_requests;
pub mod query;

use iex_http::HttpRequest;

/// Stage of response decoding that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStage {
    /// CSV row could not be read (short or malformed row)
    Csv,
    /// Payload is not valid JSON
    Json,
    /// Valid JSON with an unexpected structure or field value
    Shape,
}

impl DecodeStage {
    /// Stable lowercase label (used in logs and metrics)
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeStage::Csv => "csv",
            DecodeStage::Json => "json",
            DecodeStage::Shape => "shape",
        }
    }
}

impl std::fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DecodeStage::Csv => "CSV parse",
            DecodeStage::Json => "JSON parse",
            DecodeStage::Shape => "shape mismatch",
        };
        write!(f, "{s}")
    }
}

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Connection, timeout or body-read failure; the request never produced a usable response
    #[error("network error: {0}")]
    Transport(String),

    /// IEX Cloud answered with a status outside 200-299
    #[error("{op}: IEX Cloud returned HTTP {status} {reason}")]
    Provider {
        /// Operation label of the failed request
        op: String,
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        reason: String,
        /// Start of the response body, for diagnostics only
        body: String,
    },

    /// Response body could not be decoded
    #[error("{stage} error: {message}")]
    Decode {
        /// Which decode stage failed
        stage: DecodeStage,
        /// Decoder detail
        message: String,
    },

    /// The caller's deadline fired before the request completed
    #[error("{op}: deadline of {deadline:?} exceeded")]
    DeadlineExceeded {
        /// Operation label of the abandoned request
        op: String,
        /// Deadline that fired
        deadline: Duration,
    },
}

impl FetcherError {
    /// Build a decode error for the given stage
    pub fn decode(stage: DecodeStage, message: impl Into<String>) -> Self {
        FetcherError::Decode {
            stage,
            message: message.into(),
        }
    }

    /// HTTP status of a provider error
    pub fn status(&self) -> Option<u16> {
        match self {
            FetcherError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is a provider error carrying `status`
    pub fn is_provider_status(&self, status: u16) -> bool {
        self.status() == Some(status)
    }

    /// Decode stage of a decode error
    pub fn decode_stage(&self) -> Option<DecodeStage> {
        match self {
            FetcherError::Decode { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// A single IEX Cloud call: how to build it and how to read its answer
///
/// Descriptors are built fresh for each call, executed once by the
/// [`Executor`](crate::downloader::Executor) and dropped. The executor never
/// inspects the concrete type; it only sees this capability.
pub trait IexRequest: Send + Sync {
    /// Decoded result type
    type Output: Send;

    /// Endpoint name used for logs and metrics (never contains the token)
    const ENDPOINT: &'static str;

    /// Human-readable operation label carried by provider errors
    fn op(&self) -> String;

    /// Build the wire request against `base_url`
    fn build_request(&self, base_url: &str) -> HttpRequest;

    /// Decode a successful (2xx) response body
    fn decode(&self, body: &[u8]) -> FetcherResult<Self::Output>;
}
