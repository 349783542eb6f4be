//! # IEX Intraday Downloader Library
//!
//! A rate-limited client for IEX Cloud reference data and intraday price
//! candles. Designed for research pipelines that need tradable symbol lists
//! and minute-level OHLC bars for whole trading days.
//!
//! ## Features
//!
//! - **Symbol discovery**: CSV symbol list filtered to tradable tickers
//! - **Intraday candles**: single-symbol and batch (up to 100 symbols) fetches
//! - **Rate Limiting**: one outbound request per interval, shared by every caller
//! - **Typed errors**: transport, provider (non-2xx) and decode failures are distinct
//! - **Pluggable transport**: the executor talks to an [`fetcher::iex_http::HttpTransport`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use iex_intraday_downloader::{IexClient, Symbol};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IexClient::new("pk_my_token");
//!
//! // Tradable symbols
//! let symbols = client.tickers().await?;
//! println!("{} tradable symbols", symbols.len());
//!
//! // 5-minute candles for today
//! let candles = client
//!     .intraday(&Symbol::from("AAPL"), Duration::from_secs(300), Utc::now())
//!     .await?;
//! for candle in &candles {
//!     println!("{} close={}", candle.timestamp, candle.close);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`downloader`] - Request execution engine: rate limiter, executor, constants
//! - [`fetcher`] - Request descriptors, wire decoders, HTTP transport and the client
//! - [`output`] - CSV tabulation of candles and symbols
//! - [`cli`] - Command-line surface (resolution parsing, date selection)
//! - [`metrics`] - Request and rate-limit metrics
//!
//! Every request kind implements [`fetcher::IexRequest`]; the
//! [`downloader::Executor`] gates it on the [`downloader::RateLimiter`], sends it,
//! classifies the status and hands the body back to the request for decoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// Request execution engine
pub mod downloader;

/// IEX Cloud requests, decoders and client
pub mod fetcher;

/// Production metrics
pub mod metrics;

/// Data output writers
pub mod output;

/// Graceful shutdown coordination
pub mod shutdown;

// Re-export commonly used types
pub use downloader::{Executor, RateLimiter};
pub use fetcher::iex_cloud::IexClient;
pub use fetcher::{DecodeStage, FetcherError, FetcherResult};

/// Ticker symbol identifying a tradable security.
///
/// Opaque: equality and hashing use the raw string exactly as the provider
/// returned it, so it can key batch results directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from any string value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One OHLC price bar for a fixed intraday bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    /// Bucket start: the requested trading day plus the bucket's time of day (UTC)
    pub timestamp: DateTime<Utc>,
    /// High price
    pub high: Decimal,
    /// Low price
    pub low: Decimal,
    /// Open price
    pub open: Decimal,
    /// Close price
    pub close: Decimal,
    /// Volume-weighted average price
    pub average: Decimal,
    /// Traded value (price x volume)
    pub notional: Decimal,
    /// Shares traded
    pub volume: u64,
    /// Number of trades in the bucket
    pub number_of_trades: u64,
}

impl Candle {
    /// Whether any trade happened in this bucket.
    ///
    /// Single-symbol fetches only ever return trading candles; batch fetches
    /// return every bucket and leave this check to the caller.
    pub fn is_trading(&self) -> bool {
        self.number_of_trades != 0
    }

    /// Validate candle data integrity
    pub fn validate(&self) -> Result<(), String> {
        if !self.is_trading() {
            return Ok(());
        }

        if self.high < self.open || self.high < self.close {
            return Err(format!(
                "High ({}) must be >= open ({}) and close ({})",
                self.high, self.open, self.close
            ));
        }

        if self.low > self.open || self.low > self.close {
            return Err(format!(
                "Low ({}) must be <= open ({}) and close ({})",
                self.low, self.open, self.close
            ));
        }

        if self.notional < Decimal::ZERO {
            return Err(format!("Notional must be non-negative, got {}", self.notional));
        }

        Ok(())
    }
}
