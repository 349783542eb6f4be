//! Request execution and rate limiting
//!
//! # Overview
//!
//! Every outbound IEX Cloud call goes through an [`Executor`]:
//!
//! 1. **Rate Limiting**: wait for a permit from the shared [`RateLimiter`]
//! 2. **Build**: the request descriptor renders its URL against the base URL
//! 3. **Send**: the [`HttpTransport`](crate::fetcher::iex_http::HttpTransport) performs the GET
//! 4. **Classify**: non-2xx statuses become provider errors, bodies untouched
//! 5. **Decode**: 2xx bodies go back to the descriptor's decoder
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use iex_intraday_downloader::downloader::{Executor, RateLimiter};
//! use iex_intraday_downloader::fetcher::iex_http::ReqwestTransport;
//! use iex_intraday_downloader::fetcher::iex_requests::TickerListRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Executor::new(
//!     Arc::new(ReqwestTransport::try_new()?),
//!     Arc::new(RateLimiter::new(Duration::from_millis(10))),
//! );
//! let symbols = executor.execute(&TickerListRequest::new("pk_my_token")).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! - [`executor`] - Rate-limited request pipeline
//! - [`rate_limit`] - Minimum-interval rate limiter
//! - [`config`] - Provider constants and URL helpers

pub mod config;
pub mod executor;
pub mod rate_limit;

pub use executor::Executor;
pub use rate_limit::RateLimiter;
