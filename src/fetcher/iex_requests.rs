//! IEX Cloud request descriptors
//!
//! One type per endpoint. Each knows its URL rules, its operation label and
//! which decoder reads its response; the executor treats them uniformly
//! through [`IexRequest`].

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::time::Duration;

use crate::downloader::config::{join_url, MAX_BATCH_SYMBOLS};
use crate::fetcher::iex_http::HttpRequest;
use crate::fetcher::iex_parser::IexParser;
use crate::fetcher::query::QueryArgs;
use crate::fetcher::{FetcherResult, IexRequest};
use crate::{Candle, Symbol};

/// Endpoint type requested from the batch endpoint
pub const INTRADAY_PRICES_TYPE: &str = "intraday-prices";

const NANOS_PER_MINUTE: u128 = 60_000_000_000;

/// Convert a resolution to whole minutes: `ceil(resolution / 1m)`, at least 1
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use iex_intraday_downloader::fetcher::iex_requests::resolution_minutes;
///
/// assert_eq!(resolution_minutes(Duration::from_secs(90 * 60)), 90);
/// assert_eq!(resolution_minutes(Duration::from_secs(30)), 1);
/// ```
pub fn resolution_minutes(resolution: Duration) -> u32 {
    let minutes = resolution.as_nanos().div_ceil(NANOS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Symbol list request: `GET /ref-data/iex/symbols/?format=csv&token=...`
#[derive(Debug, Clone)]
pub struct TickerListRequest {
    token: String,
}

impl TickerListRequest {
    /// Create a symbol list request
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl IexRequest for TickerListRequest {
    type Output = Vec<Symbol>;

    const ENDPOINT: &'static str = "ref-data/iex/symbols";

    fn op(&self) -> String {
        "list tradable IEX symbols".to_string()
    }

    fn build_request(&self, base_url: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "{}?format=csv&token={}",
            join_url(base_url, "/ref-data/iex/symbols/"),
            urlencoding::encode(&self.token)
        ))
    }

    fn decode(&self, body: &[u8]) -> FetcherResult<Self::Output> {
        IexParser::parse_tickers(body)
    }
}

/// Arguments shared by the single-symbol and batch intraday requests
#[derive(Debug, Clone)]
pub struct IntradayArgs {
    token: String,
    date: NaiveDate,
    resolution_minutes: u32,
    query: QueryArgs,
}

impl IntradayArgs {
    /// Build intraday arguments
    ///
    /// `date` is truncated to its UTC calendar day; that day is both sent as
    /// `exactDate` and used to date-stamp the decoded candles.
    pub fn new(token: impl Into<String>, resolution: Duration, date: DateTime<Utc>) -> Self {
        let day = date.date_naive();
        let minutes = resolution_minutes(resolution);
        let query = QueryArgs::new()
            .with("chartIEXOnly", true)
            .with("includeToday", true)
            .with("chartInterval", minutes)
            .with("exactDate", day);

        Self {
            token: token.into(),
            date: day,
            resolution_minutes: minutes,
            query,
        }
    }

    /// Requested trading day
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Candle width in minutes
    pub fn resolution_minutes(&self) -> u32 {
        self.resolution_minutes
    }

    /// Endpoint query arguments (token excluded)
    pub fn query(&self) -> &QueryArgs {
        &self.query
    }

    fn token_param(&self) -> String {
        format!("token={}", urlencoding::encode(&self.token))
    }
}

/// Single-symbol candles: `GET /stock/{symbol}/intraday-prices`
#[derive(Debug, Clone)]
pub struct IntradayRequest {
    symbol: Symbol,
    args: IntradayArgs,
}

impl IntradayRequest {
    /// Create an intraday request for one symbol
    pub fn new(symbol: Symbol, args: IntradayArgs) -> Self {
        Self { symbol, args }
    }

    /// Requested symbol
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Shared intraday arguments
    pub fn args(&self) -> &IntradayArgs {
        &self.args
    }
}

impl IexRequest for IntradayRequest {
    type Output = Vec<Candle>;

    const ENDPOINT: &'static str = "stock/intraday-prices";

    fn op(&self) -> String {
        format!("hydrate intraday data for IEX:{}", self.symbol)
    }

    fn build_request(&self, base_url: &str) -> HttpRequest {
        let path = format!(
            "/stock/{}/intraday-prices",
            urlencoding::encode(self.symbol.as_str())
        );
        HttpRequest::get(format!(
            "{}?{}&{}",
            join_url(base_url, &path),
            self.args.query,
            self.args.token_param()
        ))
    }

    fn decode(&self, body: &[u8]) -> FetcherResult<Self::Output> {
        IexParser::parse_intraday(body, self.args.date)
    }
}

/// Multi-symbol candles: `GET /market/batch?symbols=...&types=intraday-prices`
#[derive(Debug, Clone)]
pub struct BatchIntradayRequest {
    symbols: Vec<Symbol>,
    types: Vec<&'static str>,
    args: IntradayArgs,
}

impl BatchIntradayRequest {
    /// Create a batch request
    ///
    /// # Panics
    /// Panics when more than [`MAX_BATCH_SYMBOLS`] symbols are given. The
    /// provider rejects such batches, so this is a caller bug; split the
    /// symbol list before calling.
    pub fn new(symbols: Vec<Symbol>, args: IntradayArgs) -> Self {
        assert!(
            symbols.len() <= MAX_BATCH_SYMBOLS,
            "batch too large: {} symbols requested, at most {} allowed",
            symbols.len(),
            MAX_BATCH_SYMBOLS
        );
        Self {
            symbols,
            types: vec![INTRADAY_PRICES_TYPE],
            args,
        }
    }

    /// Number of symbols in the batch
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Requested symbols, in caller order
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Query sent to the batch endpoint (token excluded)
    pub fn query(&self) -> QueryArgs {
        let symbols = self
            .symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.args
            .query
            .clone()
            .with("symbols", symbols)
            .with("types", self.types.join(","))
    }
}

impl IexRequest for BatchIntradayRequest {
    type Output = HashMap<Symbol, Vec<Candle>>;

    const ENDPOINT: &'static str = "market/batch";

    fn op(&self) -> String {
        format!("batch request intra-day quotes for {} symbols", self.len())
    }

    fn build_request(&self, base_url: &str) -> HttpRequest {
        HttpRequest::get(format!(
            "{}?{}&{}",
            join_url(base_url, "/market/batch"),
            self.query(),
            self.args.token_param()
        ))
    }

    fn decode(&self, body: &[u8]) -> FetcherResult<Self::Output> {
        IexParser::parse_batch(body, self.args.date)
    }
}
