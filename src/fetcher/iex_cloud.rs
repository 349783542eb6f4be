//! IEX Cloud client
//!
//! Thin typed facade: each operation builds a fresh request descriptor and
//! runs it through the shared [`Executor`].

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::downloader::Executor;
use crate::fetcher::iex_requests::{
    BatchIntradayRequest, IntradayArgs, IntradayRequest, TickerListRequest,
};
use crate::fetcher::{FetcherResult, IexRequest};
use crate::{Candle, Symbol};

/// IEX Cloud client
///
/// Holds the secret token and an executor. Clones share the executor and
/// therefore the rate limiter; the client itself keeps no mutable state.
#[derive(Clone)]
pub struct IexClient {
    token: String,
    executor: Executor,
    deadline: Option<Duration>,
}

impl IexClient {
    /// Create a client with the default executor (reqwest, 10ms spacing)
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_executor(token, Executor::default())
    }

    /// Create a client over a caller-supplied executor
    pub fn with_executor(token: impl Into<String>, executor: Executor) -> Self {
        Self {
            token: token.into(),
            executor,
            deadline: None,
        }
    }

    /// Abandon any call that has not completed within `deadline`
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Executor shared by this client
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// List tradable IEX symbols
    pub async fn tickers(&self) -> FetcherResult<Vec<Symbol>> {
        let symbols = self.run(&TickerListRequest::new(self.token.as_str())).await?;
        info!(count = symbols.len(), "Fetched tradable symbols");
        Ok(symbols)
    }

    /// Candles for one symbol on the UTC day of `date`
    ///
    /// `resolution` is rounded up to whole minutes (at least one). Buckets
    /// without trades are omitted.
    pub async fn intraday(
        &self,
        symbol: &Symbol,
        resolution: Duration,
        date: DateTime<Utc>,
    ) -> FetcherResult<Vec<Candle>> {
        let args = IntradayArgs::new(self.token.as_str(), resolution, date);
        let request = IntradayRequest::new(symbol.clone(), args);
        let candles = self.run(&request).await?;
        info!(
            %symbol,
            date = %request.args().date(),
            count = candles.len(),
            "Fetched intraday candles"
        );
        Ok(candles)
    }

    /// Candles for up to 100 symbols on the UTC day of `date`, keyed by symbol
    ///
    /// Unlike [`intraday`](Self::intraday), buckets without trades are kept;
    /// use [`Candle::is_trading`] to drop them.
    ///
    /// # Panics
    /// Panics when more than 100 symbols are given.
    pub async fn intraday_batch(
        &self,
        symbols: &[Symbol],
        resolution: Duration,
        date: DateTime<Utc>,
    ) -> FetcherResult<HashMap<Symbol, Vec<Candle>>> {
        let args = IntradayArgs::new(self.token.as_str(), resolution, date);
        let request = BatchIntradayRequest::new(symbols.to_vec(), args);
        let candles = self.run(&request).await?;
        info!(
            requested = symbols.len(),
            returned = candles.len(),
            "Fetched batch intraday candles"
        );
        Ok(candles)
    }

    async fn run<R: IexRequest>(&self, request: &R) -> FetcherResult<R::Output> {
        match self.deadline {
            Some(deadline) => self.executor.execute_with_deadline(request, deadline).await,
            None => self.executor.execute(request).await,
        }
    }
}

impl std::fmt::Debug for IexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IexClient")
            .field("token", &"<redacted>")
            .field("executor", &self.executor)
            .field("deadline", &self.deadline)
            .finish()
    }
}
