//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use iex_intraday_downloader::downloader::{Executor, RateLimiter};
use iex_intraday_downloader::fetcher::iex_http::{HttpRequest, HttpResponse, HttpTransport};
use iex_intraday_downloader::fetcher::{FetcherError, FetcherResult};
use iex_intraday_downloader::IexClient;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// In-memory transport replaying scripted responses and recording requests
///
/// Unscripted requests get `200 []`.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<FetcherResult<HttpResponse>>>,
    sent: Mutex<Vec<(String, Instant)>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    pub fn push(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body.into())));
    }

    pub fn push_transport_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(FetcherError::Transport(message.to_string())));
    }

    pub fn urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn request_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> FetcherResult<HttpResponse> {
        self.sent.lock().unwrap().push((request.url, Instant::now()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(HttpResponse::new(200, "[]")))
    }
}

pub const TEST_BASE_URL: &str = "http://iex.test/stable";
pub const TEST_TOKEN: &str = "sk_test_secret";

pub fn executor(transport: Arc<ScriptedTransport>, period: Duration) -> Executor {
    Executor::new(transport, Arc::new(RateLimiter::new(period))).with_base_url(TEST_BASE_URL)
}

pub fn client(transport: Arc<ScriptedTransport>) -> IexClient {
    IexClient::with_executor(TEST_TOKEN, executor(transport, Duration::from_millis(10)))
}

/// Cloneable in-memory sink for CSV and log output
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub const TICKERS_CSV: &str = "symbol,date,isEnabled\nAAA,2024-03-15,true\nBBB,2024-03-15,false\nCCC,2024-03-15,true\n";

pub const INTRADAY_JSON: &str = r#"[
    {"minute":"09:30","high":1.5,"low":1.0,"open":1.1,"close":1.4,"average":1.2,"notional":120,"volume":100,"numberOfTrades":3},
    {"minute":"09:31","high":null,"low":null,"open":null,"close":null,"average":null,"notional":0,"volume":0,"numberOfTrades":0}
]"#;
