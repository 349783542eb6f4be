//! Command-line surface: symbol listing and multi-day intraday downloads

use crate::downloader::config::{
    BASE_URL_ENV_VAR, IEX_BASE_URL, MAX_BATCH_SYMBOLS, SECRET_ENV_VAR,
};
use crate::downloader::{Executor, RateLimiter};
use crate::fetcher::iex_http::ReqwestTransport;
use crate::output::csv::CsvCandlesWriter;
use crate::output::{symbols, CandlesWriter, OutputWriter};
use crate::shutdown::SharedShutdown;
use crate::{Candle, IexClient, Symbol};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream;
use futures_util::StreamExt;
use std::io::{self, BufWriter, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::resolution::{parse_resolution_arg, trading_dates};
use super::CliError;

/// Maximum allowed concurrency; the rate limiter serialises requests anyway
const MAX_CONCURRENCY: usize = 32;

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// IEX Intraday Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "iex-intraday-downloader")]
#[command(about = "Download tradable symbols and intraday candles from IEX Cloud", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// IEX Cloud secret token
    #[arg(long, global = true, env = SECRET_ENV_VAR, hide_env_values = true)]
    pub secret: Option<String>,

    /// API root, e.g. the sandbox
    #[arg(long, global = true, env = BASE_URL_ENV_VAR, default_value = IEX_BASE_URL)]
    pub base_url: String,

    /// Minimum spacing between requests in milliseconds
    #[arg(long, global = true, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_interval_ms: u64,

    /// Abandon any single request after this many seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub deadline_secs: Option<u64>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tradable IEX symbol list
    Tickers(TickersArgs),

    /// Download intraday candles as CSV
    Intraday(IntradayCommand),
}

/// Symbol list output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SymbolFormat {
    /// One symbol per line
    Lines,
    /// JSON array of strings
    Json,
}

/// Arguments for `tickers`
#[derive(clap::Args, Debug)]
pub struct TickersArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = SymbolFormat::Lines)]
    pub format: SymbolFormat,
}

/// Arguments for `intraday`
#[derive(clap::Args, Debug)]
pub struct IntradayCommand {
    /// Comma-delimited symbols (e.g. AAPL,MSFT)
    #[arg(long, value_delimiter = ',', required = true)]
    pub symbols: Vec<String>,

    /// Candle width, e.g. 1m, 5m, 1.5h, 1h30m
    #[arg(long, default_value = "1m", value_parser = parse_resolution_arg)]
    pub res: Duration,

    /// Number of calendar days to retrieve, ending at --end-date
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,

    /// Last day to retrieve (YYYY-MM-DD, default: today UTC)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Use the batch endpoint (up to 100 symbols per request)
    #[arg(long, default_value_t = false)]
    pub batch: bool,

    /// Number of concurrent requests (default: 4, max: 32)
    #[arg(long, default_value = "4", value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Write CSV to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Build the client described by the global flags
    pub fn client(&self) -> Result<IexClient, CliError> {
        let secret = self
            .secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CliError::ConfigurationError(format!(
                    "please provide an IEX Cloud secret: either --secret on the \
                     command line or set the environment variable {SECRET_ENV_VAR}"
                ))
            })?;

        let executor = Executor::new(
            Arc::new(ReqwestTransport::try_new()?),
            Arc::new(RateLimiter::new(Duration::from_millis(self.rate_interval_ms))),
        )
        .with_base_url(self.base_url.clone());

        let client = IexClient::with_executor(secret, executor);
        Ok(match self.deadline_secs {
            Some(secs) => client.with_deadline(Duration::from_secs(secs)),
            None => client,
        })
    }

    /// Run the selected command
    pub async fn run(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        if let Some(addr) = self.metrics_addr {
            crate::metrics::init_metrics(addr).await?;
        }

        let client = self.client()?;
        match &self.command {
            Commands::Tickers(args) => args.execute(&client, io::stdout()).await,
            Commands::Intraday(args) => args.execute(&client, shutdown).await,
        }
    }
}

impl TickersArgs {
    /// Fetch the tradable symbols and print them to `out`
    pub async fn execute<W: Write>(&self, client: &IexClient, out: W) -> Result<(), CliError> {
        let tickers = client.tickers().await?;
        match self.format {
            SymbolFormat::Lines => symbols::write_lines(out, &tickers)?,
            SymbolFormat::Json => symbols::write_json(out, &tickers)?,
        }
        Ok(())
    }
}

impl IntradayCommand {
    /// Requested symbols, trimmed, blanks dropped, first occurrence kept
    pub fn symbol_list(&self) -> Result<Vec<Symbol>, CliError> {
        let mut seen = std::collections::HashSet::new();
        let symbols: Vec<Symbol> = self
            .symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.to_string()))
            .map(Symbol::from)
            .collect();

        if symbols.is_empty() {
            return Err(CliError::InvalidArgument(
                "at least one symbol is required".to_string(),
            ));
        }
        Ok(symbols)
    }

    /// Download every requested day and write CSV to the configured sink
    pub async fn execute(&self, client: &IexClient, shutdown: SharedShutdown) -> Result<(), CliError> {
        match &self.output {
            Some(path) => {
                let writer = CsvCandlesWriter::create(path)?;
                self.download(client, writer, shutdown).await
            }
            None => {
                let writer = CsvCandlesWriter::new(BufWriter::new(io::stdout()));
                self.download(client, writer, shutdown).await
            }
        }
    }

    /// Download every requested day into `writer`, most recent day first
    ///
    /// Stops between days once shutdown is requested; rows already written
    /// are flushed either way.
    pub async fn download<W: Write>(
        &self,
        client: &IexClient,
        mut writer: CsvCandlesWriter<W>,
        shutdown: SharedShutdown,
    ) -> Result<(), CliError> {
        let symbols = self.symbol_list()?;
        let end = self.end_date.unwrap_or_else(|| Utc::now().date_naive());
        let dates = trading_dates(end, self.days);

        info!(
            "Downloading {} days of {:?} candles for {} symbols ending {}",
            dates.len(),
            self.res,
            symbols.len(),
            end
        );

        for date in dates {
            if shutdown.is_shutdown_requested() {
                warn!("Shutdown requested, stopping before {}", date);
                break;
            }

            let per_symbol = if self.batch {
                self.fetch_batched(client, &symbols, date).await?
            } else {
                self.fetch_each(client, &symbols, date).await?
            };

            let mut count = 0usize;
            for (symbol, candles) in &per_symbol {
                for candle in candles {
                    if let Err(e) = candle.validate() {
                        warn!(%symbol, timestamp = %candle.timestamp, "Suspicious candle: {}", e);
                    }
                }
                writer.write_candles(symbol, candles)?;
                count += candles.len();
            }
            writer.flush()?;

            info!("{}: {} candles written", date, count);
        }

        info!("Download finished: {} candles written", writer.candles_written());
        writer.close()?;
        Ok(())
    }

    /// One request per symbol, up to `concurrency` in flight; output keeps
    /// the requested symbol order
    async fn fetch_each(
        &self,
        client: &IexClient,
        symbols: &[Symbol],
        date: NaiveDate,
    ) -> Result<Vec<(Symbol, Vec<Candle>)>, CliError> {
        let date_time = date.and_time(NaiveTime::MIN).and_utc();

        let mut results: Vec<_> = stream::iter(symbols.iter().enumerate())
            .map(|(index, symbol)| async move {
                (index, symbol, client.intraday(symbol, self.res, date_time).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by_key(|(index, _, _)| *index);

        results
            .into_iter()
            .map(|(_, symbol, result)| -> Result<_, CliError> { Ok((symbol.clone(), result?)) })
            .collect()
    }

    /// Batch requests of at most 100 symbols; buckets without trades are
    /// dropped so the output matches the per-symbol path
    async fn fetch_batched(
        &self,
        client: &IexClient,
        symbols: &[Symbol],
        date: NaiveDate,
    ) -> Result<Vec<(Symbol, Vec<Candle>)>, CliError> {
        let date_time = date.and_time(NaiveTime::MIN).and_utc();

        let results: Vec<_> = stream::iter(symbols.chunks(MAX_BATCH_SYMBOLS))
            .map(|chunk| client.intraday_batch(chunk, self.res, date_time))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut by_symbol = std::collections::HashMap::new();
        for result in results {
            by_symbol.extend(result?);
        }

        Ok(symbols
            .iter()
            .map(|symbol| {
                let candles = by_symbol
                    .remove(symbol)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(Candle::is_trading)
                    .collect();
                (symbol.clone(), candles)
            })
            .collect())
    }
}
