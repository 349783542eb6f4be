//! Integration tests for the intraday download command

use clap::Parser;
use iex_intraday_downloader::cli::{Cli, CliError, Commands, IntradayCommand};
use iex_intraday_downloader::output::csv::CsvCandlesWriter;
use iex_intraday_downloader::shutdown::ShutdownCoordinator;

use crate::common::{client, ScriptedTransport, SharedBuffer, INTRADAY_JSON, TICKERS_CSV};

const HEADER: &str = "symbol,timestamp,high,low,open,close,average,volume,notional,number_of_trades";

fn intraday_command(extra: &[&str]) -> IntradayCommand {
    let mut args = vec!["iex-intraday-downloader", "intraday"];
    args.extend_from_slice(extra);
    match Cli::try_parse_from(args).unwrap().command {
        Commands::Intraday(command) => command,
        other => panic!("expected intraday command, got {other:?}"),
    }
}

/// Decoded `symbols=` parameter of a batch URL
fn batch_symbols(url: &str) -> Vec<String> {
    let query = url.split_once('?').unwrap().1;
    let value = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("symbols="))
        .unwrap();
    urlencoding::decode(value)
        .unwrap()
        .split(',')
        .map(str::to_string)
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_days_are_fetched_most_recent_first() {
    let transport = ScriptedTransport::new();
    transport.push(200, INTRADAY_JSON); // 2024-03-15 AAPL
    transport.push(200, "[]"); // 2024-03-15 MSFT
    transport.push(200, "[]"); // 2024-03-14 AAPL
    transport.push(200, INTRADAY_JSON); // 2024-03-14 MSFT

    let command = intraday_command(&[
        "--symbols", "AAPL,MSFT", "--days", "2", "--end-date", "2024-03-15", "--concurrency", "1",
    ]);
    let output = SharedBuffer::default();

    command
        .download(
            &client(transport.clone()),
            CsvCandlesWriter::new(output.clone()),
            ShutdownCoordinator::shared(),
        )
        .await
        .unwrap();

    let csv = output.contents();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "{csv}");
    assert_eq!(lines[0], HEADER);
    assert!(lines[1].starts_with("AAPL,2024-03-15T09:30:00Z,"));
    assert!(lines[2].starts_with("MSFT,2024-03-14T09:30:00Z,"));

    let urls = transport.urls();
    assert_eq!(urls.len(), 4);
    assert!(urls[0].contains("/stock/AAPL/") && urls[0].contains("exactDate=20240315"));
    assert!(urls[1].contains("/stock/MSFT/") && urls[1].contains("exactDate=20240315"));
    assert!(urls[2].contains("exactDate=20240314"));
    assert!(urls[3].contains("exactDate=20240314"));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fetch_keeps_symbol_order() {
    let transport = ScriptedTransport::new();
    let command = intraday_command(&[
        "--symbols", "AAPL,MSFT,IBM", "--days", "1", "--end-date", "2024-03-15", "--concurrency", "3",
    ]);

    let output = SharedBuffer::default();
    command
        .download(
            &client(transport.clone()),
            CsvCandlesWriter::new(output.clone()),
            ShutdownCoordinator::shared(),
        )
        .await
        .unwrap();

    assert_eq!(transport.request_count(), 3);
    // Every bucket was empty, so not even a header is written
    assert_eq!(output.contents(), "");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_before_next_day() {
    let transport = ScriptedTransport::new();
    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    let command = intraday_command(&["--symbols", "AAPL", "--days", "5"]);
    command
        .download(
            &client(transport.clone()),
            CsvCandlesWriter::new(SharedBuffer::default()),
            shutdown,
        )
        .await
        .unwrap();

    assert_eq!(transport.request_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_mode_splits_into_chunks_of_one_hundred() {
    let transport = ScriptedTransport::new();
    transport.push(200, "{}");
    transport.push(200, "{}");

    let symbols = (0..150).map(|i| format!("SYM{i}")).collect::<Vec<_>>().join(",");
    let command = intraday_command(&[
        "--symbols", symbols.as_str(), "--days", "1", "--end-date", "2024-03-15", "--batch", "--concurrency", "1",
    ]);

    command
        .download(
            &client(transport.clone()),
            CsvCandlesWriter::new(SharedBuffer::default()),
            ShutdownCoordinator::shared(),
        )
        .await
        .unwrap();

    let urls = transport.urls();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.contains("/market/batch?")));
    let first = batch_symbols(&urls[0]);
    let second = batch_symbols(&urls[1]);
    assert_eq!(first.len(), 100);
    assert_eq!(second.len(), 50);
    assert_eq!(first[0], "SYM0");
    assert_eq!(second[49], "SYM149");
}

#[tokio::test(start_paused = true)]
async fn test_batch_output_skips_buckets_without_trades() {
    let transport = ScriptedTransport::new();
    transport.push(200, format!(r#"{{"AAPL":{INTRADAY_JSON}}}"#));

    let command = intraday_command(&[
        "--symbols", "AAPL", "--days", "1", "--end-date", "2024-03-15", "--batch",
    ]);
    let output = SharedBuffer::default();
    command
        .download(
            &client(transport),
            CsvCandlesWriter::new(output.clone()),
            ShutdownCoordinator::shared(),
        )
        .await
        .unwrap();

    let csv = output.contents();
    assert_eq!(csv.lines().count(), 2, "{csv}");
    assert!(csv.contains("AAPL,2024-03-15T09:30:00Z,1.5,"));
}

#[tokio::test(start_paused = true)]
async fn test_provider_error_aborts_download() {
    let transport = ScriptedTransport::new();
    transport.push(403, "invalid token");

    let command = intraday_command(&["--symbols", "AAPL", "--days", "3", "--end-date", "2024-03-15"]);
    let err = command
        .download(
            &client(transport.clone()),
            CsvCandlesWriter::new(SharedBuffer::default()),
            ShutdownCoordinator::shared(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::FetcherError(ref e) if e.is_provider_status(403)));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tickers_command_prints_symbols() {
    let transport = ScriptedTransport::new();
    transport.push(200, TICKERS_CSV);

    let cli = Cli::try_parse_from(["iex-intraday-downloader", "tickers", "--format", "json"]).unwrap();
    let Commands::Tickers(args) = &cli.command else {
        panic!("expected tickers command");
    };

    let output = SharedBuffer::default();
    args.execute(&client(transport), output.clone()).await.unwrap();
    assert_eq!(output.contents(), "[\"AAA\",\"CCC\"]\n");
}
