//! Unit tests for IexParser

use chrono::{NaiveDate, TimeZone, Utc};
use iex_intraday_downloader::fetcher::iex_parser::IexParser;
use iex_intraday_downloader::{DecodeStage, Symbol};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::common::{INTRADAY_JSON, TICKERS_CSV};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[test]
fn test_tickers_keeps_only_tradable_in_order() {
    let symbols = IexParser::parse_tickers(TICKERS_CSV.as_bytes()).unwrap();
    assert_eq!(symbols, vec![Symbol::from("AAA"), Symbol::from("CCC")]);
}

#[test]
fn test_tickers_short_row_discards_everything() {
    let csv = "symbol,date,isEnabled\nAAA,2024-03-15,true\nBBB,2024-03-15\n";
    let err = IexParser::parse_tickers(csv.as_bytes()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Csv));
}

#[test]
fn test_tickers_without_trailing_newline() {
    let csv = "symbol,date,isEnabled\nAAA,2024-03-15,true";
    let symbols = IexParser::parse_tickers(csv.as_bytes()).unwrap();
    assert_eq!(symbols, vec![Symbol::from("AAA")]);
}

#[test]
fn test_intraday_drops_zero_trade_buckets() {
    let candles = IexParser::parse_intraday(INTRADAY_JSON.as_bytes(), day()).unwrap();

    assert_eq!(candles.len(), 1);
    let candle = &candles[0];
    assert_eq!(candle.timestamp, Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap());
    assert_eq!(candle.high, Decimal::from_str("1.5").unwrap());
    assert_eq!(candle.low, Decimal::from_str("1.0").unwrap());
    assert_eq!(candle.notional, Decimal::from(120));
    assert_eq!(candle.volume, 100);
    assert_eq!(candle.number_of_trades, 3);
}

#[test]
fn test_intraday_preserves_order() {
    let body = r#"[
        {"minute":"10:05","high":2,"low":1,"open":1,"close":2,"average":1.5,"notional":3,"volume":2,"numberOfTrades":1},
        {"minute":"10:00","high":2,"low":1,"open":1,"close":2,"average":1.5,"notional":3,"volume":2,"numberOfTrades":1}
    ]"#;
    let candles = IexParser::parse_intraday(body.as_bytes(), day()).unwrap();
    let minutes: Vec<String> = candles
        .iter()
        .map(|c| c.timestamp.format("%H:%M").to_string())
        .collect();
    assert_eq!(minutes, vec!["10:05", "10:00"]);
}

#[test]
fn test_intraday_empty_array() {
    assert!(IexParser::parse_intraday(b"[]", day()).unwrap().is_empty());
}

#[test]
fn test_intraday_invalid_json() {
    let err = IexParser::parse_intraday(b"[{\"minute\":", day()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Json));
}

#[test]
fn test_intraday_object_is_shape_error() {
    let err = IexParser::parse_intraday(br#"{"error":"oops"}"#, day()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Shape));
}

#[test]
fn test_intraday_bad_minute_is_shape_error() {
    let body = br#"[{"minute":"9h30","high":1,"low":1,"open":1,"close":1,"average":1,"notional":1,"volume":1,"numberOfTrades":1}]"#;
    let err = IexParser::parse_intraday(body, day()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Shape));
    assert!(err.to_string().contains("9h30"));
}

#[test]
fn test_intraday_wrong_field_type_is_shape_error() {
    let body = br#"[{"minute":"09:30","volume":"lots","numberOfTrades":1}]"#;
    let err = IexParser::parse_intraday(body, day()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Shape));
}

#[test]
fn test_batch_keeps_zero_trade_buckets() {
    let body = format!(r#"{{"AAPL":{INTRADAY_JSON},"MSFT":[]}}"#);
    let candles = IexParser::parse_batch(body.as_bytes(), day()).unwrap();

    assert_eq!(candles.len(), 2);
    let aapl = &candles[&Symbol::from("AAPL")];
    assert_eq!(aapl.len(), 2);
    assert!(aapl[0].is_trading());
    assert!(!aapl[1].is_trading());
    assert_eq!(aapl[1].timestamp, Utc.with_ymd_and_hms(2024, 3, 15, 9, 31, 0).unwrap());
    assert!(candles[&Symbol::from("MSFT")].is_empty());
}

#[test]
fn test_batch_accepts_typed_sections() {
    let body = format!(r#"{{"AAPL":{{"intraday-prices":{INTRADAY_JSON}}}}}"#);
    let candles = IexParser::parse_batch(body.as_bytes(), day()).unwrap();
    assert_eq!(candles[&Symbol::from("AAPL")].len(), 2);
}

#[test]
fn test_batch_array_is_shape_error() {
    let err = IexParser::parse_batch(b"[]", day()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Shape));
}

#[test]
fn test_batch_missing_section_is_shape_error() {
    let err = IexParser::parse_batch(br#"{"AAPL":{"quote":{}}}"#, day()).unwrap_err();
    assert_eq!(err.decode_stage(), Some(DecodeStage::Shape));
}
