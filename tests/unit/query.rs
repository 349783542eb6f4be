//! Unit tests for query argument serialisation

use chrono::NaiveDate;
use iex_intraday_downloader::fetcher::query::{QueryArgs, QueryValue};
use std::collections::BTreeMap;

/// Parse `k=v&k=v` back into decoded pairs
fn parse_query(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap();
            (key.to_string(), urlencoding::decode(value).unwrap().into_owned())
        })
        .collect()
}

#[test]
fn test_query_round_trips_through_parser() {
    let args = QueryArgs::new().with("a", 1i64).with("b", true);
    let parsed = parse_query(&args.to_string());

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed["a"], "1");
    assert_eq!(parsed["b"], "true");
}

#[test]
fn test_query_escaped_values_decode_back() {
    let args = QueryArgs::new()
        .with("symbols", "BRK.A,BF/B")
        .with("note", "a&b=c d");
    let rendered = args.to_string();

    assert!(!rendered.contains(' '));
    let parsed = parse_query(&rendered);
    assert_eq!(parsed["symbols"], "BRK.A,BF/B");
    assert_eq!(parsed["note"], "a&b=c d");
}

#[test]
fn test_query_is_deterministic() {
    let a: QueryArgs = [("z", "1"), ("m", "2"), ("a", "3")].into_iter().collect();
    let b: QueryArgs = [("a", "3"), ("z", "1"), ("m", "2")].into_iter().collect();
    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(a.to_string(), "a=3&m=2&z=1");
}

#[test]
fn test_query_value_rendering() {
    assert_eq!(QueryValue::from(false).to_string(), "false");
    assert_eq!(QueryValue::from(-7i64).to_string(), "-7");
    let date = NaiveDate::from_ymd_opt(2023, 11, 2).unwrap();
    assert_eq!(QueryValue::from(date).to_string(), "20231102");
}
