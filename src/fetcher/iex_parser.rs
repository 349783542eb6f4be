//! IEX Cloud response parser
//!
//! Stateless decoders turning the provider's wire formats into typed values:
//! the CSV symbol list, the single-symbol candle array and the batch map.
//! A decoder either returns the complete result or an error; partial results
//! are never returned.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::fetcher::iex_requests::INTRADAY_PRICES_TYPE;
use crate::fetcher::{DecodeStage, FetcherError, FetcherResult};
use crate::{Candle, Symbol};

/// Column holding the ticker in the symbol list CSV
const SYMBOL_COLUMN: usize = 0;

/// Column holding the "is enabled / tradable" flag in the symbol list CSV
const TRADABLE_COLUMN: usize = 2;

/// Candle object as sent by IEX Cloud
///
/// Price fields are `null` for buckets without trades.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandle {
    minute: Option<String>,
    high: Option<Decimal>,
    low: Option<Decimal>,
    open: Option<Decimal>,
    close: Option<Decimal>,
    average: Option<Decimal>,
    notional: Option<Decimal>,
    volume: Option<u64>,
    number_of_trades: Option<u64>,
}

impl RawCandle {
    fn number_of_trades(&self) -> u64 {
        self.number_of_trades.unwrap_or(0)
    }

    /// Stamp the bucket's time of day onto `date` (midnight UTC)
    fn into_candle(self, date: NaiveDate) -> FetcherResult<Candle> {
        let minute = self.minute.as_deref().ok_or_else(|| {
            FetcherError::decode(DecodeStage::Shape, "candle is missing its minute field")
        })?;
        let time_of_day = NaiveTime::parse_from_str(minute, "%H:%M").map_err(|e| {
            FetcherError::decode(
                DecodeStage::Shape,
                format!("invalid candle minute '{minute}': {e}"),
            )
        })?;

        Ok(Candle {
            timestamp: Utc.from_utc_datetime(&date.and_time(time_of_day)),
            high: self.high.unwrap_or_default(),
            low: self.low.unwrap_or_default(),
            open: self.open.unwrap_or_default(),
            close: self.close.unwrap_or_default(),
            average: self.average.unwrap_or_default(),
            notional: self.notional.unwrap_or_default(),
            volume: self.volume.unwrap_or(0),
            number_of_trades: self.number_of_trades(),
        })
    }
}

/// Stateless parser for IEX Cloud responses
pub struct IexParser;

impl IexParser {
    /// Parse the symbol list CSV into tradable symbols
    ///
    /// The first row is a header and is skipped. Column 0 is the symbol and
    /// column 2 the tradable flag; only rows whose flag is exactly `"true"`
    /// are kept, in input order. Running out of rows ends the list normally.
    ///
    /// # Errors
    /// A short or malformed row anywhere in the input aborts the whole decode
    /// with a [`DecodeStage::Csv`] error.
    pub fn parse_tickers(body: &[u8]) -> FetcherResult<Vec<Symbol>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(body);
        let mut symbols = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            let record = record.map_err(|e| {
                FetcherError::decode(DecodeStage::Csv, format!("row {row}: {e}"))
            })?;

            let (Some(symbol), Some(flag)) = (record.get(SYMBOL_COLUMN), record.get(TRADABLE_COLUMN))
            else {
                return Err(FetcherError::decode(
                    DecodeStage::Csv,
                    format!(
                        "row {row} has {} fields, expected at least {}",
                        record.len(),
                        TRADABLE_COLUMN + 1
                    ),
                ));
            };

            if flag == "true" {
                symbols.push(Symbol::from(symbol));
            }
        }

        Ok(symbols)
    }

    /// Parse a single-symbol candle array
    ///
    /// Buckets without trades are dropped (order of the rest is preserved)
    /// and every kept candle is stamped with `date`. An empty result is not
    /// an error.
    pub fn parse_intraday(body: &[u8], date: NaiveDate) -> FetcherResult<Vec<Candle>> {
        let value = Self::parse_json(body)?;
        let mut raw = Self::parse_candle_array(value, "intraday response")?;

        raw.retain(|candle| candle.number_of_trades() != 0);

        raw.into_iter()
            .map(|candle| candle.into_candle(date))
            .collect()
    }

    /// Parse a batch response: a JSON object keyed by symbol
    ///
    /// Each value is either the candle array itself or an object keyed by
    /// endpoint type holding it under `intraday-prices`. Candles are stamped
    /// with `date` but, unlike [`parse_intraday`](Self::parse_intraday),
    /// buckets without trades are kept.
    pub fn parse_batch(body: &[u8], date: NaiveDate) -> FetcherResult<HashMap<Symbol, Vec<Candle>>> {
        let value = Self::parse_json(body)?;
        let Value::Object(by_symbol) = value else {
            return Err(FetcherError::decode(
                DecodeStage::Shape,
                format!(
                    "batch response: expected an object keyed by symbol, got {}",
                    json_kind(&value)
                ),
            ));
        };

        let mut result = HashMap::with_capacity(by_symbol.len());
        for (symbol, entry) in by_symbol {
            let candles = match entry {
                Value::Object(mut by_type) => by_type.remove(INTRADAY_PRICES_TYPE).ok_or_else(|| {
                    FetcherError::decode(
                        DecodeStage::Shape,
                        format!("batch entry {symbol}: no {INTRADAY_PRICES_TYPE} section"),
                    )
                })?,
                other => other,
            };

            let candles = Self::parse_candle_array(candles, &format!("batch entry {symbol}"))?
                .into_iter()
                .map(|candle| candle.into_candle(date))
                .collect::<FetcherResult<Vec<_>>>()?;

            result.insert(Symbol::from(symbol), candles);
        }

        Ok(result)
    }

    fn parse_json(body: &[u8]) -> FetcherResult<Value> {
        serde_json::from_slice(body)
            .map_err(|e| FetcherError::decode(DecodeStage::Json, format!("invalid JSON: {e}")))
    }

    fn parse_candle_array(value: Value, context: &str) -> FetcherResult<Vec<RawCandle>> {
        if !value.is_array() {
            return Err(FetcherError::decode(
                DecodeStage::Shape,
                format!("{context}: expected an array of candles, got {}", json_kind(&value)),
            ));
        }

        serde_json::from_value(value).map_err(|e| {
            FetcherError::decode(DecodeStage::Shape, format!("{context}: invalid candle: {e}"))
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
