//! CSV output for intraday candles

use crate::{Candle, Symbol};
use chrono::SecondsFormat;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use super::{CandlesWriter, OutputError, OutputResult, OutputWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV record for one candle
#[derive(Debug, Serialize)]
struct CandleRecord<'a> {
    symbol: &'a str,
    timestamp: String,
    high: String,
    low: String,
    open: String,
    close: String,
    average: String,
    volume: u64,
    notional: String,
    number_of_trades: u64,
}

impl<'a> CandleRecord<'a> {
    fn new(symbol: &'a Symbol, candle: &Candle) -> Self {
        Self {
            symbol: symbol.as_str(),
            timestamp: candle.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            high: candle.high.to_string(),
            low: candle.low.to_string(),
            open: candle.open.to_string(),
            close: candle.close.to_string(),
            average: candle.average.to_string(),
            volume: candle.volume,
            notional: candle.notional.to_string(),
            number_of_trades: candle.number_of_trades,
        }
    }
}

/// CSV writer for candles
///
/// The header row is written with the first candle, so an empty download
/// produces empty output rather than a lone header.
pub struct CsvCandlesWriter<W: Write> {
    writer: Writer<W>,
    candles_written: u64,
}

impl<W: Write> CsvCandlesWriter<W> {
    /// Wrap any writer (stdout, a buffer)
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
            candles_written: 0,
        }
    }

    /// Get number of candles written so far
    pub fn candles_written(&self) -> u64 {
        self.candles_written
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> OutputResult<W> {
        self.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {}", e)))
    }
}

impl CsvCandlesWriter<BufWriter<File>> {
    /// Create a CSV file at `path`, creating parent directories
    pub fn create<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        Ok(Self::new(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file)))
    }
}

impl<W: Write> CandlesWriter for CsvCandlesWriter<W> {
    fn write_candle(&mut self, symbol: &Symbol, candle: &Candle) -> OutputResult<()> {
        self.writer
            .serialize(CandleRecord::new(symbol, candle))
            .map_err(|e| OutputError::CsvError(format!("Failed to write candle: {}", e)))?;

        self.candles_written += 1;

        if self.candles_written % 1000 == 0 {
            self.flush()?;
            debug!("Progress: {} candles written", self.candles_written);
        }

        Ok(())
    }
}

impl<W: Write> OutputWriter for CsvCandlesWriter<W> {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(self) -> OutputResult<()> {
        let written = self.candles_written;
        self.into_inner()?;
        debug!("CSV writer closed: {} candles written", written);
        Ok(())
    }
}
