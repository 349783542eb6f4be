//! Candle and symbol output writers

use crate::{Candle, Symbol};

pub mod csv;
pub mod symbols;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to the underlying sink
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing intraday candles
pub trait CandlesWriter: OutputWriter {
    /// Write a single candle of `symbol`
    fn write_candle(&mut self, symbol: &Symbol, candle: &Candle) -> OutputResult<()>;

    /// Write several candles of `symbol`, in order
    fn write_candles(&mut self, symbol: &Symbol, candles: &[Candle]) -> OutputResult<()> {
        for candle in candles {
            self.write_candle(symbol, candle)?;
        }
        Ok(())
    }
}
