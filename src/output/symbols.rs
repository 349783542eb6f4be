//! Symbol list output

use crate::Symbol;
use std::io::Write;

use super::{OutputError, OutputResult};

/// Write one symbol per line
pub fn write_lines<W: Write>(mut out: W, symbols: &[Symbol]) -> OutputResult<()> {
    for symbol in symbols {
        writeln!(out, "{symbol}")
            .map_err(|e| OutputError::IoError(format!("Failed to write symbol: {}", e)))?;
    }
    out.flush()
        .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
}

/// Write the symbols as a single JSON array of strings
pub fn write_json<W: Write>(mut out: W, symbols: &[Symbol]) -> OutputResult<()> {
    serde_json::to_writer(&mut out, symbols)
        .map_err(|e| OutputError::SerializationError(e.to_string()))?;
    writeln!(out).map_err(|e| OutputError::IoError(e.to_string()))?;
    out.flush()
        .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
}
