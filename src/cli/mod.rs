//! CLI command implementations

pub mod error;
pub mod fetch;
pub mod resolution;

pub use error::CliError;
pub use fetch::{Cli, Commands, IntradayCommand, SymbolFormat, TickersArgs};
pub use resolution::{parse_resolution, trading_dates};
