//! Resolution specifiers and date selection for the intraday command

use chrono::{Days, NaiveDate};
use std::time::Duration;

use super::CliError;

/// Parse a resolution specifier such as `1m`, `90s`, `1.5h` or `1h30m`
///
/// The input is a sequence of `<number><unit>` groups whose durations are
/// summed. Units are `d` (day), `h`, `m` and `s`; numbers may be fractional.
///
/// # Errors
/// Empty input, a group without a number, an unknown or missing unit, or a
/// total that is not a positive, representable duration.
pub fn parse_resolution(input: &str) -> Result<Duration, CliError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(input, "empty resolution"));
    }

    let mut total_secs = 0f64;
    let mut rest = trimmed;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid(input, &format!("expected a number at '{rest}'")));
        }

        let (number, tail) = rest.split_at(number_len);
        let value: f64 = number
            .parse()
            .map_err(|_| invalid(input, &format!("'{number}' is not a number")))?;

        let mut chars = tail.chars();
        let unit_secs = match chars.next() {
            Some('d') => 86_400.0,
            Some('h') => 3_600.0,
            Some('m') => 60.0,
            Some('s') => 1.0,
            Some(unit) => {
                return Err(invalid(input, &format!("unit not recognized: '{unit}'")));
            }
            None => return Err(invalid(input, &format!("missing unit after '{number}'"))),
        };

        total_secs += value * unit_secs;
        rest = chars.as_str();
    }

    if total_secs <= 0.0 {
        return Err(invalid(input, "resolution must be positive"));
    }

    Duration::try_from_secs_f64(total_secs).map_err(|e| invalid(input, &e.to_string()))
}

/// clap value parser wrapper around [`parse_resolution`]
pub fn parse_resolution_arg(input: &str) -> Result<Duration, String> {
    parse_resolution(input).map_err(|e| e.to_string())
}

/// The `days` calendar days ending at `end`, most recent first
pub fn trading_dates(end: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..u64::from(days))
        .map_while(|offset| end.checked_sub_days(Days::new(offset)))
        .collect()
}

fn invalid(input: &str, reason: &str) -> CliError {
    CliError::InvalidArgument(format!("parse resolution specifier '{input}': {reason}"))
}
