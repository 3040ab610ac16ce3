// Relative time spans such as "15m" or "4h"
use chrono::Duration;
use thiserror::Error;

/// Lookback used when none is given
pub const DEFAULT_TIME_SPAN: &str = "4h";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeSpanError {
    #[error("empty time span")]
    Empty,
    #[error("invalid amount in time span '{0}'")]
    InvalidAmount(String),
    #[error("unknown unit '{unit}' in time span '{span}'")]
    UnknownUnit { span: String, unit: String },
    #[error("time span '{0}' is out of range")]
    OutOfRange(String),
}

/// Parse `<amount><unit>` with units s, m, h, d, w, M (30 days) and y (365 days)
pub fn parse_time_span(span: &str) -> Result<Duration, TimeSpanError> {
    let span = span.trim();
    let unit_start = span
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .ok_or_else(|| {
            if span.is_empty() {
                TimeSpanError::Empty
            } else {
                TimeSpanError::UnknownUnit {
                    span: span.to_string(),
                    unit: String::new(),
                }
            }
        })?;

    let (amount, unit) = span.split_at(unit_start);
    let amount: i64 = amount
        .parse()
        .map_err(|_| TimeSpanError::InvalidAmount(span.to_string()))?;

    let duration = match unit {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_weeks(amount),
        "M" => amount.checked_mul(30).and_then(Duration::try_days),
        "y" => amount.checked_mul(365).and_then(Duration::try_days),
        _ => {
            return Err(TimeSpanError::UnknownUnit {
                span: span.to_string(),
                unit: unit.to_string(),
            })
        }
    };
    duration.ok_or_else(|| TimeSpanError::OutOfRange(span.to_string()))
}

/// Lookback of a `now-<span>` expression
pub fn lookback_of(from: &str) -> Result<Duration, TimeSpanError> {
    parse_time_span(from.strip_prefix("now-").unwrap_or(from))
}
