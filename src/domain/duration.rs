//! Calendar-free durations used for block sizes, declustering windows and
//! return-period units.
//!
//! Durations are written as `<number><unit>`, for example `1Y`, `30D`,
//! `24H`, `90min`. A year is the Julian year of 365.25 days, so `1Y / 30D`
//! is `365.25 / 30`.

use std::fmt;

use chrono::Duration;

use crate::error::EvaError;

/// Length of a year in days.
pub const DAYS_PER_YEAR: f64 = 365.25;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A duration as supplied by the caller: either text still to be parsed or
/// an already-typed span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationArg {
    Text(String),
    Span(Duration),
}

impl DurationArg {
    /// Resolve into a strictly positive [`Duration`].
    pub fn resolve(&self) -> Result<Duration, EvaError> {
        let duration = match self {
            DurationArg::Text(text) => parse_duration(text)?,
            DurationArg::Span(span) => *span,
        };
        if duration <= Duration::zero() {
            return Err(EvaError::InvalidDuration {
                value: self.to_string(),
                reason: "duration must be positive".to_string(),
            });
        }
        Ok(duration)
    }
}

impl From<&str> for DurationArg {
    fn from(value: &str) -> Self {
        DurationArg::Text(value.to_string())
    }
}

impl From<String> for DurationArg {
    fn from(value: String) -> Self {
        DurationArg::Text(value)
    }
}

impl From<Duration> for DurationArg {
    fn from(value: Duration) -> Self {
        DurationArg::Span(value)
    }
}

impl fmt::Display for DurationArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationArg::Text(text) => write!(f, "{text}"),
            DurationArg::Span(span) => write!(f, "{}", format_duration(*span)),
        }
    }
}

/// Parse `<number><unit>` into a [`Duration`] (millisecond resolution).
///
/// Units: `Y`/`year`, `W`/`week`, `D`/`day`, `H`/`hour`, `min`/`T`,
/// `S`/`sec`. Unit names are case-insensitive and may be pluralised.
pub fn parse_duration(text: &str) -> Result<Duration, EvaError> {
    let invalid = |reason: &str| EvaError::InvalidDuration {
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(|| invalid("missing unit"))?;
    let (number, unit) = trimmed.split_at(split);

    let amount: f64 = if number.is_empty() {
        1.0
    } else {
        number.parse().map_err(|_| invalid("malformed number"))?
    };

    let unit = unit.trim().to_ascii_lowercase();
    let seconds_per_unit = match unit.trim_end_matches('s') {
        "y" | "year" => DAYS_PER_YEAR * SECONDS_PER_DAY,
        "w" | "week" => 7.0 * SECONDS_PER_DAY,
        "d" | "day" => SECONDS_PER_DAY,
        "h" | "hour" => 3_600.0,
        "min" | "t" | "minute" => 60.0,
        "" | "sec" | "second" => 1.0,
        _ => return Err(invalid("unknown unit")),
    };

    let millis = (amount * seconds_per_unit * 1_000.0).round();
    if !millis.is_finite() || millis > i64::MAX as f64 {
        return Err(invalid("duration out of range"));
    }
    Duration::try_milliseconds(millis as i64).ok_or_else(|| invalid("duration out of range"))
}

/// Ratio of two durations, `numerator / denominator`.
///
/// Exact when both are the same span (the ratio is then `1.0`).
pub fn ratio(numerator: Duration, denominator: Duration) -> f64 {
    numerator.num_milliseconds() as f64 / denominator.num_milliseconds() as f64
}

/// Render a duration as `N days HH:MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let days = total / 86_400;
    let rem = total % 86_400;
    format!(
        "{sign}{days} days {:02}:{:02}:{:02}",
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60
    )
}
