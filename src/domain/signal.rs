//! The analysed time series.
//!
//! A [`Signal`] is always sorted by timestamp, strictly increasing and free of
//! nulls. Dirty input is repaired on construction (sorted, nulls and repeated
//! timestamps dropped) and each repair is logged as a warning; it is never an
//! error. What was repaired is kept in [`CleaningReport`].

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::error::EvaError;

/// Corrections applied while building a [`Signal`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    /// Input was not in ascending timestamp order and had to be sorted.
    pub sorted: bool,
    /// Null (missing or NaN) values removed.
    pub nulls_dropped: usize,
    /// Observations dropped because their timestamp repeated an earlier one.
    pub duplicates_dropped: usize,
}

impl CleaningReport {
    pub fn is_clean(&self) -> bool {
        !self.sorted && self.nulls_dropped == 0 && self.duplicates_dropped == 0
    }
}

/// Cleaned, time-indexed numeric series.
#[derive(Debug, Clone)]
pub struct Signal {
    name: String,
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
    cleaning: CleaningReport,
}

impl Signal {
    /// Build a signal from typed observations. `None` and NaN are nulls.
    pub fn new(
        name: impl Into<String>,
        observations: Vec<(NaiveDateTime, Option<f64>)>,
    ) -> Result<Self, EvaError> {
        let name = name.into();
        let mut cleaning = CleaningReport::default();

        info!(signal = %name, n = observations.len(), "ensuring that data is sorted and has no invalid entries");

        let mut observations = observations;
        if !observations.windows(2).all(|w| w[0].0 <= w[1].0) {
            warn!(signal = %name, "data index is not sorted - sorting data by index");
            // Stable, so the first of any repeated timestamps stays first.
            observations.sort_by_key(|(ts, _)| *ts);
            cleaning.sorted = true;
        }

        let before = observations.len();
        let mut cleaned: Vec<(NaiveDateTime, f64)> = observations
            .into_iter()
            .filter_map(|(ts, v)| v.filter(|x| !x.is_nan()).map(|x| (ts, x)))
            .collect();
        cleaning.nulls_dropped = before - cleaned.len();
        if cleaning.nulls_dropped > 0 {
            warn!(
                signal = %name,
                dropped = cleaning.nulls_dropped,
                "nan values found in data - removing invalid entries"
            );
        }

        let before = cleaned.len();
        cleaned.dedup_by_key(|(ts, _)| *ts);
        cleaning.duplicates_dropped = before - cleaned.len();
        if cleaning.duplicates_dropped > 0 {
            warn!(
                signal = %name,
                dropped = cleaning.duplicates_dropped,
                "repeated timestamps found in data - keeping the first observation"
            );
        }

        if cleaned.is_empty() {
            return Err(EvaError::EmptySignal { name });
        }

        let (timestamps, values) = cleaned.into_iter().unzip();
        Ok(Self {
            name,
            timestamps,
            values,
            cleaning,
        })
    }

    /// Build a signal from textual `(timestamp, value)` rows.
    ///
    /// Empty cells and `nan`/`na`/`null`/`none` are nulls. Any other cell
    /// that is not a number, and any timestamp that is not a date/time, is a
    /// type error.
    pub fn parse<I, T, V>(name: impl Into<String>, rows: I) -> Result<Self, EvaError>
    where
        I: IntoIterator<Item = (T, V)>,
        T: AsRef<str>,
        V: AsRef<str>,
    {
        let mut observations = Vec::new();
        for (row, (ts, value)) in rows.into_iter().enumerate() {
            let ts_text = ts.as_ref().trim();
            let timestamp = parse_timestamp(ts_text).ok_or_else(|| EvaError::InvalidIndex {
                row,
                value: ts_text.to_string(),
            })?;
            observations.push((timestamp, parse_value(row, value.as_ref())?));
        }
        Self::new(name, observations)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn cleaning(&self) -> &CleaningReport {
        &self.cleaning
    }

    pub fn first_timestamp(&self) -> NaiveDateTime {
        self.timestamps[0]
    }

    pub fn last_timestamp(&self) -> NaiveDateTime {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// Time between the first and the last observation.
    pub fn span(&self) -> Duration {
        self.last_timestamp() - self.first_timestamp()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }
}

/// Parse a timestamp in one of the accepted layouts.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(row: usize, text: &str) -> Result<Option<f64>, EvaError> {
    let text = text.trim();
    let is_null = text.is_empty()
        || ["nan", "na", "null", "none"]
            .iter()
            .any(|n| text.eq_ignore_ascii_case(n));
    if is_null {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| EvaError::NonNumeric {
            row,
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn clean_input_is_untouched() {
        let s = Signal::new("x", vec![(ts(1), Some(1.0)), (ts(2), Some(2.0))]).unwrap();
        assert!(s.cleaning().is_clean());
        assert_eq!(s.values(), &[1.0, 2.0]);
    }

    #[test]
    fn sorts_and_drops_nulls() {
        let s = Signal::new(
            "x",
            vec![
                (ts(3), Some(3.0)),
                (ts(1), Some(1.0)),
                (ts(4), None),
                (ts(2), Some(f64::NAN)),
                (ts(5), Some(5.0)),
            ],
        )
        .unwrap();
        assert!(s.cleaning().sorted);
        assert_eq!(s.cleaning().nulls_dropped, 2);
        assert_eq!(s.timestamps(), &[ts(1), ts(3), ts(5)]);
        assert_eq!(s.values(), &[1.0, 3.0, 5.0]);
        assert!(s.timestamps().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn repeated_timestamps_keep_first() {
        let s = Signal::new(
            "x",
            vec![(ts(2), Some(2.0)), (ts(1), Some(1.0)), (ts(2), Some(9.0))],
        )
        .unwrap();
        assert_eq!(s.cleaning().duplicates_dropped, 1);
        assert_eq!(s.values(), &[1.0, 2.0]);
    }

    #[test]
    fn all_null_is_an_error() {
        let err = Signal::new("x", vec![(ts(1), None)]).unwrap_err();
        assert!(matches!(err, EvaError::EmptySignal { .. }));
    }

    #[test]
    fn parse_rejects_bad_index_and_values() {
        let err = Signal::parse("x", [("2000-01-01", "1.0"), ("yesterday", "2.0")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert!(matches!(err, EvaError::InvalidIndex { row: 1, .. }));

        let err = Signal::parse("x", [("2000-01-01", "abc")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn parse_accepts_nulls_and_layouts() {
        let s = Signal::parse(
            "x",
            [
                ("2000-01-01", "1.5"),
                ("2000-01-02 06:00:00", ""),
                ("2000-01-03T12:30:00", "NaN"),
                ("2000-01-04 00:00", "4"),
            ],
        )
        .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.cleaning().nulls_dropped, 2);
        assert_eq!(s.span(), Duration::days(3));
    }
}
