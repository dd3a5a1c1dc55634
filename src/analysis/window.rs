//! Date windows and timestamp bucketing.

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;
use thiserror::Error;

/// Length of the fixed "monthly" windows.
pub const THIRTY_DAYS_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Hours in a day, one bucket each.
pub const HOURS_PER_DAY: usize = 24;

/// Errors raised while building windows and buckets.
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("window start {start} must be before end {end}")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },

    #[error("{0} has no local midnight, the clock skips it")]
    NonexistentMidnight(NaiveDate),

    #[error("at least 2 bucket boundaries are required, got {0}")]
    TooFewEdges(usize),
}

/// Time zone used to interpret calendar dates and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TimeBasis {
    #[default]
    Local,
    Utc,
}

impl TimeBasis {
    pub fn from_utc_flag(utc: bool) -> Self {
        if utc {
            TimeBasis::Utc
        } else {
            TimeBasis::Local
        }
    }

    /// Epoch milliseconds of midnight at the start of `date`.
    pub fn midnight_ms(self, date: NaiveDate) -> Result<i64, WindowError> {
        match self {
            TimeBasis::Utc => midnight_in(&Utc, date),
            TimeBasis::Local => midnight_in(&Local, date),
        }
    }

    /// Hour of day (0-23) of a timestamp.
    pub fn hour_of(self, timestamp_ms: i64) -> Option<u32> {
        let utc = utc_datetime(timestamp_ms)?;
        Some(match self {
            TimeBasis::Utc => utc.hour(),
            TimeBasis::Local => utc.with_timezone(&Local).hour(),
        })
    }

    /// Calendar year of a timestamp.
    pub fn year_of(self, timestamp_ms: i64) -> Option<i32> {
        let utc = utc_datetime(timestamp_ms)?;
        Some(match self {
            TimeBasis::Utc => utc.year(),
            TimeBasis::Local => utc.with_timezone(&Local).year(),
        })
    }

    /// Format a timestamp with a strftime pattern.
    pub fn format(self, timestamp_ms: i64, pattern: &str) -> String {
        match utc_datetime(timestamp_ms) {
            Some(utc) => match self {
                TimeBasis::Utc => utc.format(pattern).to_string(),
                TimeBasis::Local => utc.with_timezone(&Local).format(pattern).to_string(),
            },
            None => timestamp_ms.to_string(),
        }
    }
}

/// Midnight of `date` in `tz`. A midnight repeated by a DST fold resolves to
/// the earlier instant; one skipped by a DST gap is an error.
fn midnight_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Result<i64, WindowError> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|dt| dt.timestamp_millis())
        .ok_or(WindowError::NonexistentMidnight(date))
}

fn utc_datetime(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(timestamp_ms).single()
}

/// A span of time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DateWindow {
    /// Window from midnight of `start` to midnight of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate, basis: TimeBasis) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::EmptyWindow { start, end });
        }
        Ok(Self {
            start_ms: basis.midnight_ms(start)?,
            end_ms: basis.midnight_ms(end)?,
        })
    }

    /// Returns true if the timestamp lies inside the window (both ends included).
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&timestamp_ms)
    }

    /// `num` evenly spaced boundaries from start to end.
    pub fn boundaries(&self, num: usize) -> Vec<f64> {
        linspace(self.start_ms as f64, self.end_ms as f64, num)
    }

    /// Consecutive windows of `step_ms` starting at `start_ms` while the start lies before `end_ms`.
    ///
    /// The last window may extend past the end of this window.
    pub fn fixed_windows(&self, step_ms: i64) -> Vec<DateWindow> {
        let mut windows = Vec::new();
        if step_ms <= 0 {
            return windows;
        }

        let mut start = self.start_ms;
        while start < self.end_ms {
            windows.push(DateWindow {
                start_ms: start,
                end_ms: start + step_ms,
            });
            start += step_ms;
        }
        windows
    }
}

/// `num` evenly spaced values over `[start, end]`.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
            values[num - 1] = end;
            values
        }
    }
}

/// Count values per bucket.
///
/// `edges.len() - 1` buckets are produced. Each bucket is `[edges[i], edges[i + 1])`
/// except the last, which also includes its right edge. Values outside the
/// edges are ignored. Edges must be sorted ascending.
pub fn histogram(values: &[i64], edges: &[f64]) -> Result<Vec<u64>, WindowError> {
    if edges.len() < 2 {
        return Err(WindowError::TooFewEdges(edges.len()));
    }

    let buckets = edges.len() - 1;
    let first = edges[0];
    let last = edges[buckets];
    let mut counts = vec![0u64; buckets];

    for &value in values {
        let v = value as f64;
        if v < first || v > last {
            continue;
        }
        let idx = edges.partition_point(|edge| *edge <= v).saturating_sub(1);
        counts[idx.min(buckets - 1)] += 1;
    }

    Ok(counts)
}

/// Running sum of bucket counts.
pub fn cumulative(counts: &[u64]) -> Vec<u64> {
    counts
        .iter()
        .scan(0u64, |sum, count| {
            *sum += count;
            Some(*sum)
        })
        .collect()
}

/// Messages per hour of day (24 buckets).
pub fn hour_histogram(timestamps: &[i64], basis: TimeBasis) -> [u64; HOURS_PER_DAY] {
    let mut counts = [0u64; HOURS_PER_DAY];
    for hour in timestamps.iter().filter_map(|ts| basis.hour_of(*ts)) {
        counts[hour as usize] += 1;
    }
    counts
}

/// Share of the total per bucket. All zeros when the total is zero.
pub fn density(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .map(|count| *count as f64 / total as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_utc_midnight() {
        let ms = TimeBasis::Utc.midnight_ms(date(2020, 1, 1)).unwrap();
        assert_eq!(ms, 1_577_836_800_000);
    }

    #[test]
    fn test_midnight_in_fixed_offset() {
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        let ms = midnight_in(&plus_one, date(2020, 1, 1)).unwrap();
        assert_eq!(ms, 1_577_836_800_000 - 3_600_000);
    }

    #[test]
    fn test_nonexistent_midnight_message() {
        let err = WindowError::NonexistentMidnight(date(2020, 3, 29));
        assert_eq!(err.to_string(), "2020-03-29 has no local midnight, the clock skips it");
    }

    #[test]
    fn test_window_requires_start_before_end() {
        let result = DateWindow::from_dates(date(2020, 1, 2), date(2020, 1, 1), TimeBasis::Utc);
        assert!(matches!(result, Err(WindowError::EmptyWindow { .. })));
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 10.0, 5), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_histogram_bucket_edges() {
        let edges = linspace(0.0, 10.0, 3);
        // buckets [0, 5) and [5, 10]
        let counts = histogram(&[-1, 0, 4, 5, 9, 10, 11], &edges).unwrap();
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn test_histogram_counts_sum_to_in_range_values() {
        let edges = linspace(100.0, 200.0, 11);
        let values: Vec<i64> = (50..250).collect();
        let counts = histogram(&values, &edges).unwrap();
        assert_eq!(counts.len(), 10);
        assert_eq!(counts.iter().sum::<u64>(), 101);
    }

    #[test]
    fn test_histogram_needs_two_edges() {
        assert_eq!(histogram(&[1], &[0.0]), Err(WindowError::TooFewEdges(1)));
    }

    #[test]
    fn test_cumulative_is_non_decreasing() {
        let sums = cumulative(&[3, 0, 2, 5]);
        assert_eq!(sums, vec![3, 3, 5, 10]);
        assert!(sums.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_hour_histogram_utc() {
        let midnight = 1_577_836_800_000;
        let hour = 3_600_000;
        let counts = hour_histogram(&[midnight, midnight + hour, midnight + 23 * hour + 1], TimeBasis::Utc);
        assert_eq!(counts[0], 1);
        assert_eq!(counts[1], 1);
        assert_eq!(counts[23], 1);
        assert_eq!(counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_density_sums_to_one() {
        let shares = density(&[1, 3, 0, 4]);
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(shares[1], 0.375);
        assert_eq!(density(&[0, 0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_fixed_windows() {
        let window = DateWindow {
            start_ms: 0,
            end_ms: THIRTY_DAYS_MS * 2 + 1,
        };
        let windows = window.fixed_windows(THIRTY_DAYS_MS);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].start_ms, THIRTY_DAYS_MS * 2);
        assert_eq!(windows[2].end_ms, THIRTY_DAYS_MS * 3);
    }

    #[test]
    fn test_year_and_format_utc() {
        let ts = 1_577_836_800_000;
        assert_eq!(TimeBasis::Utc.year_of(ts), Some(2020));
        assert_eq!(TimeBasis::Utc.year_of(ts - 1), Some(2019));
        assert_eq!(TimeBasis::Utc.format(ts, "%Y-%m"), "2020-01");
    }
}
