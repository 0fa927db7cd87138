//! Daily-periodic baseline ("typical value") estimation.
//!
//! Reference points are keyed by their UTC time of day. Within one bucket, the
//! values of each calendar day are collapsed into one vote (mode over rounded
//! values, median on ties), then the votes of all days are collapsed the same
//! way. A storm that lasts a single day therefore contributes one vote and is
//! outvoted by the quiet days.
//!
//! ```
//! use geomag::{Baseline, Duration, Point};
//!
//! // Seven days at 00:00, one of them disturbed
//! let reference = (0..7)
//!     .map(|day| Point::new(Duration::days(day), if day == 3 { 100.0 } else { 5.0 }))
//!     .collect::<Vec<_>>();
//!
//! let table = Baseline::builder()
//!     .bucket_size_ms(Duration::minutes(1))
//!     .build(&reference);
//!
//! assert_eq!(vec![(Duration::days(7), Some(5.0))], table.series(&[Duration::days(7)]));
//! ```

mod stats;
mod table;

pub use stats::{median, mode};
pub use table::BaselineTable;

use crate::{
    time::{day_number, parse_iso, time_of_day},
    Point, Timestamp, Value,
};
use stats::representative;

/// Default width of a time-of-day bucket.
pub const DEFAULT_BUCKET_SIZE_MS: Timestamp = 1_000;

/// Default number of decimals values are rounded to before voting.
pub const DEFAULT_ROUNDING_DECIMALS: u32 = 3;

/// UTC time-of-day offset of `ts`, floored to `bucket_size_ms`.
///
/// A non-positive bucket size falls back to [`DEFAULT_BUCKET_SIZE_MS`].
#[must_use]
pub fn daily_bucket_key(ts: Timestamp, bucket_size_ms: Timestamp) -> Timestamp {
    let size = effective_bucket_size(bucket_size_ms);
    time_of_day(ts) / size * size
}

fn effective_bucket_size(bucket_size_ms: Timestamp) -> Timestamp {
    if bucket_size_ms > 0 {
        bucket_size_ms
    } else {
        DEFAULT_BUCKET_SIZE_MS
    }
}

/// Entry point for building baselines
pub struct Baseline;

impl Baseline {
    /// Starts a baseline with default settings.
    #[must_use]
    pub fn builder() -> BaselineBuilder {
        BaselineBuilder::default()
    }
}

/// Builder for [`BaselineTable`].
#[derive(Clone, Debug)]
pub struct BaselineBuilder {
    bucket_size_ms: Timestamp,
    rounding_decimals: u32,
}

impl Default for BaselineBuilder {
    fn default() -> Self {
        Self {
            bucket_size_ms: DEFAULT_BUCKET_SIZE_MS,
            rounding_decimals: DEFAULT_ROUNDING_DECIMALS,
        }
    }
}

impl BaselineBuilder {
    /// Sets the time-of-day bucket width.
    ///
    /// Default = 1000 ms
    #[must_use]
    pub fn bucket_size_ms(mut self, ms: Timestamp) -> Self {
        self.bucket_size_ms = effective_bucket_size(ms);
        self
    }

    /// Sets how many decimals values are rounded to before voting.
    ///
    /// Default = 3
    #[must_use]
    pub fn rounding_decimals(mut self, decimals: u32) -> Self {
        self.rounding_decimals = decimals;
        self
    }

    /// Builds the baseline table from reference points.
    ///
    /// Non-finite values are ignored; an empty reference yields an empty table
    /// whose lookups all return `None`.
    #[must_use]
    pub fn build(&self, reference: &[Point]) -> BaselineTable {
        self.build_from_pairs(reference.iter().map(|p| (p.timestamp, p.value)))
    }

    /// Builds the baseline table from chart labels and their values.
    ///
    /// Pairs whose label is not a valid ISO-8601 instant are ignored, as are
    /// surplus labels or values.
    #[must_use]
    pub fn build_from_labels<S: AsRef<str>>(&self, labels: &[S], values: &[Value]) -> BaselineTable {
        self.build_from_pairs(
            labels
                .iter()
                .zip(values)
                .filter_map(|(label, &value)| Some((parse_iso(label.as_ref())?, value))),
        )
    }

    fn build_from_pairs<I: Iterator<Item = (Timestamp, Value)>>(&self, pairs: I) -> BaselineTable {
        let decimals = self.rounding_decimals;

        // bucket key -> day number -> values of that day
        let mut by_bucket: crate::HashMap<Timestamp, crate::HashMap<i64, Vec<Value>>> =
            crate::HashMap::default();
        let mut raw_values = vec![];

        for (ts, value) in pairs {
            if !value.is_finite() {
                continue;
            }

            by_bucket
                .entry(daily_bucket_key(ts, self.bucket_size_ms))
                .or_default()
                .entry(day_number(ts))
                .or_default()
                .push(value);

            raw_values.push(value);
        }

        let mut rows = Vec::with_capacity(by_bucket.len());
        let mut all_daily = vec![];

        for (key, days) in by_bucket {
            let daily = days
                .values()
                .filter_map(|values| representative(values, decimals))
                .collect::<Vec<_>>();

            let Some(typical) = representative(&daily, decimals) else {
                continue;
            };

            all_daily.extend(daily);
            rows.push((key, typical));
        }

        rows.sort_by_key(|&(key, _)| key);

        let fallback = representative(&all_daily, decimals)
            .or_else(|| representative(&raw_values, decimals));

        log::debug!(
            "built baseline with {} buckets from {} reference values",
            rows.len(),
            raw_values.len()
        );

        BaselineTable {
            bucket_size_ms: self.bucket_size_ms,
            rows,
            fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{time::from_utc, PointSeries};
    use test_log::test;

    const DAY_MS: Timestamp = crate::time::DAY_MS;

    fn ts(day: i64, within_day: Timestamp) -> Timestamp {
        from_utc(2024, 1, 1, 0, 0, 0).unwrap() + day * DAY_MS + within_day
    }

    fn minute_baseline() -> BaselineBuilder {
        Baseline::builder().bucket_size_ms(60_000)
    }

    fn values(result: &[(Timestamp, Option<Value>)]) -> Vec<Option<Value>> {
        result.iter().map(|&(_, v)| v).collect()
    }

    #[test]
    fn constant_reference() {
        let reference = (0..7).map(|d| Point::new(ts(d, 0), 1.0)).collect::<Vec<_>>();
        let table = minute_baseline().build(&reference);

        let result = table.series(&[ts(7, 0), ts(7, 60_000)]);
        assert_eq!(vec![Some(1.0), Some(1.0)], values(&result));
    }

    #[test]
    fn single_day_outlier_is_ignored() {
        let reference = (0..7)
            .map(|d| Point::new(ts(d, 0), if d == 3 { 100.0 } else { 5.0 }))
            .collect::<Vec<_>>();
        let table = minute_baseline().build(&reference);

        assert_eq!(vec![Some(5.0)], values(&table.series(&[ts(7, 0)])));
    }

    #[test]
    fn partial_days() {
        let reference = (0..7)
            .filter(|d| d % 2 == 0)
            .map(|d| Point::new(ts(d, 0), 2.0))
            .collect::<Vec<_>>();
        let table = minute_baseline().build(&reference);

        assert_eq!(vec![Some(2.0)], values(&table.series(&[ts(7, 0)])));
    }

    #[test]
    fn interpolates_between_buckets() {
        let reference = [
            Point::new(ts(0, 0), 0.0),
            Point::new(ts(0, 120_000), 10.0),
            Point::new(ts(1, 0), 0.0),
            Point::new(ts(1, 120_000), 10.0),
        ];
        let table = minute_baseline().build(&reference);

        assert_eq!(vec![Some(5.0)], values(&table.series(&[ts(7, 60_000)])));
    }

    #[test]
    fn no_reference_yields_nulls() {
        let table = minute_baseline().build(&[]);
        let result = table.series(&[ts(0, 0)]);

        assert_eq!(vec![(ts(0, 0), None)], result);
        assert!(table.is_empty());
        assert_eq!(None, table.fallback());
    }

    #[test]
    fn non_finite_reference_is_ignored() {
        let reference = [Point::new(ts(0, 0), f64::NAN), Point::new(ts(1, 0), 3.0)];
        let table = minute_baseline().build(&reference);

        assert_eq!(&[(0, 3.0)], table.rows());
    }

    #[test]
    fn one_vote_per_day() {
        // Day 0 has many samples of 9 in the bucket, days 1 and 2 a single 4
        let mut reference = (0..50)
            .map(|s| Point::new(ts(0, s * 1_000), 9.0))
            .collect::<Vec<_>>();
        reference.push(Point::new(ts(1, 0), 4.0));
        reference.push(Point::new(ts(2, 30_000), 4.0));

        let table = minute_baseline().build(&reference);

        assert_eq!(Some(4.0), table.value_at(ts(5, 0)));
    }

    #[test]
    fn daily_vote_uses_mode_within_day() {
        let reference = [
            Point::new(ts(0, 0), 1.0),
            Point::new(ts(0, 10_000), 1.0),
            Point::new(ts(0, 20_000), 8.0),
        ];
        let table = minute_baseline().build(&reference);

        assert_eq!(&[(0, 1.0)], table.rows());
    }

    #[test]
    fn tied_days_use_median() {
        let reference = [Point::new(ts(0, 0), 2.0), Point::new(ts(1, 0), 4.0)];
        let table = minute_baseline().build(&reference);

        assert_eq!(&[(0, 3.0)], table.rows());
        assert_eq!(Some(3.0), table.fallback());
    }

    #[test]
    fn rounding_controls_votes() {
        let reference = [
            Point::new(ts(0, 0), 10.01),
            Point::new(ts(1, 0), 10.04),
            Point::new(ts(2, 0), 12.0),
        ];

        let coarse = minute_baseline().rounding_decimals(1).build(&reference);
        assert_eq!(&[(0, 10.0)], coarse.rows());

        let fine = minute_baseline().rounding_decimals(3).build(&reference);
        assert_eq!(&[(0, 10.04)], fine.rows());
    }

    #[test]
    fn default_bucket_is_one_second() {
        let reference = [Point::new(ts(0, 1_500), 1.0), Point::new(ts(0, 2_500), 3.0)];
        let table = Baseline::builder().bucket_size_ms(0).build(&reference);

        assert_eq!(1_000, table.bucket_size_ms());
        assert_eq!(&[(1_000, 1.0), (2_000, 3.0)], table.rows());
    }

    #[test]
    fn bucket_key_floors_time_of_day() {
        assert_eq!(0, daily_bucket_key(ts(3, 59_999), 60_000));
        assert_eq!(60_000, daily_bucket_key(ts(3, 60_000), 60_000));
        assert_eq!(DAY_MS - 1_000, daily_bucket_key(ts(3, -1), 1_000));
        assert_eq!(5_000, daily_bucket_key(ts(0, 5_999), -10));
    }

    #[test]
    fn labels_in_and_out() {
        let labels = [
            "2024-01-01T00:00:00.000Z",
            "not a date",
            "2024-01-02T00:00:00.000Z",
            "2024-01-03T00:00:00Z",
        ];
        let table = minute_baseline().build_from_labels(&labels, &[6.0, 1_000.0, 6.0, f64::NAN]);

        assert_eq!(&[(0, 6.0)], table.rows());

        let result = table.series_from_labels(&["2024-02-01T00:00:30Z", "garbage"]);
        assert_eq!(1, result.len());
        assert_eq!(Some(6.0), result.first().and_then(|&(_, v)| v));
    }

    #[test]
    fn deviation_from_baseline() {
        let reference = (0..3).map(|d| Point::new(ts(d, 0), 20.0)).collect::<Vec<_>>();
        let table = minute_baseline().build(&reference);

        let series = PointSeries::new([Point::new(ts(4, 0), 25.0), Point::new(ts(4, 60_000), 18.5)]);

        assert_eq!(
            vec![(ts(4, 0), Some(5.0)), (ts(4, 60_000), Some(-1.5))],
            table.deviation(&series),
        );

        let empty = minute_baseline().build(&[]);
        assert_eq!(vec![(ts(4, 0), None), (ts(4, 60_000), None)], empty.deviation(&series));
    }
}
