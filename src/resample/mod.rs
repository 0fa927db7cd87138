//! Bucketed downsampling for chart rendering.

mod avg;
mod ladder;

pub use avg::Avg;
pub use ladder::{pick_bucket_width, LADDER, MAX_BUCKET, MIN_BUCKET};

use crate::{Point, PointSeries, Timestamp, Value};

/// Number of points a chart is expected to render.
pub const DEFAULT_TARGET_POINTS: usize = 4_000;

/// A half-open time interval `[start, start + width)` being aggregated
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bucket {
    /// Left edge of the interval
    pub start: Timestamp,

    /// Smallest timestamp seen in the interval
    pub first: Timestamp,

    /// Accumulated value
    pub value: Value,

    /// Number of accumulated points
    pub len: usize,
}

/// Defines an aggregation.
///
/// - `init` seeds the accumulator with the first value (default: Identity)
///
/// - `transform` defines what to do with each further value (default: Add)
///
/// - `finish` can transform the result value (default: Identity)
pub trait Aggregation {
    /// Seeds the accumulator.
    fn init(value: Value) -> Value {
        value
    }

    /// Folds the next value into the accumulator.
    fn transform(accu: Value, x: Value) -> Value {
        accu + x
    }

    /// Produces the bucket's value.
    fn finish(bucket: &Bucket) -> Value {
        bucket.value
    }
}

/// Averages points into buckets of `bucket_ms`.
///
/// See [`aggregate_with`].
#[must_use]
pub fn aggregate(points: &[Point], bucket_ms: Timestamp) -> PointSeries {
    aggregate_with::<Avg>(points, bucket_ms)
}

/// Groups points into `[k * bucket_ms, (k + 1) * bucket_ms)` buckets and folds each
/// bucket with `A`.
///
/// Every non-empty bucket becomes one point stamped with the *earliest* timestamp it
/// contains (not the bucket edge). Buckets whose result is not finite are dropped.
/// A non-positive width returns the points unchanged.
///
/// ```
/// use geomag::{aggregate, Point};
///
/// let out = aggregate(&[Point::new(0, 1.0), Point::new(500, 3.0)], 1_000);
/// assert_eq!(&[Point::new(0, 2.0)], out.as_slice());
/// ```
#[must_use]
pub fn aggregate_with<A: Aggregation>(points: &[Point], bucket_ms: Timestamp) -> PointSeries {
    if bucket_ms <= 0 {
        return PointSeries::new(points.iter().copied());
    }

    let mut buckets: crate::HashMap<Timestamp, Bucket> =
        crate::HashMap::with_capacity_and_hasher(points.len().min(1_024), rustc_hash::FxBuildHasher);

    for point in points {
        if !point.value.is_finite() {
            continue;
        }

        let start = point.timestamp.div_euclid(bucket_ms).saturating_mul(bucket_ms);

        buckets
            .entry(start)
            .and_modify(|bucket| {
                bucket.len += 1;
                bucket.value = A::transform(bucket.value, point.value);
                bucket.first = bucket.first.min(point.timestamp);
            })
            .or_insert_with(|| Bucket {
                start,
                first: point.timestamp,
                value: A::init(point.value),
                len: 1,
            });
    }

    let mut aggregated = buckets
        .into_values()
        .filter_map(|bucket| {
            let value = A::finish(&bucket);
            value
                .is_finite()
                .then_some(Point::new(bucket.first, value))
        })
        .collect::<Vec<_>>();

    aggregated.sort_by_key(|p| p.timestamp);

    PointSeries::from_sorted(aggregated)
}

/// Outcome of [`Resampler::run`]
#[derive(Clone, Debug, PartialEq)]
pub struct Resampled {
    /// Points to render
    pub points: PointSeries,

    /// Bucket width chosen for the requested range
    pub bucket_ms: Timestamp,

    /// `true` if `points` holds aggregates rather than raw points
    pub downsampled: bool,

    /// Number of raw points before resampling
    pub original_points: usize,
}

/// Downsamples a series to roughly a point budget.
///
/// ```
/// use geomag::{Duration, Point, PointSeries, Resampler};
///
/// // One week of minute data
/// let series = (0..Duration::weeks(1))
///     .step_by(Duration::minutes(1) as usize)
///     .map(|t| Point::new(t, 1.0))
///     .collect::<PointSeries>();
///
/// let resampled = Resampler::new().run(&series, 0, Duration::weeks(1));
///
/// assert!(resampled.downsampled);
/// assert_eq!(Duration::minutes(5), resampled.bucket_ms);
/// assert_eq!(2_016, resampled.points.len());
/// ```
#[derive(Clone, Debug)]
pub struct Resampler {
    target_points: usize,
    aggregate_at_finest: bool,
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler {
    /// Creates a resampler with a budget of 4000 points.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target_points: DEFAULT_TARGET_POINTS,
            aggregate_at_finest: false,
        }
    }

    /// Sets the point budget.
    ///
    /// Default = 4000
    #[must_use]
    pub fn target_points(mut self, n: usize) -> Self {
        self.target_points = n;
        self
    }

    /// Also aggregates into one-minute buckets when the series exceeds the budget.
    ///
    /// Minute data is never worth aggregating at the finest width, but
    /// second data (e.g. electric field mills) is.
    ///
    /// Default = false
    #[must_use]
    pub fn aggregate_at_finest(mut self, enabled: bool) -> Self {
        self.aggregate_at_finest = enabled;
        self
    }

    /// Resamples `series` for display of `[range_start, range_end]`.
    ///
    /// Aggregation only happens if the chosen width is coarser than one minute
    /// (or [`Resampler::aggregate_at_finest`] is set) *and* the series exceeds
    /// the budget; otherwise the series passes through.
    #[must_use]
    pub fn run(
        &self,
        series: &PointSeries,
        range_start: Timestamp,
        range_end: Timestamp,
    ) -> Resampled {
        let total = series.len();
        let bucket_ms = pick_bucket_width(range_start, range_end, total, self.target_points);

        if (bucket_ms > MIN_BUCKET || self.aggregate_at_finest) && total > self.target_points {
            let aggregated = aggregate(series, bucket_ms);

            if !aggregated.is_empty() {
                let downsampled = aggregated.len() != total;

                log::debug!(
                    "resampled {total} points into {} buckets of {bucket_ms}ms",
                    aggregated.len()
                );

                return Resampled {
                    points: aggregated,
                    bucket_ms,
                    downsampled,
                    original_points: total,
                };
            }
        }

        log::trace!("passing {total} points through (bucket {bucket_ms}ms)");

        Resampled {
            points: series.clone(),
            bucket_ms,
            downsampled: false,
            original_points: total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Duration;
    use test_log::test;

    fn minute_series(minutes: i64) -> PointSeries {
        (0..minutes)
            .map(|m| Point::new(Duration::minutes(m), (m % 7) as Value))
            .collect()
    }

    #[test]
    fn aggregate_same_bucket() {
        let out = aggregate(&[Point::new(0, 1.0), Point::new(500, 3.0)], 1_000);
        assert_eq!(&[Point::new(0, 2.0)], out.as_slice());
    }

    #[test]
    fn aggregate_reports_earliest_timestamp() {
        let out = aggregate(
            &[
                Point::new(1_700, 4.0),
                Point::new(1_200, 2.0),
                Point::new(3_900, 1.0),
            ],
            1_000,
        );

        assert_eq!(&[Point::new(1_200, 3.0), Point::new(3_900, 1.0)], out.as_slice());
    }

    #[test]
    fn aggregate_drops_non_finite() {
        let out = aggregate(
            &[
                Point::new(0, f64::NAN),
                Point::new(100, 2.0),
                Point::new(1_000, f64::INFINITY),
            ],
            1_000,
        );

        assert_eq!(&[Point::new(100, 2.0)], out.as_slice());
    }

    #[test]
    fn aggregate_near_min_timestamp() {
        let out = aggregate(&[Point::new(Timestamp::MIN, 1.0), Point::new(Timestamp::MIN + 1, 3.0)], 1_000);
        assert_eq!(&[Point::new(Timestamp::MIN, 2.0)], out.as_slice());
    }

    #[test]
    fn aggregate_empty() {
        assert!(aggregate(&[], 60_000).is_empty());
    }

    #[test]
    fn aggregate_before_epoch() {
        let out = aggregate(&[Point::new(-1, 1.0), Point::new(1, 3.0)], 1_000);
        assert_eq!(&[Point::new(-1, 1.0), Point::new(1, 3.0)], out.as_slice());
    }

    #[test]
    fn aggregate_non_positive_width_passes_through() {
        let points = [Point::new(0, 1.0), Point::new(1, 2.0)];
        assert_eq!(&points, aggregate(&points, 0).as_slice());
    }

    #[test]
    fn resample_under_budget_is_identity() {
        let series = minute_series(3_000);
        let resampled = Resampler::new().run(&series, 0, Duration::days(30));

        assert!(!resampled.downsampled);
        assert_eq!(series, resampled.points);
        assert_eq!(3_000, resampled.original_points);
        assert_eq!(Duration::minutes(15), resampled.bucket_ms);
    }

    #[test]
    fn resample_coarse_budget_aggregates() {
        let series = minute_series(1_440);
        let resampled = Resampler::new()
            .target_points(1_000)
            .run(&series, 0, Duration::days(1) - 1);

        // 86.4s raw spacing => 2 minute buckets
        assert_eq!(Duration::minutes(2), resampled.bucket_ms);
        assert!(resampled.downsampled);
        assert_eq!(720, resampled.points.len());
    }

    #[test]
    fn resample_finest_width_stays_raw() {
        let resampled = Resampler::new().run(&minute_series(10_000), 0, Duration::days(1));

        assert_eq!(Duration::minutes(1), resampled.bucket_ms);
        assert!(!resampled.downsampled);
        assert_eq!(10_000, resampled.points.len());
    }

    #[test]
    fn resample_finest_width_when_enabled() {
        let series = (0..Duration::days(1))
            .step_by(Duration::seconds(1) as usize)
            .map(|t| Point::new(t, 1.0))
            .collect::<PointSeries>();

        let resampled = Resampler::new()
            .aggregate_at_finest(true)
            .run(&series, 0, Duration::days(1) - 1);

        assert_eq!(Duration::minutes(1), resampled.bucket_ms);
        assert!(resampled.downsampled);
        assert_eq!(1_440, resampled.points.len());
        assert_eq!(86_400, resampled.original_points);

        // Under budget: still a pass-through
        let resampled = Resampler::new()
            .aggregate_at_finest(true)
            .run(&minute_series(1_440), 0, Duration::days(1) - 1);

        assert!(!resampled.downsampled);
        assert_eq!(1_440, resampled.points.len());
    }

    #[test]
    fn resample_not_marked_when_count_unchanged() {
        // One point per hour, budget smaller than the point count
        let series = (0..100)
            .map(|h| Point::new(Duration::hours(h), 1.0))
            .collect::<PointSeries>();

        let resampled = Resampler::new()
            .target_points(50)
            .run(&series, 0, Duration::hours(100));

        assert_eq!(Duration::hours(2), resampled.bucket_ms);
        assert!(resampled.downsampled);

        // 5 minute buckets, but every hourly sample still lands in its own bucket
        let resampled = Resampler::new()
            .target_points(99)
            .run(&series, 0, Duration::minutes(200));

        assert_eq!(Duration::minutes(5), resampled.bucket_ms);
        assert!(!resampled.downsampled);
        assert_eq!(100, resampled.points.len());
    }
}
