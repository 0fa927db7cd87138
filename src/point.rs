use crate::{Timestamp, Value};

/// A single observation
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// UTC epoch milliseconds
    pub timestamp: Timestamp,

    /// Observed value
    pub value: Value,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(timestamp: Timestamp, value: Value) -> Self {
        Self { timestamp, value }
    }
}

impl From<(Timestamp, Value)> for Point {
    fn from((timestamp, value): (Timestamp, Value)) -> Self {
        Self::new(timestamp, value)
    }
}

/// An ascending, duplicate-free list of points with finite values.
///
/// ```
/// use geomag::{Point, PointSeries};
///
/// let series = PointSeries::new([
///     Point::new(2_000, 2.0),
///     Point::new(1_000, f64::NAN),
///     Point::new(1_000, 1.0),
///     Point::new(2_000, 3.0),
/// ]);
///
/// // NaN is dropped, the later duplicate wins
/// assert_eq!(&[Point::new(1_000, 1.0), Point::new(2_000, 3.0)], series.as_slice());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointSeries(Vec<Point>);

impl PointSeries {
    /// Builds a series from points in any order.
    ///
    /// Non-finite values are discarded. When a timestamp occurs more than once,
    /// the point observed last is kept.
    #[must_use]
    pub fn new<I: IntoIterator<Item = Point>>(points: I) -> Self {
        let mut points = points
            .into_iter()
            .filter(|p| p.value.is_finite())
            .collect::<Vec<_>>();

        // NOTE: Stable sort keeps observation order among equal timestamps
        points.sort_by_key(|p| p.timestamp);

        let mut deduped: Vec<Point> = Vec::with_capacity(points.len());

        for point in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == point.timestamp => *last = point,
                _ => deduped.push(point),
            }
        }

        Self(deduped)
    }

    /// Wraps points that are already sorted, deduplicated and finite.
    pub(crate) fn from_sorted(points: Vec<Point>) -> Self {
        debug_assert!(points.windows(2).all(|w| match w {
            [a, b] => a.timestamp < b.timestamp,
            _ => true,
        }));
        Self(points)
    }

    /// Points as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Point] {
        &self.0
    }

    /// Timestamps of the first and last point.
    #[must_use]
    pub fn range(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.first()?.timestamp, self.last()?.timestamp))
    }

    /// All timestamps, ascending.
    #[must_use]
    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.0.iter().map(|p| p.timestamp).collect()
    }

    /// All values, in time order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.0.iter().map(|p| p.value).collect()
    }

    /// Keeps the points with `start <= timestamp <= end`.
    #[must_use]
    pub fn clip(&self, start: Timestamp, end: Timestamp) -> Self {
        Self(
            self.0
                .iter()
                .filter(|p| p.timestamp >= start && p.timestamp <= end)
                .copied()
                .collect(),
        )
    }

    /// Combines two series; points of `other` win on equal timestamps.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self::new(self.0.into_iter().chain(other.0))
    }

    /// Unwraps the points.
    #[must_use]
    pub fn into_inner(self) -> Vec<Point> {
        self.0
    }
}

impl FromIterator<Point> for PointSeries {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl IntoIterator for PointSeries {
    type Item = Point;
    type IntoIter = std::vec::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PointSeries {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Deref for PointSeries {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn series_sorts_and_filters() {
        let series = PointSeries::new([
            Point::new(3, 3.0),
            Point::new(1, f64::INFINITY),
            Point::new(2, 2.0),
            Point::new(1, 1.0),
        ]);

        assert_eq!(vec![1, 2, 3], series.timestamps());
        assert_eq!(vec![1.0, 2.0, 3.0], series.values());
        assert_eq!(Some((1, 3)), series.range());
    }

    #[test]
    fn series_last_write_wins() {
        let series = PointSeries::new([
            Point::new(5, 1.0),
            Point::new(5, 2.0),
            Point::new(4, 0.0),
            Point::new(5, 3.0),
        ]);

        assert_eq!(&[Point::new(4, 0.0), Point::new(5, 3.0)], series.as_slice());
    }

    #[test]
    fn series_clip_is_inclusive() {
        let series = (0..10).map(|t| Point::new(t, 0.0)).collect::<PointSeries>();

        assert_eq!(vec![2, 3, 4], series.clip(2, 4).timestamps());
        assert!(series.clip(20, 30).is_empty());
    }

    #[test]
    fn series_merge_prefers_other() {
        let a = PointSeries::new([Point::new(1, 1.0), Point::new(2, 1.0)]);
        let b = PointSeries::new([Point::new(2, 2.0), Point::new(3, 2.0)]);

        assert_eq!(vec![1.0, 2.0, 2.0], a.merge(b).values());
    }

    #[test]
    fn series_empty() {
        let series = PointSeries::default();

        assert!(series.is_empty());
        assert_eq!(None, series.range());
    }
}
