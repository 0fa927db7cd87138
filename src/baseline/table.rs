use super::daily_bucket_key;
use crate::{gaps::ChartPoint, time::parse_iso, PointSeries, Timestamp, Value};

/// Typical value per time-of-day bucket, sorted by bucket key.
///
/// Built by [`BaselineBuilder`](super::BaselineBuilder); immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct BaselineTable {
    pub(super) bucket_size_ms: Timestamp,
    pub(super) rows: Vec<(Timestamp, Value)>,
    pub(super) fallback: Option<Value>,
}

impl BaselineTable {
    /// Bucket keys and their typical value, ascending by key.
    #[must_use]
    pub fn rows(&self) -> &[(Timestamp, Value)] {
        &self.rows
    }

    /// Number of buckets with a typical value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no bucket has a typical value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value used when the table has no rows at all.
    #[must_use]
    pub fn fallback(&self) -> Option<Value> {
        self.fallback
    }

    /// Width of the time-of-day buckets.
    #[must_use]
    pub fn bucket_size_ms(&self) -> Timestamp {
        self.bucket_size_ms
    }

    /// Baseline for an arbitrary instant.
    #[must_use]
    pub fn value_at(&self, ts: Timestamp) -> Option<Value> {
        self.resolve(daily_bucket_key(ts, self.bucket_size_ms))
            .filter(|v| v.is_finite())
    }

    /// Baseline for a time-of-day bucket key.
    ///
    /// Keys outside the table are clamped to the nearest row; keys between two
    /// rows are interpolated linearly.
    #[must_use]
    pub fn resolve(&self, key: Timestamp) -> Option<Value> {
        let (Some(&(first_key, first_value)), Some(&(last_key, last_value))) =
            (self.rows.first(), self.rows.last())
        else {
            return self.fallback;
        };

        if self.rows.len() == 1 || key <= first_key {
            return Some(first_value);
        }

        if key >= last_key {
            return Some(last_value);
        }

        match self.rows.binary_search_by_key(&key, |&(k, _)| k) {
            Ok(idx) => self.rows.get(idx).map(|&(_, value)| value),
            Err(upper_idx) => {
                // NOTE: key > first_key, so upper_idx >= 1
                let lower = self.rows.get(upper_idx.checked_sub(1)?)?;
                let upper = self.rows.get(upper_idx)?;
                self.interpolate(*lower, *upper, key)
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn interpolate(
        &self,
        (lower_key, lower_value): (Timestamp, Value),
        (upper_key, upper_value): (Timestamp, Value),
        key: Timestamp,
    ) -> Option<Value> {
        match (lower_value.is_finite(), upper_value.is_finite()) {
            (false, false) => return self.fallback,
            (false, true) => return Some(upper_value),
            (true, false) => return Some(lower_value),
            (true, true) => {}
        }

        let span = upper_key - lower_key;

        if span <= 0 {
            return Some(lower_value);
        }

        let ratio = (key - lower_key) as Value / span as Value;
        Some((upper_value - lower_value).mul_add(ratio, lower_value))
    }

    /// Baseline series for the given instants, one entry per target.
    #[must_use]
    pub fn series(&self, targets: &[Timestamp]) -> Vec<ChartPoint> {
        targets.iter().map(|&ts| (ts, self.value_at(ts))).collect()
    }

    /// Baseline series for ISO-8601 labels.
    ///
    /// Labels that do not parse are dropped from the output.
    #[must_use]
    pub fn series_from_labels<S: AsRef<str>>(&self, labels: &[S]) -> Vec<ChartPoint> {
        labels
            .iter()
            .filter_map(|label| parse_iso(label.as_ref()))
            .map(|ts| (ts, self.value_at(ts)))
            .collect()
    }

    /// Deviation of each point from its baseline (e.g. ΔH).
    ///
    /// Points without a baseline get `None`.
    #[must_use]
    pub fn deviation(&self, series: &PointSeries) -> Vec<ChartPoint> {
        series
            .iter()
            .map(|p| (p.timestamp, self.value_at(p.timestamp).map(|b| p.value - b)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn table(rows: &[(Timestamp, Value)]) -> BaselineTable {
        BaselineTable {
            bucket_size_ms: 60_000,
            rows: rows.to_vec(),
            fallback: Some(42.0),
        }
    }

    #[test]
    fn resolve_exact() {
        let table = table(&[(0, 1.0), (60_000, 2.0), (120_000, 3.0)]);
        assert_eq!(Some(2.0), table.resolve(60_000));
    }

    #[test]
    fn resolve_empty_uses_fallback() {
        assert_eq!(Some(42.0), table(&[]).resolve(0));
    }

    #[test]
    fn resolve_single_row() {
        let table = table(&[(60_000, 7.0)]);
        assert_eq!(Some(7.0), table.resolve(0));
        assert_eq!(Some(7.0), table.resolve(3_600_000));
    }

    #[test]
    fn resolve_clamps() {
        let table = table(&[(60_000, 1.0), (120_000, 3.0)]);
        assert_eq!(Some(1.0), table.resolve(0));
        assert_eq!(Some(3.0), table.resolve(180_000));
    }

    #[test]
    fn resolve_interpolates() {
        let table = table(&[(0, 0.0), (120_000, 10.0), (240_000, 20.0), (600_000, 0.0)]);
        assert_eq!(Some(5.0), table.resolve(60_000));
        assert_eq!(Some(15.0), table.resolve(180_000));
        assert_eq!(Some(10.0), table.resolve(420_000));
    }

    #[test]
    fn interpolate_with_non_finite_side() {
        let table = table(&[(0, f64::NAN), (100, 4.0), (200, f64::NAN)]);
        assert_eq!(Some(4.0), table.resolve(50));
        assert_eq!(Some(4.0), table.resolve(150));

        let table = self::table(&[(0, 1.0), (100, f64::NAN), (200, f64::NAN), (300, 1.0)]);
        assert_eq!(Some(42.0), table.resolve(150));
    }

    #[test]
    fn value_at_uses_time_of_day() {
        let table = table(&[(0, 0.0), (120_000, 10.0)]);
        let day = crate::time::DAY_MS;

        assert_eq!(Some(5.0), table.value_at(10 * day + 60_000));
        assert_eq!(Some(5.0), table.value_at(-day + 60_000));
    }
}
