use super::{Aggregation, Bucket};
use crate::Value;

/// Arithmetic mean of the bucket's values
#[derive(Clone)]
pub struct Avg;

impl Aggregation for Avg {
    #[allow(clippy::cast_precision_loss)]
    fn finish(bucket: &Bucket) -> Value {
        bucket.value / bucket.len as Value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resample::aggregate_with, Point};
    use test_log::test;

    #[test]
    fn avg_known_values() {
        // 3 buckets of 4 points each, values known per bucket
        let points = [
            (0, [1.0, 2.0, 3.0, 6.0]),
            (1_000, [10.0, 10.0, 10.0, 10.0]),
            (2_000, [-4.0, 4.0, -2.0, 2.0]),
        ]
        .into_iter()
        .flat_map(|(start, values)| {
            values
                .into_iter()
                .enumerate()
                .map(move |(idx, v)| Point::new(start + 100 + idx as i64 * 200, v))
        })
        .collect::<Vec<_>>();

        let buckets = aggregate_with::<Avg>(&points, 1_000);

        assert_eq!(
            &[
                Point::new(100, 3.0),
                Point::new(1_100, 10.0),
                Point::new(2_100, 0.0)
            ],
            buckets.as_slice()
        );
    }
}
