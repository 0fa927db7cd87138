use crate::{Duration, Timestamp};

/// Bucket widths the resampler may choose from, ascending.
pub const LADDER: [Timestamp; 16] = [
    Duration::minutes(1),
    Duration::minutes(2),
    Duration::minutes(5),
    Duration::minutes(10),
    Duration::minutes(15),
    Duration::minutes(30),
    Duration::hours(1),
    Duration::hours(2),
    Duration::hours(3),
    Duration::hours(6),
    Duration::hours(12),
    Duration::days(1),
    Duration::days(2),
    Duration::days(7),
    Duration::days(14),
    Duration::days(30),
];

/// Finest bucket width, also used for degenerate ranges.
pub const MIN_BUCKET: Timestamp = Duration::minutes(1);

/// Coarsest bucket width.
pub const MAX_BUCKET: Timestamp = Duration::days(30);

/// Picks the narrowest ladder width that spreads `[range_start, range_end]`
/// over at most `target_points` buckets.
///
/// An empty or inverted range, or `total_points == 0`, yields [`MIN_BUCKET`].
/// A range too wide for the ladder yields [`MAX_BUCKET`].
#[must_use]
pub fn pick_bucket_width(
    range_start: Timestamp,
    range_end: Timestamp,
    total_points: usize,
    target_points: usize,
) -> Timestamp {
    if range_end <= range_start || total_points == 0 {
        return MIN_BUCKET;
    }

    if target_points == 0 {
        return MAX_BUCKET;
    }

    let span = range_end.saturating_sub(range_start);
    let target = Timestamp::try_from(target_points).unwrap_or(Timestamp::MAX);
    let raw_spacing = (span / target).max(MIN_BUCKET);

    LADDER
        .iter()
        .copied()
        .find(|&width| raw_spacing <= width)
        .unwrap_or(MAX_BUCKET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn ladder_is_ascending() {
        assert!(LADDER.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Some(&MIN_BUCKET), LADDER.first());
        assert_eq!(Some(&MAX_BUCKET), LADDER.last());
    }

    #[test]
    fn degenerate_inputs_use_finest_width() {
        assert_eq!(MIN_BUCKET, pick_bucket_width(10, 10, 100, 4_000));
        assert_eq!(MIN_BUCKET, pick_bucket_width(10, 5, 100, 4_000));
        assert_eq!(MIN_BUCKET, pick_bucket_width(0, Duration::days(365), 0, 4_000));
    }

    #[test]
    fn one_day_fits_finest_width() {
        // 86_400_000 / 4000 = 21.6s, below one minute
        assert_eq!(
            Duration::minutes(1),
            pick_bucket_width(0, Duration::days(1), 10_000, 4_000)
        );
    }

    #[test]
    fn rounds_up_to_next_rung() {
        // 7d / 4000 = 151.2s
        assert_eq!(
            Duration::minutes(5),
            pick_bucket_width(0, Duration::weeks(1), 10_080, 4_000)
        );

        // 30d / 4000 = 648s
        assert_eq!(
            Duration::minutes(15),
            pick_bucket_width(0, Duration::days(30), 43_200, 4_000)
        );

        // exact rung
        assert_eq!(
            Duration::hours(1),
            pick_bucket_width(0, Duration::hours(100), 6_000, 100)
        );
    }

    #[test]
    fn huge_span_uses_coarsest_width() {
        assert_eq!(
            MAX_BUCKET,
            pick_bucket_width(0, Duration::days(365 * 50), 1, 10)
        );
        assert_eq!(MAX_BUCKET, pick_bucket_width(0, Duration::days(1), 1, 0));
    }

    #[test]
    fn width_always_on_ladder_and_monotonic_in_target() {
        for span_days in [1, 3, 10, 90, 400, 4_000] {
            let end = Duration::days(span_days);
            let mut previous = Timestamp::MAX;

            for target in [1, 10, 100, 500, 1_000, 4_000, 10_000, 1_000_000] {
                let width = pick_bucket_width(0, end, 1, target);
                assert!(LADDER.contains(&width));
                assert!(width <= previous, "{span_days}d target={target}");
                previous = width;
            }
        }
    }
}
