//! Parsers turning instrument files and index feeds into [`PointSeries`](crate::PointSeries).
//!
//! Every parser is line-tolerant: a malformed line is skipped, it never fails
//! the whole input. Only reading a file can return an error.

// NOTE: Defined before the submodules so they can use it
/// Compiles a regex literal once.
macro_rules! static_regex {
    ($re:literal $(,)?) => {{
        #[allow(clippy::expect_used)]
        fn compiled() -> &'static regex::Regex {
            static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            RE.get_or_init(|| regex::Regex::new($re).expect("regex literal should compile"))
        }

        compiled()
    }};
}

pub mod datamin;
pub mod dst;
pub mod efm;
pub mod feed;
pub mod kp;

use crate::{
    time::{end_of_day, start_of_day},
    Timestamp,
};
use nom::IResult;

pub(crate) type ParseResult<'a, T> = IResult<&'a str, T>;

/// Implement the parse function to more easily convert one input line into a record
pub(crate) trait Parse<'a>: Sized {
    /// Parse the given input into self
    fn parse(input: &'a str) -> ParseResult<'a, Self>;

    /// Parses a whole line, ignoring whatever follows the record.
    fn parse_line(input: &'a str) -> Option<Self> {
        Self::parse(input).ok().map(|(_, record)| record)
    }
}

/// A file that holds the samples of exactly one UTC day.
pub trait DayFile {
    /// Midnight (UTC) of the day the file covers.
    fn day(&self) -> Timestamp;
}

/// Files whose day overlaps `[start, end]`, widened to whole UTC days.
///
/// Keeps the input order.
#[must_use]
pub fn select_days<F: DayFile>(files: &[F], start: Timestamp, end: Timestamp) -> Vec<&F> {
    let start = start_of_day(start);
    let end = end_of_day(end);

    files
        .iter()
        .filter(|file| end_of_day(file.day()) >= start && start_of_day(file.day()) <= end)
        .collect()
}

/// First and last millisecond covered by a set of day files.
///
/// `None` if there are no files.
#[must_use]
pub fn available_range<F: DayFile>(files: &[F]) -> Option<(Timestamp, Timestamp)> {
    let first = files.iter().map(DayFile::day).min()?;
    let last = files.iter().map(DayFile::day).max()?;
    Some((start_of_day(first), end_of_day(last)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{time::from_utc, Duration};
    use test_log::test;

    struct Day(Timestamp);

    impl DayFile for Day {
        fn day(&self) -> Timestamp {
            self.0
        }
    }

    fn day(d: u32) -> Day {
        Day(from_utc(2024, 11, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn select_overlapping_days() {
        let files = [day(1), day(2), day(3), day(4)];

        // Mid-day bounds still select whole days
        let start = day(2).0 + Duration::hours(13);
        let end = day(3).0 + Duration::hours(1);

        let selected = select_days(&files, start, end)
            .into_iter()
            .map(DayFile::day)
            .collect::<Vec<_>>();

        assert_eq!(vec![day(2).0, day(3).0], selected);
        assert!(select_days(&files, day(10).0, day(12).0).is_empty());
    }

    #[test]
    fn select_open_ended_range() {
        let files = [day(1), day(2), Day(0), Day(-Duration::days(1))];

        assert_eq!(4, select_days(&files, Timestamp::MIN, Timestamp::MAX).len());
        assert_eq!(3, select_days(&files, 0, Timestamp::MAX).len());
        assert_eq!(2, select_days(&files, Timestamp::MIN, 0).len());
    }

    #[test]
    fn range_of_files() {
        let files = [day(3), day(1), day(2)];

        assert_eq!(
            Some((day(1).0, day(4).0 - 1)),
            available_range(&files),
        );
        assert_eq!(None, available_range::<Day>(&[]));
    }
}
