use crate::Timestamp;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::pair,
    IResult,
};

/// Helpers for calculating durations
///
/// ```
/// use geomag::Duration;
///
/// assert_eq!(Duration::minutes(90), Duration::hours(1) + Duration::minutes(30));
///
/// assert_eq!(Some(90_000.0), Duration::parse("1.5m"));
/// assert_eq!(None, Duration::parse("90 seconds"));
///
/// assert_eq!("6h", Duration::format(Duration::hours(6)));
/// assert_eq!("90s", Duration::format(Duration::seconds(90)));
/// ```
pub struct Duration;

impl Duration {
    /// Formats N weeks as millisecond time frame.
    #[must_use]
    pub const fn weeks(n: i64) -> Timestamp {
        Self::days(n) * 7
    }

    /// Formats N days as millisecond time frame.
    #[must_use]
    pub const fn days(n: i64) -> Timestamp {
        Self::hours(n) * 24
    }

    /// Formats N hours as millisecond time frame.
    #[must_use]
    pub const fn hours(n: i64) -> Timestamp {
        Self::minutes(n) * 60
    }

    /// Formats N minutes as millisecond time frame.
    #[must_use]
    pub const fn minutes(n: i64) -> Timestamp {
        Self::seconds(n) * 60
    }

    /// Formats N seconds as millisecond time frame.
    #[must_use]
    pub const fn seconds(n: i64) -> Timestamp {
        Self::millis(n) * 1_000
    }

    /// Formats N milliseconds as millisecond time frame.
    #[must_use]
    pub const fn millis(n: i64) -> Timestamp {
        n
    }

    /// Parses `<number><unit>` into milliseconds.
    ///
    /// The unit is one of `ms`, `s`, `m`, `h`, `d` (any case), the number is a plain
    /// decimal without sign or exponent. Surrounding whitespace is ignored; anything
    /// else makes the whole input invalid.
    #[must_use]
    pub fn parse(text: &str) -> Option<f64> {
        let (_, (n, unit_ms)) = all_consuming(pair(number, unit))(text.trim()).ok()?;
        let ms = n * unit_ms;
        ms.is_finite().then_some(ms)
    }

    /// Formats a millisecond duration with the largest unit that divides it exactly.
    ///
    /// The duration is first rounded to whole seconds (at least one).
    #[must_use]
    pub fn format(ms: Timestamp) -> String {
        let secs = (ms.saturating_add(500)).div_euclid(1_000).max(1);

        if secs % 86_400 == 0 {
            format!("{}d", secs / 86_400)
        } else if secs % 3_600 == 0 {
            format!("{}h", secs / 3_600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{secs}s")
        }
    }
}

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit1)))),
        str::parse::<f64>,
    )(input)
}

#[allow(clippy::cast_precision_loss)]
fn unit(input: &str) -> IResult<&str, f64> {
    // NOTE: "ms" has to be tried before "m"
    let (input, unit) = alt((
        tag_no_case("ms"),
        tag_no_case("s"),
        tag_no_case("m"),
        tag_no_case("h"),
        tag_no_case("d"),
    ))(input)?;

    let ms = match unit.to_ascii_lowercase().as_str() {
        "ms" => Duration::millis(1),
        "s" => Duration::seconds(1),
        "m" => Duration::minutes(1),
        "h" => Duration::hours(1),
        _ => Duration::days(1),
    };

    Ok((input, ms as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn parse_units() {
        assert_eq!(Some(250.0), Duration::parse("250ms"));
        assert_eq!(Some(30_000.0), Duration::parse("30s"));
        assert_eq!(Some(300_000.0), Duration::parse("5m"));
        assert_eq!(Some(7_200_000.0), Duration::parse("2H"));
        assert_eq!(Some(86_400_000.0), Duration::parse("1d"));
        assert_eq!(Some(500.0), Duration::parse(" 0.5s "));
        assert_eq!(Some(1.0), Duration::parse("1MS"));
    }

    #[test]
    fn parse_rejects_partial_input() {
        for text in [
            "", "   ", "m", "5", "-1s", "+1s", "1e3ms", "5 minutes", "5m30s", "1.s", ".5s", "5w",
            "5 m",
        ] {
            assert_eq!(None, Duration::parse(text), "{text:?} should not parse");
        }
    }

    #[test]
    fn format_prefers_largest_exact_unit() {
        assert_eq!("1m", Duration::format(Duration::minutes(1)));
        assert_eq!("30m", Duration::format(Duration::minutes(30)));
        assert_eq!("3h", Duration::format(Duration::hours(3)));
        assert_eq!("1d", Duration::format(Duration::days(1)));
        assert_eq!("14d", Duration::format(Duration::weeks(2)));
        assert_eq!("90s", Duration::format(Duration::seconds(90)));
    }

    #[test]
    fn format_rounds_to_seconds() {
        assert_eq!("1s", Duration::format(0));
        assert_eq!("1s", Duration::format(400));
        assert_eq!("2s", Duration::format(1_500));
        assert_eq!("1m", Duration::format(59_600));
    }
}
