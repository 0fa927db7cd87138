//! Hourly Dst index from Kyoto WDC style text, HTML pages or JSON bodies.
//!
//! Supported rows:
//!
//! - `timestamp,value` (CSV)
//! - `DSTyymm*dd ...` Kyoto records: 24 hourly values, optionally framed by a
//!   base value and a daily mean
//! - `YYYY MM DD HH V` (one hour per row)
//! - `YYYY MM DD` followed by 24 hourly values
//! - `DD` followed by 24 hourly values, in the current month context
//! - 24 bare values, for the day after the previous row
//! - `YYYY MM`, which sets the month context
//!
//! Anything else is skipped.

use super::feed::FeedShape;
use crate::{
    time::{day_number, from_utc, parse_iso, HOUR_MS},
    Point, PointSeries, Timestamp, Value,
};
use chrono::{DateTime, Datelike, Utc};
use logos::Logos;
use std::borrow::Cow;

/// Values at or beyond this magnitude mark missing data.
pub const SENTINEL: Value = 9_999.0;

/// At most one value per hour is kept per UTC day.
pub const MAX_POINTS_PER_DAY: usize = 24;

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token<'a> {
    // NOTE: A sign always starts a new number, so "-10-20" is two tokens
    #[regex(r"[+-]?[0-9]+(\.[0-9]+)?", |lex| lex.slice())]
    Number(&'a str),
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Field<'a> {
    text: &'a str,
    value: Value,
}

impl Field<'_> {
    fn is_integer(&self, max_digits: usize) -> bool {
        (1..=max_digits).contains(&self.text.len()) && self.text.bytes().all(|b| b.is_ascii_digit())
    }

    fn as_u32(&self) -> Option<u32> {
        self.text.parse().ok()
    }
}

/// Leading numeric fields of `text`, and whether nothing else follows them.
fn numeric_fields(text: &str) -> (Vec<Field<'_>>, bool) {
    let mut fields = vec![];

    for token in Token::lexer(text) {
        let Ok(Token::Number(text)) = token else {
            return (fields, false);
        };

        let Ok(value) = text.parse() else {
            return (fields, false);
        };

        fields.push(Field { text, value });
    }

    (fields, true)
}

/// Every integer in `text`, ignoring whatever is between them.
fn all_integers(text: &str) -> Vec<Value> {
    static_regex!(r"-?\d+")
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

fn is_missing(value: Value) -> bool {
    !value.is_finite() || value.abs() >= SENTINEL
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct YearMonth {
    year: i32,
    month: u32,
}

/// Guesses the month a listing covers: a `YYYY MM` pair, else a year followed
/// by a month name, else the month of `now`.
fn infer_year_month(text: &str, now: Timestamp) -> YearMonth {
    if let Some(caps) = static_regex!(r"\b((?:19|20)\d{2})\s+([01]?\d)\b").captures(text) {
        let year = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let month = caps.get(2).and_then(|m| m.as_str().parse().ok());

        if let (Some(year), Some(month @ 1..=12)) = (year, month) {
            return YearMonth { year, month };
        }
    }

    if let Some(caps) = static_regex!(
        r"(?is)\b((?:19|20)\d{2})\b.{0,40}\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\b"
    )
    .captures(text)
    {
        const NAMES: [&str; 12] = [
            "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
        ];

        let year = caps.get(1).and_then(|m| m.as_str().parse().ok());
        let month = caps.get(2).and_then(|m| {
            let name = m.as_str().to_ascii_lowercase();
            NAMES.iter().position(|&n| n == name)
        });

        if let (Some(year), Some(month)) = (year, month.and_then(|m| u32::try_from(m + 1).ok())) {
            return YearMonth { year, month };
        }
    }

    let now = DateTime::<Utc>::from_timestamp_millis(now).unwrap_or_default();

    YearMonth {
        year: now.year(),
        month: now.month(),
    }
}

/// Line-by-line state of a text listing
struct DstParser {
    context: YearMonth,
    last_day: u32,
    points: Vec<Point>,
}

impl DstParser {
    fn push(&mut self, timestamp: Option<Timestamp>, value: Value) {
        if let Some(timestamp) = timestamp {
            if !is_missing(value) {
                self.points.push(Point::new(timestamp, value));
            }
        }
    }

    /// Stores hourly values of one day; value `h` lands at `h + first_hour` o'clock.
    fn push_day<'a, I: IntoIterator<Item = &'a Value>>(
        &mut self,
        date: (i32, u32, u32),
        values: I,
        first_hour: i64,
    ) {
        let (year, month, day) = date;
        let midnight = from_utc(year, month, day, 0, 0, 0);

        for (hour, &value) in (first_hour..).zip(values.into_iter().take(24)) {
            self.push(midnight.map(|m| m + hour * HOUR_MS), value);
        }

        self.last_day = day;
    }

    fn line(&mut self, raw: &str) {
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            return;
        }

        if line.contains(',') && !static_regex!(r"\s,\s").is_match(line) {
            self.csv(line);
            return;
        }

        if self.kyoto(line) || self.hourly_row(line) {
            return;
        }

        self.daily_row(line);
    }

    fn csv(&mut self, line: &str) {
        let mut parts = line.split(',');

        let timestamp = parts.next().and_then(|t| parse_iso(t.trim()));
        let value = parts.next().and_then(|v| v.trim().parse::<Value>().ok());

        if let Some(value) = value {
            self.push(timestamp, value);
        }
    }

    /// `DSTyymm*dd` records; hour slot `h` (0-based) is the hour ending at `h + 1` o'clock.
    fn kyoto(&mut self, line: &str) -> bool {
        let caps = static_regex!(r"(?i)^DST\s*(\d{2})(\d{2})\*(\d{2})\s*[A-Z]{3}\s*\d{3}\s+(.+)$")
            .captures(line)
            .or_else(|| {
                static_regex!(r"(?i)^DST\s*(\d{2})(\d{2})\*(\d{2})\s*[A-Z0-9\s]{2,10}\s+(.+)$")
                    .captures(line)
            });

        let Some(caps) = caps else {
            return false;
        };

        let number = |idx| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

        let (Some(yy), Some(month), Some(day)) = (number(1), number(2), number(3)) else {
            return false;
        };

        let century = if yy >= 70 { 1_900 } else { 2_000 };
        let year = century + i32::try_from(yy).unwrap_or_default();
        let tail = caps.get(4).map_or("", |m| m.as_str());

        let (fields, _) = numeric_fields(tail);
        let values = fields.iter().map(|f| f.value).collect::<Vec<_>>();

        let hours = match values.len() {
            // base value, 24 hours, daily mean
            26.. => values.get(1..25),
            24 | 25 => values.get(..24),
            _ => None,
        };

        let fallback;

        let hours = match hours {
            Some(hours) => hours,
            None => {
                fallback = all_integers(tail);
                fallback
                    .len()
                    .checked_sub(24)
                    .and_then(|start| fallback.get(start..))
                    .unwrap_or_default()
            }
        };

        self.push_day((year, month, day), hours, 1);

        true
    }

    /// `YYYY MM DD HH V`
    fn hourly_row(&mut self, line: &str) -> bool {
        if !static_regex!(r"^\d{4}\s+\d{1,2}\s+\d{1,2}\s+\d{1,2}\b").is_match(line) {
            return false;
        }

        let parts = line.split_whitespace().collect::<Vec<_>>();

        // NOTE: A date followed by 24 values is a daily row
        if parts.len() >= 27 {
            return false;
        }

        let [year, month, day, hour, value, ..] = parts.as_slice() else {
            return false;
        };

        let (Ok(year), Ok(month), Ok(day), Ok(hour), Ok(value)) = (
            year.parse::<i32>(),
            month.parse::<u32>(),
            day.parse::<u32>(),
            hour.parse::<u32>(),
            value.parse::<Value>(),
        ) else {
            return false;
        };

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || is_missing(value) {
            return false;
        }

        self.push(from_utc(year, month, day, hour, 0, 0), value);

        true
    }

    fn daily_row(&mut self, line: &str) {
        let (fields, clean) = numeric_fields(line);
        let values = fields.iter().map(|f| f.value).collect::<Vec<_>>();

        let valid_month = |m: Option<u32>| m.filter(|m| (1..=12).contains(m));
        let valid_day = |d: Option<u32>| d.filter(|d| (1..=31).contains(d));

        match fields.as_slice() {
            // YYYY MM DD + 24 values
            [year, month, day, ..] if fields.len() >= 27 && year.is_integer(4) => {
                if let (Some(year), Some(month), Some(day)) = (
                    year.as_u32().and_then(|y| i32::try_from(y).ok()),
                    valid_month(month.as_u32()),
                    valid_day(day.as_u32()),
                ) {
                    self.push_day((year, month, day), values.get(3..).unwrap_or_default(), 0);
                    return;
                }
            }

            // DD + 24 values
            [day, ..] if fields.len() >= 25 && day.is_integer(2) => {
                if let Some(day) = valid_day(day.as_u32()) {
                    let YearMonth { year, month } = self.context;
                    self.push_day((year, month, day), values.get(1..).unwrap_or_default(), 0);
                    return;
                }
            }

            _ => {}
        }

        if fields.len() == 24 && clean {
            let day = self.last_day + 1;
            let YearMonth { year, month } = self.context;
            self.push_day((year, month, day), &values, 0);
            return;
        }

        if let [year, month, ..] = fields.as_slice() {
            if year.is_integer(4) && month.is_integer(2) {
                if let (Some(year), Some(month)) = (
                    year.as_u32().and_then(|y| i32::try_from(y).ok()),
                    valid_month(month.as_u32()),
                ) {
                    self.context = YearMonth { year, month };
                }
            }
        }
    }
}

/// Parses a plain text listing.
///
/// The result is [sanitized](sanitize) against `now`.
#[must_use]
pub fn parse_dst_text(text: &str, now: Timestamp) -> PointSeries {
    let mut parser = DstParser {
        context: infer_year_month(text, now),
        last_day: 0,
        points: vec![],
    };

    for line in text.lines() {
        let line = line.replace(|c| matches!(c, '\t' | ';' | '\u{a0}'), " ");
        parser.line(&line);
    }

    if parser.points.is_empty() {
        log::debug!(
            "no Dst values in listing, first lines: {:?}",
            text.lines().take(20).collect::<Vec<_>>()
        );
    }

    sanitize(parser.points, now)
}

/// Text of an HTML page: the first `<pre>` block, else the page without tags.
#[must_use]
pub fn html_to_text(html: &str) -> Cow<'_, str> {
    if let Some(pre) = static_regex!(r"(?is)<pre[^>]*>(.*?)</pre>")
        .captures(html)
        .and_then(|caps| caps.get(1))
    {
        return Cow::Borrowed(pre.as_str());
    }

    let text = static_regex!(r"(?i)</(p|div|br|tr|li|h\d)>").replace_all(html, "\n");
    let text = static_regex!(r"<[^>]+>").replace_all(&text, " ");

    Cow::Owned(text.replace("&nbsp;", " "))
}

/// Parses a response body, detecting JSON, HTML or plain text.
///
/// A JSON body without usable samples is retried as text.
#[must_use]
pub fn parse_dst_body(body: &str, now: Timestamp) -> PointSeries {
    let trimmed = body.trim_start();

    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        match FeedShape::decode(trimmed) {
            Ok(shape) => {
                let points = shape
                    .into_samples()
                    .into_iter()
                    .map(|s| Point::new(s.timestamp, s.value))
                    .collect::<Vec<_>>();

                if !points.is_empty() {
                    return sanitize(points, now);
                }
            }
            Err(e) => log::debug!("Dst body is not a known JSON feed: {e}"),
        }
    }

    if trimmed.starts_with('<') {
        return parse_dst_text(&html_to_text(trimmed), now);
    }

    parse_dst_text(body, now)
}

/// Cleans a Dst series for display.
///
/// Drops missing values and points after `now`, keeps the first of several
/// points with the same timestamp, then keeps only the latest 24 points of
/// each UTC day.
#[must_use]
pub fn sanitize<I: IntoIterator<Item = Point>>(points: I, now: Timestamp) -> PointSeries {
    let mut points = points
        .into_iter()
        .filter(|p| !is_missing(p.value) && p.timestamp <= now)
        .collect::<Vec<_>>();

    points.sort_by_key(|p| p.timestamp);
    points.dedup_by_key(|p| p.timestamp);

    let limited = points
        .chunk_by(|a, b| day_number(a.timestamp) == day_number(b.timestamp))
        .flat_map(|day| {
            let skip = day.len().saturating_sub(MAX_POINTS_PER_DAY);
            day.iter().skip(skip).copied()
        })
        .collect::<Vec<_>>();

    PointSeries::from_sorted(limited)
}
