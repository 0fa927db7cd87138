//! Minute magnetometer files.
//!
//! One file per station and UTC day, named `sssDDmmm.YYm` (e.g. `chi05nov.24m`).
//! Data lines start with `DD MM YYYY HH MM` and carry the horizontal (H)
//! component in their seventh field; every other line is header or noise.

use super::{DayFile, Parse, ParseResult};
use crate::{time::from_utc, Error, Point, PointSeries, Result, Timestamp, Value};
use nom::{
    bytes::complete::{take_till1, take_while_m_n},
    character::complete::{space0, space1},
    combinator::map_res,
    sequence::preceded,
};
use std::path::{Path, PathBuf};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A DataMin file identified by its name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataMinFile {
    /// Upper-case station code, e.g. `CHI`
    pub station: String,

    /// Midnight (UTC) of the day the file covers
    pub date: Timestamp,

    /// Location of the file
    pub path: PathBuf,
}

impl DataMinFile {
    /// Decodes station and day from a file name.
    ///
    /// Names are matched case-insensitively; `YY` is a year in the 2000s.
    /// Returns `None` for names that do not follow the scheme or name a day
    /// that does not exist.
    #[must_use]
    pub fn parse_name(name: &str) -> Option<(String, Timestamp)> {
        let caps = static_regex!(r"(?i)^([a-z]{3})(\d{2})([a-z]{3})\.(\d{2})m$").captures(name)?;

        let station = caps.get(1)?.as_str().to_ascii_uppercase();
        let day = caps.get(2)?.as_str().parse::<u32>().ok()?;
        let month_name = caps.get(3)?.as_str().to_ascii_lowercase();
        let year = 2_000 + caps.get(4)?.as_str().parse::<i32>().ok()?;

        let month = MONTHS.iter().position(|&m| m == month_name)?;
        let month = u32::try_from(month + 1).ok()?;

        Some((station, from_utc(year, month, day, 0, 0, 0)?))
    }

    /// Identifies the file at `path` by its file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilename`] if the name does not encode a station and day.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (station, date) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::parse_name)
            .ok_or_else(|| Error::InvalidFilename(path.display().to_string()))?;

        Ok(Self {
            station,
            date,
            path: path.to_path_buf(),
        })
    }

    /// Reads the file's points.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs.
    pub fn read(&self) -> Result<PointSeries> {
        read_datamin_file(&self.path)
    }
}

impl DayFile for DataMinFile {
    fn day(&self) -> Timestamp {
        self.date
    }
}

#[derive(Debug, PartialEq)]
struct DataMinRecord {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    h: Value,
}

fn fixed_digits<'a, T: std::str::FromStr>(
    count: usize,
) -> impl FnMut(&'a str) -> ParseResult<'a, T> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        str::parse::<T>,
    )
}

fn field(input: &str) -> ParseResult<'_, &str> {
    preceded(space1, take_till1(char::is_whitespace))(input)
}

impl<'a> Parse<'a> for DataMinRecord {
    fn parse(input: &'a str) -> ParseResult<'a, Self> {
        let (input, _) = space0(input)?;
        let (input, day) = fixed_digits(2)(input)?;
        let (input, month) = preceded(space1, fixed_digits(2))(input)?;
        let (input, year) = preceded(space1, fixed_digits(4))(input)?;
        let (input, hour) = preceded(space1, fixed_digits(2))(input)?;
        let (input, minute) = preceded(space1, fixed_digits(2))(input)?;

        // NOTE: The sixth field (seconds or day-of-year, depending on the logger) is not used
        let (input, _) = field(input)?;
        let (input, h) = map_res(field, str::parse::<Value>)(input)?;

        Ok((
            input,
            Self {
                year,
                month,
                day,
                hour,
                minute,
                h,
            },
        ))
    }
}

impl DataMinRecord {
    fn into_point(self) -> Option<Point> {
        if !self.h.is_finite() {
            return None;
        }

        let timestamp = from_utc(self.year, self.month, self.day, self.hour, self.minute, 0)?;
        Some(Point::new(timestamp, self.h))
    }
}

/// Parses the contents of a DataMin file.
///
/// Lines that are not data lines, have fewer than seven fields, an invalid
/// date or a non-numeric H value are skipped.
#[must_use]
pub fn parse_datamin(text: &str) -> PointSeries {
    let mut skipped = 0;

    let points = text
        .lines()
        .filter_map(|line| {
            let point = DataMinRecord::parse_line(line).and_then(DataMinRecord::into_point);

            if point.is_none() && !line.trim().is_empty() {
                skipped += 1;
            }

            point
        })
        .collect::<Vec<_>>();

    log::trace!("parsed {} DataMin points, skipped {skipped} lines", points.len());

    PointSeries::new(points)
}

/// Reads a DataMin file.
///
/// A file that does not exist yields an empty series.
///
/// # Errors
///
/// Will return `Err` if an IO error occurs.
pub fn read_datamin_file<P: AsRef<Path>>(path: P) -> Result<PointSeries> {
    let path = path.as_ref();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("DataMin file {} does not exist", path.display());
            return Ok(PointSeries::default());
        }
        Err(e) => return Err(e.into()),
    };

    let series = parse_datamin(&String::from_utf8_lossy(&bytes));
    log::debug!("read {} points from {}", series.len(), path.display());

    Ok(series)
}
