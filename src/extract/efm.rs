//! Electric field mill files.
//!
//! One file per UTC day, named `cinc_efm-MMDDYYYY.efm`, with lines of the form
//! `H:MM[:SS],value[,station]`.
//!
//! Mills sample once per second, so a day of data exceeds the chart budget even
//! at the finest bucket width. Resample with [`EfmReader::resampler`], which
//! also aggregates into one-minute buckets.

use super::{DayFile, Parse, ParseResult};
use chrono::{NaiveTime, Timelike};
use crate::{
    time::{from_utc, start_of_day},
    Error, Point, PointSeries, Resampler, Result, Timestamp, Value,
};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map_res, opt},
    sequence::preceded,
};
use std::{
    cmp::Ordering,
    collections::BTreeSet,
    path::{Path, PathBuf},
};

/// An EFM file identified by its name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EfmFile {
    /// Midnight (UTC) of the day the file covers
    pub date: Timestamp,

    /// Location of the file
    pub path: PathBuf,
}

impl EfmFile {
    /// Decodes the day from a file name such as `cinc_efm-11052024.efm`.
    #[must_use]
    pub fn parse_name(name: &str) -> Option<Timestamp> {
        let caps = static_regex!(r"(?i)^cinc_efm-(\d{2})(\d{2})(\d{4})\.efm$").captures(name)?;

        let month = caps.get(1)?.as_str().parse().ok()?;
        let day = caps.get(2)?.as_str().parse().ok()?;
        let year = caps.get(3)?.as_str().parse().ok()?;

        from_utc(year, month, day, 0, 0, 0)
    }

    /// Identifies the file at `path` by its file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilename`] if the name does not encode a day.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let date = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::parse_name)
            .ok_or_else(|| Error::InvalidFilename(path.display().to_string()))?;

        Ok(Self {
            date,
            path: path.to_path_buf(),
        })
    }
}

impl DayFile for EfmFile {
    fn day(&self) -> Timestamp {
        self.date
    }
}

/// Time of day of an EFM line
#[derive(Debug, PartialEq, Eq)]
struct EfmTime {
    hour: u32,
    minute: u32,
    second: u32,
}

fn digits<'a>(min: usize, max: usize) -> impl FnMut(&'a str) -> ParseResult<'a, u32> {
    map_res(
        take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
        str::parse::<u32>,
    )
}

impl<'a> Parse<'a> for EfmTime {
    fn parse(input: &'a str) -> ParseResult<'a, Self> {
        let (input, hour) = digits(1, 2)(input)?;
        let (input, minute) = preceded(char(':'), digits(2, 2))(input)?;
        let (input, second) = opt(preceded(char(':'), digits(2, 2)))(input)?;

        Ok((
            input,
            Self {
                hour,
                minute,
                second: second.unwrap_or_default(),
            },
        ))
    }
}

/// Samples of one or more EFM files
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EfmRecords {
    /// Samples that passed the station filter
    pub series: PointSeries,

    /// Every station id seen, in numeric-aware order
    pub stations: Vec<String>,

    /// Station ids of the samples in `series`, in numeric-aware order
    pub matched_stations: Vec<String>,
}

impl EfmRecords {
    /// Combines records of several files.
    ///
    /// On equal timestamps, samples of `other` win.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            series: self.series.merge(other.series),
            stations: sorted_ids(self.stations.into_iter().chain(other.stations)),
            matched_stations: sorted_ids(
                self.matched_stations
                    .into_iter()
                    .chain(other.matched_stations),
            ),
        }
    }
}

/// Reads EFM files, optionally restricted to one station.
///
/// Without a station filter, samples of several stations sharing a timestamp
/// collapse to the one listed last.
#[derive(Clone, Debug, Default)]
pub struct EfmReader {
    station: Option<String>,
}

impl EfmReader {
    /// Creates a reader that accepts every station.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keeps samples of this station; blank ids disable the filter.
    ///
    /// Default = none
    #[must_use]
    pub fn station<S: Into<String>>(mut self, id: S) -> Self {
        let id = id.into().trim().to_owned();
        self.station = (!id.is_empty()).then_some(id);
        self
    }

    /// Resampler suited to mill data, aggregating at the finest width too.
    #[must_use]
    pub fn resampler() -> Resampler {
        Resampler::new().aggregate_at_finest(true)
    }

    /// Parses the contents of a file covering the day starting at `day`.
    #[must_use]
    pub fn parse(&self, day: Timestamp, text: &str) -> EfmRecords {
        let day = start_of_day(day);

        let mut points = vec![];
        let mut stations = BTreeSet::new();
        let mut matched = BTreeSet::new();

        for line in text.lines() {
            let mut parts = line.trim().split(',');

            let (Some(time), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };

            let station = parts.next().map(str::trim).unwrap_or_default();

            if !station.is_empty() {
                stations.insert(station);
            }

            if self.station.as_deref().is_some_and(|filter| filter != station) {
                continue;
            }

            let Some(point) = Self::parse_sample(day, time.trim(), value.trim()) else {
                log::trace!("skipping EFM line {line:?}");
                continue;
            };

            points.push(point);

            if !station.is_empty() {
                matched.insert(station);
            }
        }

        EfmRecords {
            series: PointSeries::new(points),
            stations: sorted_ids(stations.into_iter().map(str::to_owned)),
            matched_stations: sorted_ids(matched.into_iter().map(str::to_owned)),
        }
    }

    fn parse_sample(day: Timestamp, time: &str, value: &str) -> Option<Point> {
        let (_, time) = all_consuming(EfmTime::parse)(time).ok()?;

        let value = value.parse::<Value>().ok().filter(|v| v.is_finite())?;

        let offset = NaiveTime::from_hms_opt(time.hour, time.minute, time.second)?
            .num_seconds_from_midnight();

        Some(Point::new(day + Timestamp::from(offset) * 1_000, value))
    }

    /// Reads one file.
    ///
    /// A file that does not exist yields empty records.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs.
    pub fn read(&self, file: &EfmFile) -> Result<EfmRecords> {
        let bytes = match std::fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("EFM file {} does not exist", file.path.display());
                return Ok(EfmRecords::default());
            }
            Err(e) => return Err(e.into()),
        };

        let records = self.parse(file.date, &String::from_utf8_lossy(&bytes));

        log::debug!(
            "read {} points from {} ({} stations)",
            records.series.len(),
            file.path.display(),
            records.stations.len(),
        );

        Ok(records)
    }

    /// Reads every file overlapping `[start, end]` and keeps the samples inside it.
    ///
    /// # Errors
    ///
    /// Will return `Err` if an IO error occurs.
    pub fn read_range(
        &self,
        files: &[EfmFile],
        start: Timestamp,
        end: Timestamp,
    ) -> Result<EfmRecords> {
        let mut combined = EfmRecords::default();

        for file in super::select_days(files, start, end) {
            let mut records = self.read(file)?;
            records.series = records.series.clip(start, end);
            combined = combined.merge(records);
        }

        Ok(combined)
    }
}

fn sorted_ids<I: IntoIterator<Item = String>>(ids: I) -> Vec<String> {
    let mut ids = ids
        .into_iter()
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();

    ids.sort_by(|a, b| natural_cmp(a, b));
    ids
}

/// Compares strings so that embedded numbers sort by value (`"2" < "10"`).
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut lhs = chunks(a);
    let mut rhs = chunks(b);

    loop {
        let ord = match (lhs.next(), rhs.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => compare_chunks(x, y),
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// Splits into alternating runs of digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    static_regex!(r"\d+|\D+").find_iter(s).map(|m| m.as_str())
}

fn compare_chunks(x: &str, y: &str) -> Ordering {
    let is_number = |s: &str| s.bytes().all(|b| b.is_ascii_digit());

    if is_number(x) && is_number(y) {
        let x = x.trim_start_matches('0');
        let y = y.trim_start_matches('0');
        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
    } else {
        x.to_lowercase().cmp(&y.to_lowercase())
    }
}
