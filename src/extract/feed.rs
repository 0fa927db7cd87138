//! JSON bodies of space-weather index feeds.
//!
//! Providers disagree on the shape of their payloads. A body is decoded once
//! into a [`FeedShape`], which then yields uniform [`Sample`]s.

use crate::{time::parse_iso, Result, Timestamp, Value};
use serde::Deserialize;
use serde_json::{Map, Value as Json};

const TIME_KEYS: &[&str] = &[
    "time", "timestamp", "datetime", "date", "time_tag", "timeTag", "t",
];

const VALUE_KEYS: &[&str] = &[
    "value", "dst", "Dst", "index", "kp", "Kp", "kp_index", "v", "y",
];

const STATUS_KEYS: &[&str] = &["status", "flag"];

/// One sample of a feed
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Instant of the sample
    pub timestamp: Timestamp,

    /// Index value
    pub value: Value,

    /// Provider's quality flag, e.g. `def` or `now`
    pub status: Option<String>,
}

/// An object of an array-of-objects feed.
///
/// Field names vary between providers; the first known alias present wins.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(from = "Map<String, Json>")]
pub struct FeedRecord {
    time: Option<Json>,
    value: Option<Json>,
    status: Option<Json>,
}

fn first_of(object: &mut Map<String, Json>, keys: &[&str]) -> Option<Json> {
    keys.iter()
        .filter_map(|key| object.remove(*key))
        .find(|value| !value.is_null())
}

impl From<Map<String, Json>> for FeedRecord {
    fn from(mut object: Map<String, Json>) -> Self {
        Self {
            time: first_of(&mut object, TIME_KEYS),
            value: first_of(&mut object, VALUE_KEYS),
            status: first_of(&mut object, STATUS_KEYS),
        }
    }
}

/// Supported JSON feed layouts
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FeedShape {
    /// Array of rows, `[time, value, ...]`, usually led by a header row (NOAA)
    Rows(Vec<Vec<Json>>),

    /// Parallel arrays of instants and values (GFZ)
    Columns {
        /// Instants
        datetime: Vec<Json>,

        /// Values, same length as `datetime`
        #[serde(rename = "Kp", alias = "kp")]
        kp: Vec<Json>,

        /// Optional quality flags, same length as `datetime`
        #[serde(default)]
        status: Vec<Json>,
    },

    /// Array of objects
    Records(Vec<FeedRecord>),

    /// Array of objects under a `data` key
    Wrapped {
        /// The objects
        data: Vec<FeedRecord>,
    },
}

fn to_timestamp(json: &Json) -> Option<Timestamp> {
    match json {
        Json::String(text) => parse_iso(text),
        Json::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn to_value(json: &Json) -> Option<Value> {
    let value = match json {
        Json::String(text) => text.trim().parse::<Value>().ok()?,
        Json::Number(number) => number.as_f64()?,
        _ => return None,
    };

    value.is_finite().then_some(value)
}

fn to_status(json: &Json) -> Option<String> {
    match json {
        Json::String(text) => Some(text.clone()),
        Json::Null => None,
        other => Some(other.to_string()),
    }
}

fn sample(time: Option<&Json>, value: Option<&Json>, status: Option<&Json>) -> Option<Sample> {
    Some(Sample {
        timestamp: to_timestamp(time?)?,
        value: to_value(value?)?,
        status: status.and_then(to_status),
    })
}

impl FeedShape {
    /// Decodes a feed body.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the body is not JSON or has none of the supported shapes.
    pub fn decode(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Samples with a valid instant and a finite value, in feed order.
    #[must_use]
    pub fn into_samples(self) -> Vec<Sample> {
        let samples = match self {
            Self::Rows(rows) => rows
                .iter()
                .filter_map(|row| sample(row.first(), row.get(1), None))
                .collect::<Vec<_>>(),

            Self::Columns {
                datetime,
                kp,
                status,
            } => datetime
                .iter()
                .zip(&kp)
                .enumerate()
                .filter_map(|(idx, (time, value))| sample(Some(time), Some(value), status.get(idx)))
                .collect(),

            Self::Records(records) | Self::Wrapped { data: records } => records
                .iter()
                .filter_map(|r| sample(r.time.as_ref(), r.value.as_ref(), r.status.as_ref()))
                .collect(),
        };

        log::trace!("decoded {} feed samples", samples.len());

        samples
    }
}
