//! Planetary Kp index, published every three hours.

use super::feed::Sample;
use crate::{
    time::{time_of_day, HOUR_MS},
    Point, Timestamp, Value,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Kp below this is quiet (green).
pub const KP_GREEN_THRESHOLD: Value = 4.0;

/// Kp below this is unsettled (yellow); anything above is a storm (red).
pub const KP_YELLOW_THRESHOLD: Value = 6.0;

const CADENCE: Timestamp = 3 * HOUR_MS;

/// Whether a Kp value is final
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum KpStatus {
    /// Definitive value
    #[serde(rename = "def")]
    Definitive,

    /// Nowcast, may still be revised
    #[serde(rename = "now")]
    Nowcast,
}

impl KpStatus {
    /// Interprets a provider flag; anything not starting with `def` is a nowcast.
    #[must_use]
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(flag) if flag.trim().to_ascii_lowercase().starts_with("def") => Self::Definitive,
            _ => Self::Nowcast,
        }
    }

    /// Short label, `def` or `now`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Definitive => "def",
            Self::Nowcast => "now",
        }
    }
}

/// A Kp value at a three-hour mark
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpSample {
    /// Start of the three-hour interval
    pub timestamp: Timestamp,

    /// Kp value
    pub value: Value,

    /// Quality of the value
    pub status: KpStatus,
}

impl From<&KpSample> for Point {
    fn from(sample: &KpSample) -> Self {
        Self::new(sample.timestamp, sample.value)
    }
}

/// Keeps only samples at exact three-hour UTC marks (00, 03, ..., 21).
///
/// Sub-second parts are dropped before the check; samples at any other time
/// are discarded, not averaged. On duplicate marks the last sample wins.
/// Output is ascending.
#[must_use]
pub fn normalize_to_3h<I: IntoIterator<Item = Sample>>(samples: I) -> Vec<KpSample> {
    let mut by_mark = BTreeMap::new();

    for sample in samples {
        let timestamp = sample.timestamp - sample.timestamp.rem_euclid(1_000);

        if time_of_day(timestamp) % CADENCE != 0 {
            continue;
        }

        if !sample.value.is_finite() || sample.value.abs() >= 9_999.0 {
            continue;
        }

        by_mark.insert(
            timestamp,
            KpSample {
                timestamp,
                value: sample.value,
                status: KpStatus::from_flag(sample.status.as_deref()),
            },
        );
    }

    log::trace!("kept {} three-hourly Kp samples", by_mark.len());

    by_mark.into_values().collect()
}

/// Merges two normalized series; samples of `incoming` win on equal marks.
#[must_use]
pub fn merge_kp(existing: &[KpSample], incoming: &[KpSample]) -> Vec<KpSample> {
    existing
        .iter()
        .chain(incoming)
        .map(|sample| (sample.timestamp, sample.clone()))
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .collect()
}

/// Chart colour for a Kp value.
#[must_use]
pub fn kp_color(value: Value) -> &'static str {
    if !value.is_finite() {
        "#64748b"
    } else if value < KP_GREEN_THRESHOLD {
        "#22c55e"
    } else if value < KP_YELLOW_THRESHOLD {
        "#facc15"
    } else {
        "#ef4444"
    }
}
