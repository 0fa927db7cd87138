//! Chart response body: labels, one or more aligned series and metadata.
//!
//! ```json
//! {
//!   "labels": ["2024-11-05T00:00:00.000Z", ...],
//!   "series": [{ "name": "H", "data": [23101.5, null, ...] }],
//!   "meta": {
//!     "points": 1440,
//!     "originalPoints": 1440,
//!     "bucket": { "size": "1m", "ms": 60000, "downsampled": false, "returned": 1440, "original": 1440 },
//!     "range": { "start": "...", "end": "..." }
//!   }
//! }
//! ```

use crate::{gaps::ChartPoint, time::format_iso, Duration, GapInjector, Resampled, Result, Timestamp, Value};
use serde::Serialize;

/// One named series, aligned with the payload's labels
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Display name, e.g. `H`
    pub name: String,

    /// One entry per label; `None` means no data
    pub data: Vec<Option<Value>>,
}

/// Bucketing that produced the payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BucketMeta {
    /// Bucket width as a duration string, e.g. `5m`
    pub size: String,

    /// Bucket width in milliseconds
    pub ms: Timestamp,

    /// Whether the points are aggregates
    pub downsampled: bool,

    /// Number of points returned
    pub returned: usize,

    /// Number of raw points
    pub original: usize,
}

/// First and last label
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelRange {
    /// First label
    pub start: String,

    /// Last label
    pub end: String,
}

/// Payload metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    /// Number of data points (gap markers not included)
    pub points: usize,

    /// Number of raw points before resampling
    pub original_points: usize,

    /// Bucketing, if any
    pub bucket: Option<BucketMeta>,

    /// Label range, if there are points
    pub range: Option<LabelRange>,

    /// Station the data belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
}

/// Serializable chart payload
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartPayload {
    #[serde(skip)]
    timestamps: Vec<Timestamp>,

    /// ISO-8601 labels of the x axis
    pub labels: Vec<String>,

    /// Series aligned with `labels`
    pub series: Vec<ChartSeries>,

    /// Metadata
    pub meta: ChartMeta,
}

impl ChartPayload {
    /// Builds a payload with a single series from a resampling outcome.
    #[must_use]
    pub fn new<S: Into<String>>(name: S, resampled: &Resampled) -> Self {
        let (timestamps, labels, data): (Vec<_>, Vec<_>, Vec<_>) = resampled
            .points
            .iter()
            .filter_map(|p| Some((p.timestamp, format_iso(p.timestamp)?, Some(p.value))))
            .fold((vec![], vec![], vec![]), |(mut ts, mut ls, mut ds), (t, l, d)| {
                ts.push(t);
                ls.push(l);
                ds.push(d);
                (ts, ls, ds)
            });

        let bucket = (resampled.bucket_ms > 0).then(|| BucketMeta {
            size: Duration::format(resampled.bucket_ms),
            ms: resampled.bucket_ms,
            downsampled: resampled.downsampled,
            returned: labels.len(),
            original: resampled.original_points,
        });

        let range = match (labels.first(), labels.last()) {
            (Some(start), Some(end)) => Some(LabelRange {
                start: start.clone(),
                end: end.clone(),
            }),
            _ => None,
        };

        Self {
            meta: ChartMeta {
                points: labels.len(),
                original_points: resampled.original_points,
                bucket,
                range,
                station: None,
            },
            timestamps,
            labels,
            series: vec![ChartSeries {
                name: name.into(),
                data,
            }],
        }
    }

    /// Instants of the labels.
    #[must_use]
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Tags the payload with a station.
    #[must_use]
    pub fn station<S: Into<String>>(mut self, station: S) -> Self {
        self.meta.station = Some(station.into());
        self
    }

    /// Adds a series, e.g. a baseline or deviation.
    ///
    /// Values are matched to labels by timestamp; labels without a value get `None`.
    #[must_use]
    pub fn with_series<S: Into<String>>(mut self, name: S, points: &[ChartPoint]) -> Self {
        let by_time = points
            .iter()
            .copied()
            .collect::<crate::HashMap<Timestamp, Option<Value>>>();

        let data = self
            .timestamps
            .iter()
            .map(|ts| by_time.get(ts).copied().flatten())
            .collect();

        self.series.push(ChartSeries {
            name: name.into(),
            data,
        });

        self
    }

    /// Inserts gap markers into the labels and `None` into every series.
    #[must_use]
    pub fn inject_gaps(mut self, injector: &GapInjector) -> Self {
        let markers = injector
            .markers(self.timestamps.iter().copied())
            .into_iter()
            .filter_map(|(after, marker)| Some((after, marker, format_iso(marker)?)))
            .collect::<Vec<_>>();

        if markers.is_empty() {
            return self;
        }

        let len = self.timestamps.len() + markers.len();
        let mut timestamps = Vec::with_capacity(len);
        let mut labels = Vec::with_capacity(len);
        let mut gaps = Vec::with_capacity(markers.len());
        let mut markers = markers.into_iter().peekable();

        for (idx, (ts, label)) in self.timestamps.into_iter().zip(self.labels).enumerate() {
            timestamps.push(ts);
            labels.push(label);

            if let Some((_, marker, label)) = markers.next_if(|&(after, ..)| after == idx) {
                timestamps.push(marker);
                labels.push(label);
                gaps.push(idx);
            }
        }

        for series in &mut self.series {
            let mut data = Vec::with_capacity(len);
            let mut gaps = gaps.iter().peekable();

            for (idx, value) in std::mem::take(&mut series.data).into_iter().enumerate() {
                data.push(value);

                if gaps.next_if(|&&after| after == idx).is_some() {
                    data.push(None);
                }
            }

            series.data = data;
        }

        log::trace!("inserted {} gap markers", gaps.len());

        self.timestamps = timestamps;
        self.labels = labels;

        self
    }

    /// Serializes the payload.
    ///
    /// # Errors
    ///
    /// Will return `Err` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
