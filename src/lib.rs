//! Toolkit for geomagnetic observatory time series.
//!
//! Turns raw station files and space-weather feeds into chart-ready payloads:
//!
//! - [`extract`] reads DataMin minute files, electric field mill (EFM) day files,
//!   Dst index tables and Kp feeds into point series
//! - [`Resampler`] downsamples a series to a point budget using a fixed ladder of bucket widths
//! - [`GapInjector`] inserts explicit "no data" markers so charts do not bridge outages
//! - [`Baseline`] estimates the quiet-day value for every time of day
//! - [`ChartPayload`] bundles labels, series and metadata into JSON
//!
//! ```
//! use geomag::{Baseline, ChartPayload, Duration, GapInjector, Point, PointSeries, Resampler};
//!
//! // Two days of minute data with an outage on the second day
//! let series = (0..Duration::days(2))
//!     .step_by(Duration::minutes(1) as usize)
//!     .filter(|&t| !(Duration::hours(30)..Duration::hours(31)).contains(&t))
//!     .map(|t| Point::new(t, 20_000.0))
//!     .collect::<PointSeries>();
//!
//! let day_two = series.clip(Duration::days(1), Duration::days(2) - 1);
//!
//! let baseline = Baseline::builder()
//!     .bucket_size_ms(Duration::minutes(1))
//!     .build(&series.clip(0, Duration::days(1) - 1));
//!
//! let resampled = Resampler::new().run(&day_two, Duration::days(1), Duration::days(2) - 1);
//!
//! let payload = ChartPayload::new("H", &resampled)
//!     .with_series("ΔH", &baseline.deviation(&resampled.points))
//!     .inject_gaps(&GapInjector::new(resampled.bucket_ms as f64));
//!
//! assert_eq!(1_380, payload.meta.points);
//! assert_eq!(1_381, payload.labels.len());
//!
//! let json = payload.to_json()?;
//! assert!(json.starts_with(r#"{"labels":["#));
//! #
//! # Ok::<(), geomag::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![warn(clippy::result_unit_err)]

mod baseline;
mod duration;
mod error;
pub mod extract;
mod gaps;
mod payload;
mod point;
mod resample;
pub mod time;

type HashMap<K, V> = std::collections::HashMap<K, V, rustc_hash::FxBuildHasher>;

/// Milliseconds since the Unix epoch (UTC)
pub type Timestamp = i64;

/// Value used in time series
pub type Value = f64;

pub use baseline::{
    daily_bucket_key, median, mode, Baseline, BaselineBuilder, BaselineTable,
    DEFAULT_BUCKET_SIZE_MS, DEFAULT_ROUNDING_DECIMALS,
};
pub use duration::Duration;
pub use error::{Error, Result};
pub use gaps::{inject_null_gaps, to_chart_points, ChartPoint, GapInjector, DEFAULT_GAP_MULTIPLIER};
pub use payload::{BucketMeta, ChartMeta, ChartPayload, ChartSeries, LabelRange};
pub use point::{Point, PointSeries};
pub use resample::{
    aggregate, aggregate_with, pick_bucket_width, Aggregation, Avg, Bucket, Resampled, Resampler,
    DEFAULT_TARGET_POINTS, LADDER, MAX_BUCKET, MIN_BUCKET,
};
pub use time::timestamp;
