//! Explicit "no data" markers for chart renderers.

use crate::{Duration, PointSeries, Timestamp, Value};

/// A chart sample; `None` means "no data here".
pub type ChartPoint = (Timestamp, Option<Value>);

/// Gaps wider than `step * DEFAULT_GAP_MULTIPLIER` get a marker.
pub const DEFAULT_GAP_MULTIPLIER: f64 = 2.0;

/// Lifts a series into chart points.
#[must_use]
pub fn to_chart_points(series: &PointSeries) -> Vec<ChartPoint> {
    series.iter().map(|p| (p.timestamp, Some(p.value))).collect()
}

/// Inserts gap markers using the default multiplier.
///
/// See [`GapInjector`].
#[must_use]
pub fn inject_null_gaps(points: &[ChartPoint], step_ms: f64) -> Vec<ChartPoint> {
    GapInjector::new(step_ms).apply(points)
}

/// Inserts one `None` sample after every gap that is larger than expected,
/// so a chart does not draw a line across missing data.
///
/// ```
/// use geomag::GapInjector;
///
/// let points = [(0, Some(1.0)), (60_000, Some(2.0)), (240_000, Some(3.0))];
/// let out = GapInjector::new(60_000.0).apply(&points);
///
/// assert_eq!(
///     vec![(0, Some(1.0)), (60_000, Some(2.0)), (120_000, None), (240_000, Some(3.0))],
///     out,
/// );
/// ```
#[derive(Clone, Debug)]
pub struct GapInjector {
    step_ms: f64,
    multiplier: f64,
}

impl GapInjector {
    /// Creates an injector for samples expected every `step_ms`.
    #[must_use]
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ms,
            multiplier: DEFAULT_GAP_MULTIPLIER,
        }
    }

    /// Creates an injector from a duration string such as `"1m"`.
    ///
    /// Returns `None` if the string is not a valid duration.
    #[must_use]
    pub fn from_duration(text: &str) -> Option<Self> {
        Duration::parse(text).map(Self::new)
    }

    /// Sets how many steps a gap must exceed to be marked.
    ///
    /// Default = 2
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Positions of the gap markers for an ascending run of timestamps.
    ///
    /// Each entry is the index of the sample preceding a gap, and the marker's
    /// timestamp. For each adjacent pair further apart than `step * multiplier`,
    /// exactly one marker is placed at `current + step`, unless that would not
    /// land strictly before the next sample. A step that is not a positive
    /// finite number yields no markers.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn markers<I: IntoIterator<Item = Timestamp>>(&self, timestamps: I) -> Vec<(usize, Timestamp)> {
        if !self.step_ms.is_finite() || self.step_ms <= 0.0 {
            return vec![];
        }

        let threshold = self.step_ms * self.multiplier;
        let step = self.step_ms.ceil() as Timestamp;

        let mut markers = vec![];
        let mut iter = timestamps.into_iter().enumerate().peekable();

        while let Some((idx, current)) = iter.next() {
            let Some(&(_, next)) = iter.peek() else {
                break;
            };

            let gap = next.saturating_sub(current) as f64;

            if gap > threshold {
                let marker = current.saturating_add(step);

                if marker < next {
                    markers.push((idx, marker));
                }
            }
        }

        markers
    }

    /// Returns the points with gap markers inserted.
    ///
    /// See [`GapInjector::markers`].
    #[must_use]
    pub fn apply(&self, points: &[ChartPoint]) -> Vec<ChartPoint> {
        let mut markers = self
            .markers(points.iter().map(|&(ts, _)| ts))
            .into_iter()
            .peekable();

        let mut result = Vec::with_capacity(points.len() + markers.len());

        for (idx, &point) in points.iter().enumerate() {
            result.push(point);

            if let Some((_, marker)) = markers.next_if(|&(after, _)| after == idx) {
                result.push((marker, None));
            }
        }

        result
    }
}
