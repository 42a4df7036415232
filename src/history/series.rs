use super::delta::{DeltaPoint, Deltas};
use super::Sample;
use serde::{Deserialize, Serialize};

/// A time-axis point for the charting layer. `x` is epoch milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: i64,
    pub y: i64,
}

impl From<&DeltaPoint> for SeriesPoint {
    fn from(p: &DeltaPoint) -> Self {
        Self {
            x: p.timestamp.timestamp_millis(),
            y: p.value,
        }
    }
}

impl From<&Sample> for SeriesPoint {
    fn from(s: &Sample) -> Self {
        Self {
            x: s.timestamp.timestamp_millis(),
            y: s.download_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub downloads: Vec<SeriesPoint>,
    pub increments: Vec<SeriesPoint>,
    pub hourly_increments: Vec<SeriesPoint>,
}

impl TrendSeries {
    pub fn emit(series: &[Sample], deltas: &Deltas) -> Self {
        Self {
            downloads: series.iter().map(SeriesPoint::from).collect(),
            increments: deltas.increments.iter().map(SeriesPoint::from).collect(),
            hourly_increments: deltas.hourly_increments.iter().map(SeriesPoint::from).collect(),
        }
    }
}

/// Headline numbers for the detail panel. Computed from real deltas only;
/// the inherited leading point is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub first: SeriesPoint,
    pub last: SeriesPoint,
    pub total_gain: i64,
    pub span_hours: f64,
    pub mean_hourly_rate: f64,
    pub peak_hourly: Option<SeriesPoint>,
}

impl TrendSummary {
    /// `series` must hold at least two samples.
    pub fn from_series(series: &[Sample], deltas: &Deltas) -> Self {
        let first = series.first().map(SeriesPoint::from).unwrap_or(SeriesPoint { x: 0, y: 0 });
        let last = series.last().map(SeriesPoint::from).unwrap_or(first);
        let total_gain = last.y - first.y;
        let span_hours = (last.x - first.x) as f64 / 3_600_000.0;
        let mean_hourly_rate = if span_hours > 0.0 {
            total_gain as f64 / span_hours
        } else {
            0.0
        };
        let peak_hourly = deltas
            .hourly_increments
            .iter()
            .skip(1)
            .max_by_key(|p| p.value)
            .map(SeriesPoint::from);

        Self {
            first,
            last,
            total_gain,
            span_hours,
            mean_hourly_rate,
            peak_hourly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub series: TrendSeries,
    pub summary: TrendSummary,
}

/// Result of running the pipeline. `NoHistory` is a normal state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrendOutcome {
    NoHistory,
    Trend(Trend),
}
