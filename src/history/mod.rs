//! Download trend pipeline for the app detail view.
//!
//! History arrives newest-first from `/api/apps/metrics/{pkg}`. It is
//! normalized (flat runs collapsed, reversed to ascending time), turned into
//! raw and hourly increments, and emitted as chart-ready `{x, y}` series.

pub mod delta;
pub mod normalize;
pub mod series;

use crate::types::MetricRecord;
use chrono::{DateTime, NaiveDateTime, Utc};

pub use delta::{DeltaPoint, Deltas};
pub use series::{SeriesPoint, Trend, TrendOutcome, TrendSeries, TrendSummary};

/// One timestamped download-count observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub download_count: i64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, download_count: i64) -> Self {
        Self {
            timestamp,
            download_count,
        }
    }

    /// Parse a wire record. Returns `None` when `created_at` is not a timestamp
    /// we understand.
    pub fn from_record(record: &MetricRecord) -> Option<Self> {
        parse_timestamp(&record.created_at).map(|ts| Self::new(ts, record.download_count))
    }
}

/// RFC 3339 with offset, or a naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Convert wire records to samples, keeping the upstream order.
/// Records with unparseable timestamps are dropped.
pub fn samples_from_records(records: &[MetricRecord]) -> Vec<Sample> {
    records
        .iter()
        .filter_map(|r| {
            let sample = Sample::from_record(r);
            if sample.is_none() {
                tracing::warn!(created_at = %r.created_at, "skipping history record with bad timestamp");
            }
            sample
        })
        .collect()
}

/// Run the whole pipeline on a newest-first history.
pub fn build_trend(history: &[Sample]) -> TrendOutcome {
    let ascending = normalize::normalize(history);
    if ascending.len() <= 1 {
        return TrendOutcome::NoHistory;
    }
    let deltas = delta::compute(&ascending);
    let series = TrendSeries::emit(&ascending, &deltas);
    let summary = TrendSummary::from_series(&ascending, &deltas);
    TrendOutcome::Trend(Trend { series, summary })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Sample;
    use chrono::{TimeZone, Utc};

    /// Sample at `2025-03-01 hh:mm` UTC.
    pub fn at(hh: u32, mm: u32, count: i64) -> Sample {
        Sample::new(
            Utc.with_ymd_and_hms(2025, 3, 1, hh, mm, 0).unwrap(),
            count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::at;
    use super::*;

    #[test]
    fn test_end_to_end_example() {
        let history = vec![
            at(10, 0, 500),
            at(9, 0, 500),
            at(8, 0, 400),
            at(7, 0, 400),
            at(6, 0, 400),
        ];
        let trend = match build_trend(&history) {
            TrendOutcome::Trend(t) => t,
            TrendOutcome::NoHistory => panic!("expected a trend"),
        };
        let t8 = at(8, 0, 0).timestamp.timestamp_millis();
        let t10 = at(10, 0, 0).timestamp.timestamp_millis();

        let downloads: Vec<(i64, i64)> =
            trend.series.downloads.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(downloads, vec![(t8, 400), (t10, 500)]);

        let inc: Vec<(i64, i64)> = trend.series.increments.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(inc, vec![(t8, 100), (t10, 100)]);

        let hourly: Vec<(i64, i64)> = trend
            .series
            .hourly_increments
            .iter()
            .map(|p| (p.x, p.y))
            .collect();
        assert_eq!(hourly, vec![(t8, 50), (t10, 50)]);
    }

    #[test]
    fn test_no_history_for_short_input() {
        assert_eq!(build_trend(&[]), TrendOutcome::NoHistory);
        assert_eq!(build_trend(&[at(8, 0, 10)]), TrendOutcome::NoHistory);
    }

    #[test]
    fn test_flat_history_collapses_to_no_history() {
        let history = vec![at(10, 0, 7), at(9, 0, 7), at(8, 0, 7)];
        assert_eq!(build_trend(&history), TrendOutcome::NoHistory);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = at(2, 0, 0).timestamp;
        assert_eq!(parse_timestamp("2025-03-01T10:00:00+08:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T02:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T02:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 02:00:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_samples_from_records_skips_bad_rows() {
        let records = vec![
            MetricRecord {
                created_at: "2025-03-01T10:00:00Z".into(),
                download_count: 3,
            },
            MetricRecord {
                created_at: "garbage".into(),
                download_count: 2,
            },
            MetricRecord {
                created_at: "2025-03-01T08:00:00Z".into(),
                download_count: 1,
            },
        ];
        let samples = samples_from_records(&records);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].download_count, 3);
        assert_eq!(samples[1].download_count, 1);
    }
}
