use super::Sample;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeltaPoint {
    pub timestamp: DateTime<Utc>,
    pub value: i64,
}

/// Raw and hourly-rate increments, index-aligned with the ascending series.
///
/// Index 0 has no predecessor and carries index 1's value for chart
/// continuity. It must not feed any aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deltas {
    pub increments: Vec<DeltaPoint>,
    pub hourly_increments: Vec<DeltaPoint>,
}

/// Downloads per hour over `elapsed`, rounded half away from zero.
/// Zero or negative spans yield 0.
pub fn hourly_rate(raw_delta: i64, elapsed: Duration) -> i64 {
    let hours = elapsed.num_milliseconds() as f64 / MILLIS_PER_HOUR;
    if hours > 0.0 {
        (raw_delta as f64 / hours).round() as i64
    } else {
        0
    }
}

/// Compute increments over an ascending, deduplicated series.
/// Negative deltas (upstream corrections) are kept as-is.
pub fn compute(series: &[Sample]) -> Deltas {
    let Some(first) = series.first() else {
        return Deltas::default();
    };

    let mut increments = Vec::with_capacity(series.len());
    let mut hourly_increments = Vec::with_capacity(series.len());
    let seed = DeltaPoint {
        timestamp: first.timestamp,
        value: 0,
    };
    increments.push(seed);
    hourly_increments.push(seed);

    for pair in series.windows(2) {
        let (prev, cur) = (pair[0], pair[1]);
        let raw = cur.download_count - prev.download_count;
        increments.push(DeltaPoint {
            timestamp: cur.timestamp,
            value: raw,
        });
        hourly_increments.push(DeltaPoint {
            timestamp: cur.timestamp,
            value: hourly_rate(raw, cur.timestamp - prev.timestamp),
        });
    }

    if increments.len() > 1 {
        increments[0].value = increments[1].value;
        hourly_increments[0].value = hourly_increments[1].value;
    }

    Deltas {
        increments,
        hourly_increments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fixtures::at;

    fn values(points: &[DeltaPoint]) -> Vec<i64> {
        points.iter().map(|p| p.value).collect()
    }

    #[test]
    fn test_lengths_match_series() {
        let series = vec![at(1, 0, 10), at(2, 0, 20), at(4, 0, 25), at(5, 30, 40)];
        let d = compute(&series);
        assert_eq!(d.increments.len(), series.len());
        assert_eq!(d.hourly_increments.len(), series.len());
        for (i, s) in series.iter().enumerate() {
            assert_eq!(d.increments[i].timestamp, s.timestamp);
            assert_eq!(d.hourly_increments[i].timestamp, s.timestamp);
        }
    }

    #[test]
    fn test_boundary_inherits_second_point() {
        let series = vec![at(1, 0, 10), at(2, 0, 70), at(3, 0, 75)];
        let d = compute(&series);
        assert_eq!(values(&d.increments), vec![60, 60, 5]);
        assert_eq!(values(&d.hourly_increments), vec![60, 60, 5]);
    }

    #[test]
    fn test_rate_over_two_hours() {
        let d = compute(&[at(8, 0, 400), at(10, 0, 500)]);
        assert_eq!(d.hourly_increments[1].value, 50);
    }

    #[test]
    fn test_fractional_hours() {
        // 30 minutes, 45 downloads -> 90/h
        let d = compute(&[at(8, 0, 0), at(8, 30, 45)]);
        assert_eq!(d.hourly_increments[1].value, 90);
    }

    #[test]
    fn test_zero_duration_guard() {
        let d = compute(&[at(8, 0, 100), at(8, 0, 130)]);
        assert_eq!(d.increments[1].value, 30);
        assert_eq!(d.hourly_increments[1].value, 0);
    }

    #[test]
    fn test_backwards_time_yields_zero_rate() {
        let d = compute(&[at(9, 0, 100), at(8, 0, 130)]);
        assert_eq!(d.hourly_increments[1].value, 0);
    }

    #[test]
    fn test_negative_delta_preserved() {
        let d = compute(&[at(1, 0, 1000), at(3, 0, 900)]);
        assert_eq!(d.increments[1].value, -100);
        assert_eq!(d.hourly_increments[1].value, -50);
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 5 downloads over 2h = 2.5/h
        assert_eq!(hourly_rate(5, Duration::hours(2)), 3);
        assert_eq!(hourly_rate(-5, Duration::hours(2)), -3);
        assert_eq!(hourly_rate(7, Duration::hours(3)), 2);
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(compute(&[]), Deltas::default());
        let d = compute(&[at(1, 0, 5)]);
        assert_eq!(values(&d.increments), vec![0]);
        assert_eq!(values(&d.hourly_increments), vec![0]);
    }
}
