use super::Sample;

/// Collapse runs of identical `download_count` in a newest-first history.
///
/// The newest sample is always kept. Each later sample is kept only when its
/// count differs from the raw sample right before it, so a flat run keeps
/// its newest reading.
pub fn dedup_newest_first(history: &[Sample]) -> Vec<Sample> {
    if history.len() <= 1 {
        return history.to_vec();
    }
    let mut kept = Vec::with_capacity(history.len());
    kept.push(history[0]);
    kept.extend(
        history
            .windows(2)
            .filter(|pair| pair[1].download_count != pair[0].download_count)
            .map(|pair| pair[1]),
    );
    kept
}

/// Dedup a newest-first history and return it in ascending time order.
pub fn normalize(history: &[Sample]) -> Vec<Sample> {
    let mut series = dedup_newest_first(history);
    series.reverse();
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::fixtures::at;

    fn counts(series: &[Sample]) -> Vec<i64> {
        series.iter().map(|s| s.download_count).collect()
    }

    #[test]
    fn test_short_inputs_unchanged() {
        assert!(dedup_newest_first(&[]).is_empty());
        let one = vec![at(1, 0, 5)];
        assert_eq!(dedup_newest_first(&one), one);
    }

    #[test]
    fn test_keeps_newest_of_flat_run() {
        let history = vec![at(10, 0, 500), at(9, 0, 500), at(8, 0, 400), at(7, 0, 400)];
        let deduped = dedup_newest_first(&history);
        assert_eq!(deduped, vec![at(10, 0, 500), at(8, 0, 400)]);
    }

    #[test]
    fn test_distinct_counts_pass_through() {
        let history = vec![at(4, 0, 40), at(3, 0, 30), at(2, 0, 20), at(1, 0, 10)];
        assert_eq!(dedup_newest_first(&history), history);
    }

    #[test]
    fn test_fluctuating_values_compare_against_raw_predecessor() {
        let history = vec![
            at(5, 0, 5),
            at(4, 0, 5),
            at(3, 0, 4),
            at(2, 0, 5),
            at(1, 0, 5),
        ];
        let deduped = dedup_newest_first(&history);
        assert_eq!(counts(&deduped), vec![5, 4, 5]);
        assert_eq!(deduped[2].timestamp, at(2, 0, 0).timestamp);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let history = vec![
            at(9, 0, 9),
            at(8, 0, 9),
            at(7, 0, 7),
            at(6, 0, 9),
            at(5, 0, 9),
            at(4, 0, 9),
            at(3, 0, 3),
        ];
        let once = dedup_newest_first(&history);
        let twice = dedup_newest_first(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_is_ascending() {
        let history = vec![at(10, 0, 500), at(9, 0, 500), at(8, 0, 400)];
        let series = normalize(&history);
        assert_eq!(series, vec![at(8, 0, 400), at(10, 0, 500)]);
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
