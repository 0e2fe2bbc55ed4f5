use crate::{SampleSet, P95_QUANTILE, P99_QUANTILE};
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, trace};

/// Latency distribution and outcome counts of one sample set.
///
/// Counts are per invocation; batch weighting happens when the report is assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub mean: Duration,
    pub median: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub min: Duration,
    pub max: Duration,
    pub std_dev: Duration,
    pub success_count: u64,
    pub error_count: u64,
}

impl Statistics {
    /// Reduce a frozen sample set.
    ///
    /// Percentiles are picked by index into the sorted latencies, `sorted[floor(n * q)]`, so
    /// results stay comparable with other tools using the same convention.
    pub fn reduce(samples: &SampleSet) -> Self {
        let success_count = samples.iter().filter(|s| s.is_success()).count() as u64;
        let error_count = samples.len() as u64 - success_count;

        if samples.is_empty() {
            trace!("Reducing an empty sample set.");
            return Self::default();
        }

        let mut sorted = samples.latencies();
        sorted.sort();
        let n = sorted.len();

        let total_nanos: u128 = sorted.iter().map(Duration::as_nanos).sum();
        let mean_nanos = total_nanos / n as u128;
        let mean = Duration::from_nanos(mean_nanos as u64);

        Self {
            mean,
            median: sorted[n / 2],
            p95: sorted[quantile_index(n, P95_QUANTILE)],
            p99: sorted[quantile_index(n, P99_QUANTILE)],
            min: sorted[0],
            max: sorted[n - 1],
            std_dev: std_dev(&sorted, mean),
            success_count,
            error_count,
        }
    }

    pub fn total(&self) -> u64 {
        self.success_count + self.error_count
    }

    pub fn error_rate(&self) -> f64 {
        match self.total() {
            0 => 0.,
            total => self.error_count as f64 / total as f64,
        }
    }
}

fn quantile_index(n: usize, quantile: f64) -> usize {
    ((n as f64 * quantile) as usize).min(n - 1)
}

fn std_dev(latencies: &[Duration], mean: Duration) -> Duration {
    if latencies.len() < 2 {
        return Duration::ZERO;
    }

    let secs: Vec<f64> = latencies.iter().map(Duration::as_secs_f64).collect();
    let std = statistical::standard_deviation(&secs, Some(mean.as_secs_f64()));
    if std.is_finite() {
        Duration::from_secs_f64(std)
    } else {
        debug!("Non-finite standard deviation; reporting zero.");
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Metadata, Sample};

    fn ms_set(latencies_ms: &[u64]) -> SampleSet {
        latencies_ms
            .iter()
            .map(|ms| Sample::success(Duration::from_millis(*ms), Metadata::default()))
            .collect()
    }

    #[test]
    fn empty_set_is_all_zero() {
        let stats = SampleSet::default().reduce();
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.error_rate(), 0.);
    }

    #[test]
    fn single_sample() {
        let stats = ms_set(&[7]).reduce();
        let seven = Duration::from_millis(7);
        assert_eq!(stats.mean, seven);
        assert_eq!(stats.median, seven);
        assert_eq!(stats.p95, seven);
        assert_eq!(stats.p99, seven);
        assert_eq!(stats.std_dev, Duration::ZERO);
        assert_eq!(stats.success_count, 1);
    }

    #[test]
    fn floor_index_convention() {
        // 1..=100 ms, shuffled by reversing
        let latencies: Vec<u64> = (1..=100).rev().collect();
        let stats = ms_set(&latencies).reduce();

        // sorted[50], sorted[95], sorted[99]
        assert_eq!(stats.median, Duration::from_millis(51));
        assert_eq!(stats.p95, Duration::from_millis(96));
        assert_eq!(stats.p99, Duration::from_millis(100));
        assert_eq!(stats.min, Duration::from_millis(1));
        assert_eq!(stats.max, Duration::from_millis(100));
        assert_eq!(stats.mean, Duration::from_micros(50_500));
    }

    #[test]
    fn percentiles_are_ordered() {
        let stats = ms_set(&[5, 1, 9, 3, 3, 12, 40, 2, 2, 8, 1, 1]).reduce();
        assert!(stats.p99 >= stats.p95);
        assert!(stats.p95 >= stats.median);
        assert!(stats.median >= stats.min);
        assert!(stats.std_dev > Duration::ZERO);
    }

    #[test]
    fn std_dev_is_sample_deviation() {
        let stats = ms_set(&[2, 4, 4, 4, 5, 5, 7, 9]).reduce();
        let expected = (32. / 7f64).sqrt() / 1_000.;
        assert!((stats.std_dev.as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn mean_keeps_sub_millisecond_precision() {
        let set: SampleSet = [1_001u64, 1_002, 1_003]
            .iter()
            .map(|ns| Sample::success(Duration::from_nanos(*ns), Metadata::default()))
            .collect();
        assert_eq!(set.reduce().mean, Duration::from_nanos(1_002));
    }

    #[test]
    fn reduce_is_idempotent() {
        let set = ms_set(&[4, 8, 15, 16, 23, 42]);
        assert_eq!(set.reduce(), set.reduce());
    }

    #[test]
    fn failures_counted_and_timed() {
        let set: SampleSet = vec![
            Sample::success(Duration::from_millis(1), Metadata::default()),
            Sample::failure(Duration::from_millis(30), "timeout"),
        ]
        .into();
        let stats = set.reduce();
        assert_eq!(stats.success_count, 1);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.max, Duration::from_millis(30));
        assert_eq!(stats.error_rate(), 0.5);
    }
}
