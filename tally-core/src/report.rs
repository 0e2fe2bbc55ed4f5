use crate::{Metadata, RunConfig, Statistics};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSecondsWithFrac};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;

/// Summary of one completed run.
///
/// Durations serialize as fractional milliseconds; counts are in logical operations, i.e.
/// already weighted by the batch size.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub test_name: String,
    pub target_label: String,
    pub num_operations: u64,
    /// Requested concurrency, at least one. May exceed `workers` when fewer invocations were
    /// requested than workers.
    pub concurrency: usize,
    /// Workers that actually ran.
    pub workers: usize,
    pub batch_size: u32,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "total_duration_ms")]
    pub total_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "avg_duration_ms")]
    pub mean_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "median_duration_ms")]
    pub median_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "p95_duration_ms")]
    pub p95_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "p99_duration_ms")]
    pub p99_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "min_duration_ms")]
    pub min_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "max_duration_ms")]
    pub max_duration: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    #[serde(rename = "std_dev_duration_ms")]
    pub std_dev_duration: Duration,
    pub operations_per_sec: f64,
    pub success_count: u64,
    pub error_count: u64,
    pub aggregated_metadata: Metadata,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl RunReport {
    /// Combine the scheduler's outputs with the reduced statistics.
    ///
    /// Throughput is taken from the wall-clock duration of the whole run, never from the sum of
    /// sample latencies.
    pub fn assemble(
        config: &RunConfig,
        workers: usize,
        total_duration: Duration,
        stats: &Statistics,
        aggregated_metadata: Metadata,
    ) -> Self {
        let batch_size = config.batch_size.get();
        let weight = u64::from(batch_size);
        let num_operations = config.num_operations();

        debug_assert_eq!(stats.total() * weight, num_operations);

        let secs = total_duration.as_secs_f64();
        let operations_per_sec = if num_operations == 0 || secs <= 0. {
            0.
        } else {
            num_operations as f64 / secs
        };

        Self {
            test_name: config.name.clone(),
            target_label: config.target.clone(),
            num_operations,
            concurrency: config.concurrency.max(1),
            workers,
            batch_size,
            total_duration,
            mean_duration: stats.mean,
            median_duration: stats.median,
            p95_duration: stats.p95,
            p99_duration: stats.p99,
            min_duration: stats.min,
            max_duration: stats.max,
            std_dev_duration: stats.std_dev,
            operations_per_sec,
            success_count: stats.success_count * weight,
            error_count: stats.error_count * weight,
            aggregated_metadata,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn error_rate(&self) -> f64 {
        if self.num_operations == 0 {
            0.
        } else {
            self.error_count as f64 / self.num_operations as f64
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test: {} [{}]", self.test_name, self.target_label)?;
        writeln!(
            f,
            "  Operations: {} (Success: {}, Errors: {})",
            self.num_operations, self.success_count, self.error_count
        )?;
        writeln!(
            f,
            "  Concurrency: {} ({} workers, batch size {})",
            self.concurrency, self.workers, self.batch_size
        )?;
        writeln!(
            f,
            "  Total Duration: {}",
            humantime::format_duration(self.total_duration)
        )?;
        writeln!(f, "  Ops/sec: {:.2}", self.operations_per_sec)?;
        writeln!(
            f,
            "  Avg Latency: {}",
            humantime::format_duration(self.mean_duration)
        )?;
        writeln!(
            f,
            "  P50 Latency: {}",
            humantime::format_duration(self.median_duration)
        )?;
        writeln!(
            f,
            "  P95 Latency: {}",
            humantime::format_duration(self.p95_duration)
        )?;
        write!(
            f,
            "  P99 Latency: {}",
            humantime::format_duration(self.p99_duration)
        )?;
        for (key, value) in &self.aggregated_metadata {
            write!(f, "\n  Total {key}: {value:.2}")?;
        }
        Ok(())
    }
}

/// Reports of one benchmarking session, in the order the runs finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSuite {
    results: Vec<RunReport>,
}

impl BenchmarkSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: RunReport) {
        self.results.push(report);
    }

    pub fn results(&self) -> &[RunReport] {
        &self.results
    }

    pub fn get(&self, test_name: &str) -> Option<&RunReport> {
        self.results.iter().find(|r| r.test_name == test_name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunReport> {
        self.results.iter()
    }
}

impl Extend<RunReport> for BenchmarkSuite {
    fn extend<I: IntoIterator<Item = RunReport>>(&mut self, iter: I) {
        self.results.extend(iter);
    }
}

impl<'a> IntoIterator for &'a BenchmarkSuite {
    type Item = &'a RunReport;
    type IntoIter = std::slice::Iter<'a, RunReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
