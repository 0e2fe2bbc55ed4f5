use crate::operation::{timed, Operation};
use crate::recorder::SampleRecorder;
use crate::HarnessError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tally_core::RunConfig;
use tokio::task::JoinSet;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[cfg(feature = "metrics")]
const LATENCY_METRIC: &str = "tally_operation_latency";
#[cfg(feature = "metrics")]
const SUCCESS_METRIC: &str = "tally_operation_success";
#[cfg(feature = "metrics")]
const ERROR_METRIC: &str = "tally_operation_error";

/// Run every invocation of `config.count`, feeding samples into `recorder`.
///
/// Returns the wall-clock duration of the whole run, measured from before the first worker
/// starts until the last one has joined. With a single worker everything runs on the calling
/// task; otherwise each worker is a separate tokio task with a fixed share of the invocations.
pub(crate) async fn execute<O: Operation>(
    op: O,
    config: &RunConfig,
    recorder: Arc<SampleRecorder>,
) -> Result<Duration, HarnessError> {
    let workers = config.workers();
    let limiter = config.tps_limit.map(|tps| Arc::new(rate_limiter(tps)));
    let label: Arc<str> = Arc::from(config.name.as_str());

    #[cfg(feature = "metrics")]
    metrics::describe_histogram!(
        LATENCY_METRIC,
        metrics::Unit::Nanoseconds,
        "Latency of a single operation invocation"
    );

    if workers == 1 {
        let start = Instant::now();
        run_worker(0, op, config.count, &recorder, limiter.as_deref(), &label).await?;
        return Ok(start.elapsed());
    }

    let shares = partition(config.count, workers);
    trace!("Worker shares: {shares:?}");

    // NOTE: Dropping the set aborts any worker still running, so an abandoned run stops issuing
    // calls.
    let mut set = JoinSet::new();
    let mut workers_by_task = HashMap::with_capacity(shares.len());

    let start = Instant::now();
    for (worker, share) in shares.into_iter().enumerate() {
        let op = op.clone();
        let recorder = recorder.clone();
        let limiter = limiter.clone();
        let label = label.clone();
        let handle = set.spawn(async move {
            run_worker(worker, op, share, &recorder, limiter.as_deref(), &label).await
        });
        workers_by_task.insert(handle.id(), worker);
    }

    let mut fault = None;
    while let Some(res) = set.join_next().await {
        let res = match res {
            Ok(res) => res,
            Err(err) => {
                let worker = workers_by_task.get(&err.id()).copied().unwrap_or_default();
                Err(HarnessError::from_join(worker, err))
            }
        };

        if let Err(err) = res {
            error!("Run {label} faulted: {err}");
            fault.get_or_insert(err);
        }
    }
    let elapsed = start.elapsed();

    match fault {
        Some(err) => Err(err),
        None => Ok(elapsed),
    }
}

/// Split `total` invocations over `workers`; the first `total % workers` workers take one extra.
pub(crate) fn partition(total: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|worker| base + usize::from(worker < remainder))
        .collect()
}

async fn run_worker<O: Operation>(
    worker: usize,
    op: O,
    share: usize,
    recorder: &SampleRecorder,
    limiter: Option<&DefaultDirectRateLimiter>,
    label: &str,
) -> Result<(), HarnessError> {
    debug!(operation = label, worker, share, "Worker started");

    for _ in 0..share {
        if let Some(limiter) = limiter {
            limiter.until_ready().await;
        }

        let sample = timed(&op).await;
        #[cfg(feature = "metrics")]
        observe(label, &sample);
        recorder.record(sample)?;
    }

    debug!(operation = label, worker, "Worker finished");
    Ok(())
}

#[cfg(feature = "metrics")]
fn observe(label: &str, sample: &tally_core::Sample) {
    metrics::histogram!(LATENCY_METRIC, "operation" => label.to_string())
        .record(sample.latency().as_nanos() as f64);

    if sample.is_success() {
        metrics::counter!(SUCCESS_METRIC, "operation" => label.to_string()).increment(1);
    } else {
        metrics::counter!(ERROR_METRIC, "operation" => label.to_string()).increment(1);
    }
}

fn rate_limiter(tps_limit: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps_limit).allow_burst(NonZeroU32::MIN))
}
