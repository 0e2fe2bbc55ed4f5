//! Run builder and execution
use crate::operation::Operation;
use crate::recorder::SampleRecorder;
use crate::{scheduler, HarnessError};
use std::{
    future::Future,
    num::NonZeroU32,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tally_core::{RunConfig, RunReport};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

type RunnerFuture = Pin<Box<dyn Future<Output = Result<RunReport, HarnessError>> + Send>>;

/// A configured, not yet started benchmark run.
///
/// Usually created by the [`#[operation]`](tally_macros::operation) macro; awaiting it executes
/// the run and yields its [`RunReport`].
#[pin_project::pin_project]
pub struct Run<T> {
    func: T,
    runner_fut: Option<RunnerFuture>,
    config: RunConfig,
}

impl<T> Run<T> {
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: RunConfig::new(name),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }
}

impl<T> Future for Run<T>
where
    T: Operation,
{
    type Output = Result<RunReport, HarnessError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        if this.runner_fut.is_none() {
            let func = this.func.clone();
            let config = this.config.clone();
            *this.runner_fut = Some(Box::pin(run_operation(func, config)));
        }

        match this.runner_fut {
            Some(runner) => runner.as_mut().poll(cx),
            None => unreachable!(),
        }
    }
}

pub trait ConfigurableRun: Future<Output = Result<RunReport, HarnessError>> + Sized + Send {
    fn name(self, name: &str) -> Self;
    fn target(self, label: &str) -> Self;
    fn count(self, count: usize) -> Self;
    fn concurrency(self, concurrency: usize) -> Self;
    fn batch_size(self, batch_size: NonZeroU32) -> Self;
    fn tps(self, tps: NonZeroU32) -> Self;
}

impl<T> ConfigurableRun for Run<T>
where
    T: Operation,
{
    /// Override the test name, which defaults to the operation's function name.
    ///
    /// # Example
    /// ```no_run
    /// use tally::prelude::*;
    ///
    /// # async fn doc() -> Result<(), tally::HarnessError> {
    /// let report = insert_transaction()
    ///     .name("Single Transaction Inserts")
    ///     .await?;
    /// # Ok(())
    /// # }
    ///
    /// #[operation]
    /// async fn insert_transaction() -> Result<(), std::io::Error> {
    ///     Ok(())
    /// }
    /// ```
    fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    /// Label the system being exercised, e.g. `"PostgreSQL"` or `"DynamoDB"`.
    fn target(mut self, label: &str) -> Self {
        self.config.target = label.to_string();
        self
    }

    /// Number of operation invocations. A count of zero yields an empty report.
    fn count(mut self, count: usize) -> Self {
        self.config.count = count;
        self
    }

    /// Number of concurrent workers.
    ///
    /// A concurrency of one runs every invocation on the awaiting task. Larger values are clamped
    /// to the invocation count.
    ///
    /// # Example
    /// ```no_run
    /// use tally::prelude::*;
    ///
    /// # async fn doc() -> Result<(), tally::HarnessError> {
    /// let report = insert_transaction()
    ///     .count(1_000)
    ///     .concurrency(50)
    ///     .await?;
    /// # Ok(())
    /// # }
    ///
    /// #[operation]
    /// async fn insert_transaction() -> Result<(), std::io::Error> {
    ///     Ok(())
    /// }
    /// ```
    fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Treat every invocation as `batch_size` logical operations, e.g. a batched insert.
    ///
    /// Counts and throughput are reported in logical operations; latencies stay per invocation.
    fn batch_size(mut self, batch_size: NonZeroU32) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Cap the invocation rate across all workers. Time spent waiting for the limiter counts
    /// towards the wall clock but not towards any sample's latency.
    fn tps(mut self, tps: NonZeroU32) -> Self {
        self.config.tps_limit = Some(tps);
        self
    }
}

#[instrument(name = "run", skip_all, fields(name = %config.name, target = %config.target))]
pub(crate) async fn run_operation<O>(op: O, config: RunConfig) -> Result<RunReport, HarnessError>
where
    O: Operation,
{
    info!("Running {} with config {:?}", config.name, &config);

    let workers = config.workers();
    if config.count == 0 {
        warn!("No operations requested; reporting an empty run.");
    } else if workers != config.concurrency {
        warn!(
            "Concurrency {} adjusted to {workers} for {} operations.",
            config.concurrency, config.count
        );
    }

    let recorder = Arc::new(SampleRecorder::with_capacity(config.count));
    let elapsed = scheduler::execute(op, &config, recorder.clone()).await?;
    let samples = recorder.freeze()?;

    let stats = samples.reduce();
    let report = RunReport::assemble(
        &config,
        workers,
        elapsed,
        &stats,
        samples.aggregated_metadata(),
    );

    info!(
        "Run complete: {:.2} ops/sec, {} errors of {} operations",
        report.operations_per_sec, report.error_count, report.num_operations
    );

    Ok(report)
}
