use crate::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_COUNT, DEFAULT_TARGET};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Parameters of a single benchmark run.
#[doc(hidden)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub target: String,
    /// Number of operation invocations.
    pub count: usize,
    /// Requested number of concurrent workers.
    pub concurrency: usize,
    /// Logical operations carried by each invocation.
    pub batch_size: NonZeroU32,
    pub tps_limit: Option<NonZeroU32>,
}

impl RunConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: DEFAULT_TARGET.to_string(),
            count: DEFAULT_COUNT,
            concurrency: DEFAULT_CONCURRENCY,
            batch_size: DEFAULT_BATCH_SIZE,
            tps_limit: None,
        }
    }

    /// Number of workers actually started.
    ///
    /// Concurrency is clamped to `1..=count` so that no worker is started without work. A run
    /// with zero invocations still reports a single (idle) worker.
    pub fn workers(&self) -> usize {
        self.concurrency.clamp(1, self.count.max(1))
    }

    /// Logical operation count, i.e. invocations weighted by the batch size.
    pub fn num_operations(&self) -> u64 {
        self.count as u64 * u64::from(self.batch_size.get())
    }
}
