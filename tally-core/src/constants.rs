use std::num::NonZeroU32;

/// Invocation count used when a run is not given one explicitly.
pub const DEFAULT_COUNT: usize = 1_000;

/// Runs are sequential unless asked otherwise.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Each invocation stands for a single logical operation by default.
pub const DEFAULT_BATCH_SIZE: NonZeroU32 = NonZeroU32::MIN;

/// Target label used when a run does not name the system it exercises.
pub const DEFAULT_TARGET: &str = "unlabeled";

pub const P95_QUANTILE: f64 = 0.95;
pub const P99_QUANTILE: f64 = 0.99;
