//! Data model shared by the `tally` benchmark harness.
//!
//! Everything in here is plain data: samples captured by the scheduler, the
//! statistics reduced from them, and the reports handed to result sinks.
mod config;
mod constants;
mod data;
mod metadata;
mod report;
mod stats;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use metadata::*;
pub use report::*;
pub use stats::*;
