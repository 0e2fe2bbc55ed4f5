#![cfg_attr(docsrs, feature(doc_cfg))]
//! A benchmark execution harness.
//!
//! `tally` runs an operation a fixed number of times, either sequentially or spread over a fixed
//! pool of concurrent workers, times every invocation and reduces the samples into a
//! [`RunReport`]. Reports are collected into a [`BenchmarkSuite`] and handed to a
//! [`ResultSink`](sink::ResultSink).
//!
//! ```no_run
//! use tally::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut suite = BenchmarkSuite::new();
//!
//!     suite.push(insert_row().target("PostgreSQL").count(1_000).await?);
//!     suite.push(
//!         insert_row()
//!             .name("Concurrent inserts")
//!             .target("PostgreSQL")
//!             .count(1_000)
//!             .concurrency(10)
//!             .await?,
//!     );
//!
//!     JsonFileSink::new("results/postgres-write-results.json").write(&suite)?;
//!     SummarySink::stdout().write(&suite)?;
//!     Ok(())
//! }
//!
//! #[operation]
//! async fn insert_row() -> Result<Metadata, std::io::Error> {
//!     // talk to the database here
//!     Ok(Metadata::new().with("rows_affected", 1.))
//! }
//! ```
extern crate self as tally;

pub mod operation;
pub mod run;
pub mod sink;

mod error;
mod recorder;
mod scheduler;

#[doc(hidden)]
pub use tally_core as core;

pub use error::{HarnessError, SinkError};
pub use operation::Operation;
pub use run::{ConfigurableRun, Run};
pub use tally_core::{
    BenchmarkSuite, Metadata, Outcome, RunConfig, RunReport, Sample, SampleSet, Statistics,
};
pub use tally_macros::operation;

pub mod prelude {
    pub use crate::run::ConfigurableRun;
    pub use crate::sink::{JsonFileSink, ResultSink, SummarySink};
    pub use tally_core::{BenchmarkSuite, Metadata, RunReport};
    pub use tally_macros::operation;
}
