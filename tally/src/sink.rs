//! Destinations for a finished [`BenchmarkSuite`].
use crate::SinkError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tally_core::BenchmarkSuite;
use tracing::info;

pub trait ResultSink {
    fn write(&mut self, suite: &BenchmarkSuite) -> Result<(), SinkError>;
}

/// Writes the suite as pretty-printed JSON, `{"results": [...]}`, creating parent directories
/// as needed.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonFileSink {
    fn write(&mut self, suite: &BenchmarkSuite) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(suite)?;
        fs::write(&self.path, data)?;

        info!("Results saved to {}", self.path.display());
        Ok(())
    }
}

/// Prints a human-readable summary of every run.
pub struct SummarySink<W> {
    out: W,
}

impl SummarySink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> SummarySink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for SummarySink<W> {
    fn write(&mut self, suite: &BenchmarkSuite) -> Result<(), SinkError> {
        writeln!(self.out, "=== Benchmark Summary ===")?;
        for report in suite {
            writeln!(self.out)?;
            writeln!(self.out, "{report}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
