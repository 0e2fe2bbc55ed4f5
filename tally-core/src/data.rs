use crate::{Metadata, Statistics};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// A single measured operation invocation.
#[derive(Debug, Clone)]
pub struct Sample {
    latency: Duration,
    outcome: Outcome,
    metadata: Metadata,
}

impl Sample {
    pub fn success(latency: Duration, metadata: Metadata) -> Self {
        Self {
            latency,
            outcome: Outcome::Success,
            metadata,
        }
    }

    pub fn failure(latency: Duration, reason: impl Into<String>) -> Self {
        Self {
            latency,
            outcome: Outcome::Failure(reason.into()),
            metadata: Metadata::default(),
        }
    }

    pub fn from_result<R, E>(res: Result<R, E>, latency: Duration) -> Self
    where
        R: Into<Metadata>,
        E: fmt::Display,
    {
        match res {
            Ok(meta) => Self::success(latency, meta.into()),
            Err(err) => Self::failure(latency, err.to_string()),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Samples of one run, in completion order.
///
/// There is no way to push into a `SampleSet`; it is built once from the recorder's contents
/// after every worker has finished.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn latencies(&self) -> Vec<Duration> {
        self.samples.iter().map(Sample::latency).collect()
    }

    /// Sum of the metadata of every successful sample.
    pub fn aggregated_metadata(&self) -> Metadata {
        self.samples
            .iter()
            .filter(|s| s.is_success())
            .fold(Metadata::new(), |mut acc, s| {
                acc.merge(s.metadata());
                acc
            })
    }

    pub fn reduce(&self) -> Statistics {
        Statistics::reduce(self)
    }
}

impl From<Vec<Sample>> for SampleSet {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

impl FromIterator<Sample> for SampleSet {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
