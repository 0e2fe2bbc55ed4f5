use crate::HarnessError;
use std::sync::{Arc, Mutex};
use tally_core::{Sample, SampleSet};

/// Collects samples from every worker of one run.
///
/// Each insertion takes the lock once. Sample insertion is never the bottleneck of a run (the
/// benchmarked backend is), so a plain mutex is enough.
#[derive(Debug, Default)]
pub(crate) struct SampleRecorder {
    samples: Mutex<Vec<Sample>>,
}

impl SampleRecorder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    pub fn record(&self, sample: Sample) -> Result<(), HarnessError> {
        self.samples.lock()?.push(sample);
        Ok(())
    }

    #[cfg(test)]
    pub fn len(&self) -> Result<usize, HarnessError> {
        Ok(self.samples.lock()?.len())
    }

    /// Consume the recorder once all workers have joined.
    ///
    /// Fails if any other handle to the recorder is still alive, since that means a worker could
    /// still be recording.
    pub fn freeze(self: Arc<Self>) -> Result<SampleSet, HarnessError> {
        let recorder = Arc::try_unwrap(self).map_err(|_| HarnessError::RecorderShared)?;
        let samples = recorder.samples.into_inner()?;
        Ok(samples.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tally_core::Metadata;

    #[test]
    fn concurrent_records_all_land() {
        let recorder = Arc::new(SampleRecorder::with_capacity(400));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let recorder = recorder.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let sample = Sample::success(Duration::from_micros(i), Metadata::new());
                        recorder.record(sample).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len().unwrap(), 400);
        assert_eq!(recorder.freeze().unwrap().len(), 400);
    }

    #[test]
    fn freeze_refuses_shared_recorder() {
        let recorder = Arc::new(SampleRecorder::default());
        let _worker_handle = recorder.clone();

        assert!(matches!(
            recorder.freeze(),
            Err(HarnessError::RecorderShared)
        ));
    }

    #[test]
    fn poisoned_lock_is_a_fault() {
        let recorder = Arc::new(SampleRecorder::default());
        let poisoner = recorder.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.samples.lock().unwrap();
            panic!("poison the recorder");
        })
        .join();

        let sample = Sample::failure(Duration::from_millis(1), "late");
        assert!(matches!(
            recorder.record(sample),
            Err(HarnessError::PoisonedRecorder)
        ));
    }
}
