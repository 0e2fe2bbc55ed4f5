use std::any::Any;
use std::sync::PoisonError;
use thiserror::Error;
use tokio::task::JoinError;

/// Faults that make a run unusable.
///
/// Failed operations are never reported through this type; they are samples like any other.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Sample recorder lock is poisoned.")]
    PoisonedRecorder,

    #[error("Sample recorder is still shared after all workers joined.")]
    RecorderShared,

    #[error("Worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    #[error("Worker {worker} was cancelled before finishing its share.")]
    WorkerCancelled { worker: usize },
}

impl HarnessError {
    pub(crate) fn from_join(worker: usize, err: JoinError) -> Self {
        if err.is_panic() {
            Self::WorkerPanicked {
                worker,
                message: panic_message(err.into_panic()),
            }
        } else {
            Self::WorkerCancelled { worker }
        }
    }
}

impl<T> From<PoisonError<T>> for HarnessError {
    fn from(_err: PoisonError<T>) -> Self {
        Self::PoisonedRecorder
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    Json(#[from] serde_json::Error),
}
