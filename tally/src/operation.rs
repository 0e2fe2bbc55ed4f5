//! The unit of work a run measures.
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tally_core::{Metadata, Sample};

/// A benchmarked action.
///
/// Anything that can be called repeatedly to produce a future resolving to `Result<R, E>` is an
/// operation, as long as `R` converts into [`Metadata`] (use `()` when there is nothing to
/// report) and `E` can be displayed. Closures capture whatever the action needs, such as a pooled
/// client or a set of account ids:
///
/// ```
/// use tally::{Metadata, Operation};
///
/// let accounts = std::sync::Arc::new(vec![1u64, 2, 3]);
/// let op = move || {
///     let accounts = accounts.clone();
///     async move {
///         let rows = accounts.len() as f64;
///         Ok::<_, std::io::Error>(Metadata::new().with("rows", rows))
///     }
/// };
/// # fn assert_operation<O: Operation>(_: &O) {}
/// # assert_operation(&op);
/// ```
///
/// With a concurrency above one the operation is cloned into every worker and invoked from
/// several tasks at once.
pub trait Operation: Clone + Send + Sync + 'static {
    type Output: Into<Metadata> + Send + 'static;
    type Error: fmt::Display + Send + 'static;
    type Future: Future<Output = Result<Self::Output, Self::Error>> + Send + 'static;

    fn invoke(&self) -> Self::Future;
}

impl<T, F, R, E> Operation for T
where
    T: Fn() -> F + Clone + Send + Sync + 'static,
    F: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<Metadata> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Output = R;
    type Error = E;
    type Future = F;

    fn invoke(&self) -> Self::Future {
        self()
    }
}

/// Invoke the operation once, timing from just before the call until its future resolves.
pub(crate) async fn timed<O: Operation>(op: &O) -> Sample {
    let start = Instant::now();
    let res = op.invoke().await;
    let elapsed = start.elapsed();
    Sample::from_result(res, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn failed_invocation_is_timed() {
        let op = || async {
            tokio::time::sleep(Duration::from_millis(2)).await;
            Err::<(), _>("throttled")
        };

        let sample = timed(&op).await;
        assert!(!sample.is_success());
        assert!(sample.latency() >= Duration::from_millis(2));
    }

    #[tokio::test]
    async fn metadata_passed_through() {
        let op = || async { Ok::<_, String>(Metadata::new().with("consumed_wcu", 1.)) };

        let sample = timed(&op).await;
        assert!(sample.is_success());
        assert_eq!(sample.metadata().get("consumed_wcu"), Some(1.));
    }
}
