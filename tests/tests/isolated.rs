mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;

    use reqwest::Client;
    use serde::Deserialize;
    use std::sync::OnceLock;
    use std::time::Duration;
    use tally::prelude::*;
    use tally::{Operation, Run};

    #[derive(Deserialize)]
    struct Consumed {
        consumed_capacity: f64,
    }

    fn get_op(client: Client, url: String) -> impl Operation {
        move || {
            let client = client.clone();
            let url = url.clone();
            async move {
                let res = client.get(&url).send().await?.error_for_status()?;
                let consumed: Consumed = res.json().await?;
                Ok::<_, reqwest::Error>(
                    Metadata::new().with("consumed_capacity", consumed.consumed_capacity),
                )
            }
        }
    }

    #[tokio::test]
    async fn sequential_baseline() {
        init().await;

        let report = Run::new("GetItem", get_op(Client::new(), url("/delay/ms/2")))
            .target("mock")
            .count(200)
            .await
            .unwrap();

        assert_eq!(report.success_count, 200);
        assert_eq!(report.error_count, 0);
        assert!(report.p99_duration >= Duration::from_millis(2));
        assert!(report.p99_duration >= report.p95_duration);
        assert!(report.p95_duration >= report.median_duration);
        assert_eq!(
            report.aggregated_metadata.get("consumed_capacity"),
            Some(200.)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_raises_throughput() {
        init().await;

        let client = Client::new();
        let sequential = Run::new("sequential", get_op(client.clone(), url("/delay/ms/10")))
            .count(100)
            .await
            .unwrap();
        let concurrent = Run::new("concurrent", get_op(client, url("/delay/ms/10")))
            .count(100)
            .concurrency(10)
            .await
            .unwrap();

        assert_eq!(concurrent.workers, 10);
        assert!(dbg!(concurrent.operations_per_sec) > dbg!(sequential.operations_per_sec) * 4.);
        assert!(concurrent.total_duration * 4 < sequential.total_duration);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn failing_endpoint_recorded_as_errors() {
        init().await;

        let report = Run::new("always fails", get_op(Client::new(), url("/fail/ms/1")))
            .count(50)
            .concurrency(5)
            .await
            .unwrap();

        assert_eq!(report.error_count, 50);
        assert_eq!(report.success_count, 0);
        assert!(report.min_duration >= Duration::from_millis(1));
        assert!(report.aggregated_metadata.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn over_capacity_partial_failure() {
        init().await;

        let report = Run::new(
            "over capacity",
            get_op(Client::new(), url("/max/100/delay/ms/1/table/accounts")),
        )
        .count(400)
        .concurrency(20)
        .await
        .unwrap();

        assert_eq!(report.success_count + report.error_count, 400);
        assert!(dbg!(report.error_count) > 0);
        assert!(report.success_count > 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn backend_queueing_shows_as_latency() {
        init().await;

        let report = Run::new(
            "queued",
            get_op(Client::new(), url("/limited/50/delay/ms/1/server/queue-a")),
        )
        .count(100)
        .concurrency(10)
        .await
        .unwrap();

        // 50 calls fit the burst; the other 50 are released at 50/s.
        assert_eq!(report.error_count, 0);
        assert_eq!(report.success_count, 100);
        assert!(report.total_duration >= Duration::from_millis(900));
        assert!(dbg!(report.p99_duration) >= Duration::from_millis(50));
        assert!(report.p99_duration > report.min_duration * 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn jittered_latency_spreads_percentiles() {
        init().await;

        let report = Run::new("jitter", get_op(Client::new(), url("/jitter/ms/5/3")))
            .count(300)
            .concurrency(10)
            .await
            .unwrap();

        assert_eq!(report.success_count, 300);
        assert!(report.p99_duration >= report.p95_duration);
        assert!(report.p95_duration >= report.median_duration);
        assert!(report.max_duration > report.min_duration);
        assert!(report.std_dev_duration > Duration::ZERO);
    }

    static CLIENT: OnceLock<Client> = OnceLock::new();

    #[operation]
    async fn write_transaction() -> Result<Metadata, reqwest::Error> {
        let client = CLIENT.get_or_init(Client::new);
        let consumed: Consumed = client
            .get(url("/delay/ms/1"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Metadata::new().with("consumed_wcu", consumed.consumed_capacity))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn suite_written_to_json() {
        init().await;

        let mut suite = BenchmarkSuite::new();
        for concurrency in [1, 10, 50] {
            let report = write_transaction()
                .name(&format!("Concurrent Writes ({concurrency} workers)"))
                .target("mock")
                .count(200)
                .concurrency(concurrency)
                .await
                .unwrap();
            suite.push(report);
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mock-write-results.json");
        JsonFileSink::new(&path).write(&suite).unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let results = written["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        for result in results {
            assert_eq!(result["num_operations"], 200);
            assert_eq!(result["aggregated_metadata"]["consumed_wcu"], 200.0);
        }
    }
}
