use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use reqwest::Client;
use serde::Deserialize;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;
use tally::prelude::*;
use tally::{Operation, Run};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Benchmark the mock backend and write the results as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Invocations per run
    #[arg(short, long, default_value_t = 1_000)]
    count: usize,

    /// Worker counts for the concurrency sweep
    #[arg(long, value_delimiter = ',', default_values_t = [10, 50, 100])]
    concurrency: Vec<usize>,

    /// Per-request latency of the mock backend
    #[arg(short, long, default_value_t = 2)]
    latency_ms: u64,

    /// Records written per call in the batch run
    #[arg(short, long, default_value = "25")]
    batch_size: NonZeroU32,

    /// Where to write the JSON results
    #[arg(short, long, default_value = "results/mock-results.json")]
    output: PathBuf,

    /// Address the in-process mock backend binds to
    #[arg(long, default_value = "127.0.0.1:3002")]
    mock_addr: SocketAddr,

    /// Serve Prometheus metrics on this address while running
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[derive(Deserialize)]
struct Consumed {
    consumed_capacity: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tally=info,tally_bench=info")),
        )
        .init();

    let args = Args::parse();

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("installing Prometheus exporter")?;
    }

    let mock_addr = args.mock_addr;
    tokio::spawn(async move {
        if let Err(err) = mock_service::run(mock_addr).await {
            tracing::error!("Mock backend stopped: {err:#}");
        }
    });
    let mut attempts = 0;
    while tokio::net::TcpStream::connect(mock_addr).await.is_err() {
        attempts += 1;
        anyhow::ensure!(attempts < 100, "mock backend never came up on {mock_addr}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let client = Client::new();
    let base = format!("http://{}", args.mock_addr);
    let delay_url = format!("{base}/delay/ms/{}", args.latency_ms);
    let mut suite = BenchmarkSuite::new();

    info!("Running sequential baseline");
    suite.push(
        Run::new("Sequential GetItem", get_op(client.clone(), delay_url.clone()))
            .target("mock")
            .count(args.count)
            .await?,
    );

    for &concurrency in &args.concurrency {
        info!("Running with {concurrency} workers");
        suite.push(
            Run::new(
                &format!("Concurrent GetItem ({concurrency} workers)"),
                get_op(client.clone(), delay_url.clone()),
            )
            .target("mock")
            .count(args.count)
            .concurrency(concurrency)
            .await?,
        );
    }

    info!("Running with jittered latency");
    suite.push(
        Run::new(
            "Jittered GetItem",
            get_op(
                client.clone(),
                format!("{base}/jitter/ms/{}/{}", args.latency_ms, args.latency_ms.max(1)),
            ),
        )
        .target("mock")
        .count(args.count)
        .concurrency(10)
        .await?,
    );

    info!("Running batch writes of {}", args.batch_size);
    suite.push(
        Run::new(
            &format!("BatchWriteItem (batch of {})", args.batch_size),
            get_op(client.clone(), delay_url),
        )
        .target("mock")
        .count(args.count / args.batch_size.get() as usize)
        .concurrency(10)
        .batch_size(args.batch_size)
        .await?,
    );

    info!("Running against the failing endpoint");
    suite.push(
        Run::new(
            "Failing GetItem",
            get_op(client, format!("{base}/fail/ms/{}", args.latency_ms)),
        )
        .target("mock")
        .count(args.count)
        .concurrency(10)
        .await?,
    );

    JsonFileSink::new(&args.output)
        .write(&suite)
        .with_context(|| format!("writing {}", args.output.display()))?;
    SummarySink::stdout().write(&suite)?;

    Ok(())
}

fn get_op(client: Client, url: String) -> impl Operation {
    move || {
        let client = client.clone();
        let url = url.clone();
        async move {
            let consumed: Consumed = client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok::<_, reqwest::Error>(
                Metadata::new().with("consumed_capacity", consumed.consumed_capacity),
            )
        }
    }
}
