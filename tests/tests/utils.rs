use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::FmtSubscriber;

pub const MOCK_ADDR: &str = "127.0.0.1:3002";

#[allow(unused)]
pub fn url(path: &str) -> String {
    format!("http://{MOCK_ADDR}{path}")
}

#[allow(unused)]
pub async fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter("tally=debug,mock_service=debug")
            .try_init();

        let _ = PrometheusBuilder::new()
            .with_http_listener("127.0.0.1:8002".parse::<SocketAddr>().unwrap())
            .install();

        // NOTE: The mock backend gets its own runtime so it outlives the runtime of whichever
        // test happened to start it.
        std::thread::spawn(|| {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let addr: SocketAddr = MOCK_ADDR.parse().unwrap();
                mock_service::run(addr).await.unwrap();
            });
        });
    });

    while tokio::net::TcpStream::connect(MOCK_ADDR).await.is_err() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
