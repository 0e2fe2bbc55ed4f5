//! A stand-in storage backend for exercising the harness over HTTP.
//!
//! Every endpoint sleeps for a configurable latency before answering, so runs against it have a
//! known per-call cost. Some endpoints fail on purpose or start failing once over capacity.
use axum::{debug_handler, extract::Path, http::StatusCode, routing::get, Json, Router};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lazy_static::lazy_static;
use metrics::counter;
use rand_distr::{Distribution, SkewNormal};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Capacity consumed by a single successful request.
pub const CAPACITY_PER_REQUEST: f64 = 1.0;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Consumed {
    pub consumed_capacity: f64,
}

pub fn router() -> Router {
    Router::new()
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/jitter/ms/:mean_ms/:std_ms", get(jitter))
        .route("/fail/ms/:delay_ms", get(fail))
        .route(
            "/max/:max_tps/delay/ms/:delay_ms/table/:table_name",
            get(max),
        )
        .route(
            "/limited/:max_tps/delay/ms/:delay_ms/server/:server_id",
            get(limited),
        )
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    debug!("Mock backend listening on {addr}");
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Fixed latency, always succeeds.
#[debug_handler]
pub async fn delay(Path(delay_ms): Path<u64>) -> Json<Consumed> {
    record_request();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    Json(Consumed {
        consumed_capacity: CAPACITY_PER_REQUEST,
    })
}

/// Skewed random latency around `mean_ms`, always succeeds.
#[debug_handler]
pub async fn jitter(
    Path((mean_ms, std_ms)): Path<(u64, u64)>,
) -> Result<Json<Consumed>, StatusCode> {
    record_request();
    let normal = SkewNormal::new(mean_ms as f64, std_ms as f64, 20.)
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let v: f64 = normal.sample(&mut rand::thread_rng()).max(0.);
    tokio::time::sleep(Duration::from_secs_f64(v / 1_000.)).await;
    Ok(Json(Consumed {
        consumed_capacity: CAPACITY_PER_REQUEST,
    }))
}

/// Fixed latency, always fails.
#[debug_handler]
pub async fn fail(Path(delay_ms): Path<u64>) -> StatusCode {
    record_request();
    counter!("mock-service.errors").increment(1);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    StatusCode::INTERNAL_SERVER_ERROR
}

lazy_static! {
    static ref MAX_MAP: Arc<RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Fixed latency; requests beyond `max_tps` for a given table are rejected.
#[debug_handler]
pub async fn max(
    Path((max_tps, delay_ms, table_name)): Path<(u32, u64, String)>,
) -> Result<Json<Consumed>, StatusCode> {
    record_request();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let limiter = limiter_for(&MAX_MAP, table_name, max_tps)?;
    match limiter.check() {
        Ok(_) => Ok(Json(Consumed {
            consumed_capacity: CAPACITY_PER_REQUEST,
        })),
        Err(_) => {
            debug!("Throttled request");
            counter!("mock-service.errors").increment(1);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

lazy_static! {
    static ref LIMITED_MAP: Arc<RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

/// Fixed latency; requests beyond `max_tps` per server queue up instead of failing.
#[debug_handler]
pub async fn limited(
    Path((max_tps, delay_ms, server_id)): Path<(u32, u64, String)>,
) -> Result<Json<Consumed>, StatusCode> {
    record_request();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let limiter = limiter_for(&LIMITED_MAP, server_id, max_tps)?;
    limiter.until_ready().await;

    Ok(Json(Consumed {
        consumed_capacity: CAPACITY_PER_REQUEST,
    }))
}

/** Utils **/

fn limiter_for(
    map: &RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>,
    key: String,
    max_tps: u32,
) -> Result<Arc<DefaultDirectRateLimiter>, StatusCode> {
    let read = map
        .read()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .get(&key)
        .cloned();
    if let Some(limiter) = read {
        return Ok(limiter);
    }

    let limiter = Arc::new(rate_limiter(max_tps).ok_or(StatusCode::BAD_REQUEST)?);
    let mut map = map.write().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(map.entry(key).or_insert(limiter).clone())
}

pub fn rate_limiter(tps: u32) -> Option<DefaultDirectRateLimiter> {
    NonZeroU32::new(tps).map(|tps| RateLimiter::direct(Quota::per_second(tps)))
}

/** TPS Printer **/

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

fn record_request() {
    counter!("mock-service.requests").increment(1);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
}

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let transactions = TPS_MEASURE.swap(0, Ordering::Relaxed);
        debug!("{transactions} TPS");
    }
}
