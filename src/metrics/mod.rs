
use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::constants::CONTROLLER_NAME;

lazy_static! {
    pub static ref EVENTS_DISPATCHED: IntCounterVec = IntCounterVec::new(
        Opts::new("events_dispatched", "Change events handed to a handler").namespace(CONTROLLER_NAME),
        &["kind", "event"]
    )
    .expect("metric can not be created");

    pub static ref HANDLER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("handler_failures", "Change events whose handler returned an error")
            .namespace(CONTROLLER_NAME),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REMEDIATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("remediations", "Remediation actions by outcome").namespace(CONTROLLER_NAME),
        &["action", "outcome"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_errors", "Errors reported by watch streams").namespace(CONTROLLER_NAME),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref CACHE_ENTRIES: IntGaugeVec = IntGaugeVec::new(
        Opts::new("cache_entries", "Resources currently held in the cache").namespace(CONTROLLER_NAME),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(EVENTS_DISPATCHED.clone()))?;
    registry.register(Box::new(HANDLER_FAILURES.clone()))?;
    registry.register(Box::new(REMEDIATIONS.clone()))?;
    registry.register(Box::new(WATCH_ERRORS.clone()))?;
    registry.register(Box::new(CACHE_ENTRIES.clone()))?;
    Ok(())
}

/// Serves `/metrics` on `port` until `shutdown` is cancelled.
pub async fn start_server(
    port: u16,
    shutdown: CancellationToken,
) {
    if let Err(e) = register_custom_metrics(&REGISTRY) {
        warn!("metrics registration: {}", e);
    }

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    let (addr, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            shutdown.cancelled().await;
        });
    info!("metrics server listening on {}", addr);
    server.await;
    info!("metrics server stopped");
}

async fn metrics_handler(registry: Registry) -> Result<impl Reply, Rejection> {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode metrics: {}", e);
    }
    let body = String::from_utf8(buffer).unwrap_or_else(|e| {
        error!("metrics are not valid utf8: {}", e);
        String::default()
    });
    Ok(body)
}
