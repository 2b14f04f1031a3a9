// HTTP routes: Prometheus scrape endpoint and service version

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::gauge_registry::GaugeRegistry;

pub const METRICS_PATH: &str = "/metrics";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gauges: Arc<GaugeRegistry>,
}

pub fn app(gauges: Arc<GaugeRegistry>) -> Router {
    let state = AppState { gauges };
    Router::new()
        .route(METRICS_PATH, get(http::metrics_handler)) // GET /metrics
        .route("/version", get(http::version_handler)) // GET /version
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
