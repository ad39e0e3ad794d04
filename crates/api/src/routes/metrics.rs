//! Prometheus exposition endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — renders the recorder's current snapshot in the
/// Prometheus text exposition format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    let headers = [(axum::http::header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)];
    (headers, handle.render())
}
