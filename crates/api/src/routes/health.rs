//! Liveness and readiness endpoints.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /live — liveness probe.
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /ready — readiness probe.
pub async fn ready() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
