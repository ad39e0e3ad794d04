//! HTTP API server with observability for the order service.
//!
//! Exposes REST endpoints for order management and the payment callback,
//! with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod sweep;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use stock_gateway::ReservationGateway;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use auth::AuthState;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(
    state: Arc<AppState<S, G>>,
    auth_state: AuthState,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: OrderStore + 'static,
    G: ReservationGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let user_routes = Router::new()
        .route("/orders", post(routes::orders::create::<S, G>))
        .route("/orders", get(routes::orders::list::<S, G>))
        .route("/orders/{id}", get(routes::orders::get::<S, G>))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth::require_user,
        ))
        .with_state(state.clone());

    let callback_routes = Router::new()
        .route("/orders", post(routes::callback::update_status::<S, G>))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            auth::require_payment,
        ))
        .with_state(state);

    Router::new()
        .route("/live", get(routes::health::live))
        .route("/ready", get(routes::health::ready))
        .nest("/order-service", user_routes)
        .nest("/callback/order-service", callback_routes)
        .merge(metrics_router)
        // Layers run outermost-last: the request id is assigned before
        // TraceLayer opens its span and echoed onto the response.
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
