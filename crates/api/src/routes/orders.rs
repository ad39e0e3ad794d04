//! User-facing order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{OrderId, ProductId};
use order_store::{Order, OrderStatus, OrderStore};
use orders::OrderService;
use stock_gateway::ReservationGateway;

use crate::auth::AuthUser;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore, G: ReservationGateway> {
    pub order_service: OrderService<S, G>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: i64,
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.as_i64(),
            product_id: order.product_id.as_i64(),
            quantity: order.quantity,
            user_id: order.user_id.as_i64(),
            status: order.status,
            created_at: order.created_at,
            updated_at: order.updated_at,
            expires_at: order.expires_at,
        }
    }
}

// -- Handlers --

/// POST /order-service/orders — create an order and its reservation.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError>
where
    S: OrderStore + 'static,
    G: ReservationGateway + 'static,
{
    if req.quantity <= 0 {
        return Err(ApiError::BadRequest("quantity must be positive".to_string()));
    }

    let order = state
        .order_service
        .create_order(user_id, ProductId::new(req.product_id), req.quantity)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(order.into())))
}

/// GET /order-service/orders/{id} — load one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: OrderStore + 'static,
    G: ReservationGateway + 'static,
{
    if id <= 0 {
        return Err(ApiError::BadRequest("invalid order id".to_string()));
    }

    let order = state
        .order_service
        .get_order(user_id, OrderId::new(id))
        .await?;

    Ok(Json(order.into()))
}

/// GET /order-service/orders — list the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn list<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: OrderStore + 'static,
    G: ReservationGateway + 'static,
{
    let orders = state.order_service.list_by_user(user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
