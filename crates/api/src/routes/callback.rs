//! Payment system callback endpoint.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use common::OrderId;
use order_store::{OrderStatus, OrderStore};
use stock_gateway::ReservationGateway;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub order_id: i64,
    pub status: String,
}

#[derive(Serialize)]
pub struct UpdateStatusResponse {
    pub status: &'static str,
}

/// POST /callback/order-service/orders — transition an order on behalf
/// of the payment system.
#[tracing::instrument(skip(state, req), fields(order_id = req.order_id, status = %req.status))]
pub async fn update_status<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError>
where
    S: OrderStore + 'static,
    G: ReservationGateway + 'static,
{
    if req.order_id <= 0 {
        return Err(ApiError::BadRequest("invalid order id".to_string()));
    }

    let requested = OrderStatus::from_str(&req.status)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .order_service
        .update_status(OrderId::new(req.order_id), requested)
        .await?;

    Ok(Json(UpdateStatusResponse { status: "ok" }))
}
