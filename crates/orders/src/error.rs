//! Orchestrator error types.

use thiserror::Error;

use common::OrderId;
use order_store::{OrderStatus, StoreError};
use stock_gateway::GatewayError;

/// Errors that can occur during order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The requested status is not a valid transition target; only
    /// `paid` and `cancelled` can be requested.
    #[error("status {0} is not a valid transition target")]
    InvalidStatus(OrderStatus),

    /// The order exists but belongs to another user.
    #[error("order {0} does not belong to the requesting user")]
    Forbidden(OrderId),

    /// Local store failure; covers the not-found and conflict cases.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Remote reservation failure, including timeout.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, OrderError>;
