//! Reservation gateway trait and status mapping types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::{OrderId, ProductId};

use crate::error::Result;

/// The status a reservation can be patched to once created.
///
/// The orchestrator maps order `cancelled` to [`ReservationStatus::Cancelled`]
/// and order `paid` to [`ReservationStatus::Completed`]; no other order
/// status reaches the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Returns the wire form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for stock reservation operations against the warehouse service.
#[async_trait]
pub trait ReservationGateway: Send + Sync {
    /// Creates a reservation for the given order.
    async fn reserve(&self, product_id: ProductId, quantity: i64, order_id: OrderId)
    -> Result<()>;

    /// Updates the status of the reservation tied to the order.
    async fn set_status(&self, order_id: OrderId, status: ReservationStatus) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(ReservationStatus::Completed.to_string(), "completed");
    }
}
