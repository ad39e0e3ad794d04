//! The order record and its lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::{OrderId, ProductId, UserId};

/// The lifecycle status of an order.
///
/// Transitions:
/// ```text
/// WaitingPayment ──┬──► Paid
///                  └──► Cancelled
/// ```
///
/// `Paid` and `Cancelled` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is created, the reservation is held, payment is pending.
    #[default]
    WaitingPayment,

    /// Payment confirmed (terminal state).
    Paid,

    /// Order was cancelled, by the user or by reservation expiry
    /// (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the state machine allows moving to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::WaitingPayment, OrderStatus::Paid)
                | (OrderStatus::WaitingPayment, OrderStatus::Cancelled)
        )
    }

    /// Returns true if no further transitions leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Returns the wire/database form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::WaitingPayment => "waiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "waiting_payment" => Ok(OrderStatus::WaitingPayment),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A durable order record.
///
/// Orders are created in `WaitingPayment`, mutated only through the
/// lifecycle orchestrator, and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Deadline by which payment must complete before the reservation
    /// is released.
    pub expires_at: DateTime<Utc>,
}

/// An order about to be persisted; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub quantity: i64,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn default_status_is_waiting_payment() {
        assert_eq!(OrderStatus::default(), OrderStatus::WaitingPayment);
    }

    #[test]
    fn waiting_payment_can_move_to_both_terminals() {
        assert!(OrderStatus::WaitingPayment.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::WaitingPayment.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn no_transition_leaves_a_terminal_status() {
        for from in [OrderStatus::Paid, OrderStatus::Cancelled] {
            for to in [
                OrderStatus::WaitingPayment,
                OrderStatus::Paid,
                OrderStatus::Cancelled,
            ] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn self_transition_is_rejected() {
        assert!(!OrderStatus::WaitingPayment.can_transition_to(OrderStatus::WaitingPayment));
    }

    #[test]
    fn terminal_states() {
        assert!(!OrderStatus::WaitingPayment.is_terminal());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_round_trips_through_wire_form() {
        for status in [
            OrderStatus::WaitingPayment,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_fails_to_parse() {
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let json = serde_json::to_string(&OrderStatus::WaitingPayment).unwrap();
        assert_eq!(json, "\"waiting_payment\"");
    }
}
