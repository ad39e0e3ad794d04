//! In-memory reservation gateway for testing.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use common::{OrderId, ProductId};

use crate::error::{GatewayError, Result};
use crate::gateway::{ReservationGateway, ReservationStatus};

/// A recorded `reserve` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveCall {
    pub product_id: ProductId,
    pub quantity: i64,
    pub order_id: OrderId,
}

/// A recorded `set_status` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCall {
    pub order_id: OrderId,
    pub status: ReservationStatus,
}

#[derive(Debug, Default)]
struct GatewayState {
    reserve_calls: Vec<ReserveCall>,
    status_calls: Vec<StatusCall>,
    fail_on_reserve: bool,
    fail_on_set_status: bool,
}

/// In-memory reservation gateway that records every call and can be
/// switched to fail, mirroring the warehouse service's failure modes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryReservationGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail reserve calls.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Configures the gateway to fail set_status calls.
    pub fn set_fail_on_set_status(&self, fail: bool) {
        self.state.write().unwrap().fail_on_set_status = fail;
    }

    /// Returns all recorded reserve calls.
    pub fn reserve_calls(&self) -> Vec<ReserveCall> {
        self.state.read().unwrap().reserve_calls.clone()
    }

    /// Returns all recorded set_status calls.
    pub fn status_calls(&self) -> Vec<StatusCall> {
        self.state.read().unwrap().status_calls.clone()
    }
}

#[async_trait]
impl ReservationGateway for InMemoryReservationGateway {
    async fn reserve(
        &self,
        product_id: ProductId,
        quantity: i64,
        order_id: OrderId,
    ) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_reserve {
            return Err(GatewayError::UnexpectedStatus {
                operation: "reserve",
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }

        state.reserve_calls.push(ReserveCall {
            product_id,
            quantity,
            order_id,
        });
        Ok(())
    }

    async fn set_status(&self, order_id: OrderId, status: ReservationStatus) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_set_status {
            return Err(GatewayError::UnexpectedStatus {
                operation: "set_status",
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }

        state.status_calls.push(StatusCall { order_id, status });
        Ok(())
    }
}
