//! The lifecycle orchestrator.

use chrono::{DateTime, Duration, Utc};

use common::{OrderId, ProductId, UserId};
use order_store::{NewOrder, Order, OrderStatus, OrderStore, OrderTx};
use stock_gateway::{ReservationGateway, ReservationStatus};

use crate::error::{OrderError, Result};

/// Orchestrates the order lifecycle across the local store and the
/// remote reservation.
///
/// Every write opens a local transaction, performs the local mutation,
/// then issues the matching gateway call while the scope is still open;
/// the scope commits only when both sides succeeded. The reservation
/// call itself is not transactional: a timeout may leave a reservation
/// applied remotely while the local side rolls back, and no retry or
/// compensation is attempted here.
pub struct OrderService<S, G>
where
    S: OrderStore,
    G: ReservationGateway,
{
    store: S,
    gateway: G,
    reservation_ttl: Duration,
}

impl<S, G> Clone for OrderService<S, G>
where
    S: OrderStore + Clone,
    G: ReservationGateway + Clone,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
            reservation_ttl: self.reservation_ttl,
        }
    }
}

impl<S, G> OrderService<S, G>
where
    S: OrderStore,
    G: ReservationGateway,
{
    /// Creates a new lifecycle orchestrator.
    ///
    /// `reservation_ttl` is how long a fresh order may stay in
    /// `waiting_payment` before the expiry sweep cancels it.
    pub fn new(store: S, gateway: G, reservation_ttl: Duration) -> Self {
        Self {
            store,
            gateway,
            reservation_ttl,
        }
    }

    /// Creates an order and its stock reservation as one logical unit.
    ///
    /// The caller is responsible for validating `quantity > 0` before
    /// invoking this. On any failure no order becomes visible: a store
    /// failure never reaches the gateway, and a gateway failure rolls
    /// the insert back before the error propagates.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Order> {
        let new_order = NewOrder {
            product_id,
            quantity,
            user_id,
            status: OrderStatus::WaitingPayment,
            expires_at: Utc::now() + self.reservation_ttl,
        };

        let mut tx = self.store.begin().await?;
        let order = tx.create(new_order).await?;

        if let Err(e) = self
            .gateway
            .reserve(order.product_id, order.quantity, order.id)
            .await
        {
            tracing::error!(order_id = %order.id, error = %e, "stock reservation failed, rolling back order");
            metrics::counter!("orders_create_failures_total").increment(1);
            rollback_logged(tx).await;
            return Err(e.into());
        }

        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, "order created");
        Ok(order)
    }

    /// Transitions an order out of `waiting_payment` and patches the
    /// reservation to match.
    ///
    /// Only `paid` and `cancelled` are accepted; anything else is
    /// rejected before any store write or remote call. The local write
    /// is conditional on the order still being in `waiting_payment`, so
    /// of two concurrent transitions exactly one wins and the loser
    /// observes a conflict.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: OrderId, requested: OrderStatus) -> Result<()> {
        let reservation_status = match requested {
            OrderStatus::Paid => ReservationStatus::Completed,
            OrderStatus::Cancelled => ReservationStatus::Cancelled,
            other => return Err(OrderError::InvalidStatus(other)),
        };

        let mut tx = self.store.begin().await?;
        tx.update_status(order_id, OrderStatus::WaitingPayment, requested)
            .await?;

        if let Err(e) = self.gateway.set_status(order_id, reservation_status).await {
            tracing::error!(%order_id, error = %e, "reservation status update failed, rolling back");
            metrics::counter!("order_status_update_failures_total").increment(1);
            rollback_logged(tx).await;
            return Err(e.into());
        }

        tx.commit().await?;

        metrics::counter!("order_status_updates_total", "status" => requested.as_str()).increment(1);
        tracing::info!(%order_id, status = %requested, "order status updated");
        Ok(())
    }

    /// Fetches an order on behalf of a user.
    ///
    /// A missing order is `NotFound` regardless of the requesting user;
    /// an existing order owned by someone else is `Forbidden`.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let order = self.store.get(order_id).await?;

        if order.user_id != user_id {
            tracing::warn!(%order_id, %user_id, owner = %order.user_id, "ownership mismatch");
            return Err(OrderError::Forbidden(order_id));
        }

        Ok(order)
    }

    /// Returns all orders owned by the user; empty when there are none.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    /// Returns orders still awaiting payment past their deadline.
    ///
    /// Consumed by the expiry sweep, which is expected to drive
    /// [`OrderService::update_status`] with `cancelled` for each.
    #[tracing::instrument(skip(self))]
    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        Ok(self.store.list_expired(now).await?)
    }
}

/// Rolls the scope back, keeping the original failure as the caller's
/// error even if the rollback itself fails.
async fn rollback_logged<T: OrderTx>(tx: T) {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, "transaction rollback failed");
    }
}
