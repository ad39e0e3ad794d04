//! Background expiry sweep.
//!
//! Orders that outlive their payment deadline are cancelled, which also
//! releases their stock reservation. The core only exposes the query and
//! the transition; this task supplies the timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use order_store::{OrderStatus, OrderStore, StoreError};
use orders::{OrderError, OrderService};
use stock_gateway::ReservationGateway;

/// Runs the sweep forever at the given interval.
pub async fn run<S, G>(service: Arc<OrderService<S, G>>, interval: Duration)
where
    S: OrderStore,
    G: ReservationGateway,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sweep_once(service.as_ref()).await {
            Ok(cancelled) if cancelled > 0 => {
                tracing::info!(cancelled, "expiry sweep cancelled overdue orders");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "expiry sweep failed");
            }
        }
    }
}

/// Cancels every order past its deadline; returns how many were cancelled.
///
/// Per-order failures are logged and skipped so one bad order cannot
/// stall the rest. A status conflict just means a payment callback won
/// the race for that order.
pub async fn sweep_once<S, G>(service: &OrderService<S, G>) -> Result<usize, OrderError>
where
    S: OrderStore,
    G: ReservationGateway,
{
    let expired = service.list_expired(Utc::now()).await?;
    let mut cancelled = 0;

    for order in expired {
        match service
            .update_status(order.id, OrderStatus::Cancelled)
            .await
        {
            Ok(()) => cancelled += 1,
            Err(OrderError::Store(StoreError::StatusConflict { .. })) => {
                tracing::debug!(order_id = %order.id, "order settled before the sweep reached it");
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "failed to cancel expired order");
            }
        }
    }

    if cancelled > 0 {
        metrics::counter!("orders_expired_total").increment(cancelled as u64);
    }
    Ok(cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use common::{ProductId, UserId};
    use order_store::InMemoryOrderStore;
    use stock_gateway::{InMemoryReservationGateway, ReservationStatus};

    #[tokio::test]
    async fn sweep_cancels_only_overdue_orders() {
        let store = InMemoryOrderStore::new();
        let gateway = InMemoryReservationGateway::new();

        // Immediately-overdue orders.
        let overdue_service = OrderService::new(
            store.clone(),
            gateway.clone(),
            ChronoDuration::zero(),
        );
        let overdue = overdue_service
            .create_order(UserId::new(1), ProductId::new(10), 1)
            .await
            .unwrap();

        // A fresh order through the same store.
        let fresh_service =
            OrderService::new(store.clone(), gateway.clone(), ChronoDuration::minutes(15));
        let fresh = fresh_service
            .create_order(UserId::new(1), ProductId::new(11), 1)
            .await
            .unwrap();

        let cancelled = sweep_once(&overdue_service).await.unwrap();
        assert_eq!(cancelled, 1);

        assert_eq!(
            store.get(overdue.id).await.unwrap().status,
            OrderStatus::Cancelled
        );
        assert_eq!(
            store.get(fresh.id).await.unwrap().status,
            OrderStatus::WaitingPayment
        );
        assert_eq!(gateway.status_calls().len(), 1);
        assert_eq!(gateway.status_calls()[0].status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn sweep_skips_orders_whose_reservation_call_fails() {
        let store = InMemoryOrderStore::new();
        let gateway = InMemoryReservationGateway::new();
        let service = OrderService::new(store.clone(), gateway.clone(), ChronoDuration::zero());

        let order = service
            .create_order(UserId::new(1), ProductId::new(10), 1)
            .await
            .unwrap();

        gateway.set_fail_on_set_status(true);
        let cancelled = sweep_once(&service).await.unwrap();
        assert_eq!(cancelled, 0);

        // Rolled back; still eligible for the next sweep.
        assert_eq!(
            store.get(order.id).await.unwrap().status,
            OrderStatus::WaitingPayment
        );
    }
}
