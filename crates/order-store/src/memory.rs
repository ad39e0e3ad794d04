use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use common::{OrderId, UserId};

use crate::error::{Result, StoreError};
use crate::order::{NewOrder, Order, OrderStatus};
use crate::store::{OrderStore, OrderTx};

#[derive(Debug, Default)]
struct MemoryState {
    orders: BTreeMap<i64, Order>,
    next_id: i64,
}

/// In-memory order store implementation for testing.
///
/// Provides the same contract as the PostgreSQL implementation, including
/// transaction scopes: writes are staged on the scope and only become
/// visible on commit.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all orders.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.next_id = 0;
    }
}

/// A staging transaction over the in-memory store.
///
/// Ids are drawn from the shared sequence at create time, like a database
/// sequence, so a rolled-back scope still consumes them.
pub struct MemoryOrderTx {
    state: Arc<RwLock<MemoryState>>,
    staged: BTreeMap<i64, Order>,
    // Status each committed row was in when this scope first read it,
    // re-checked at commit to refuse overwriting a racing transition.
    observed: BTreeMap<i64, OrderStatus>,
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    type Tx = MemoryOrderTx;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(MemoryOrderTx {
            state: self.state.clone(),
            staged: BTreeMap::new(),
            observed: BTreeMap::new(),
        })
    }

    async fn get(&self, id: OrderId) -> Result<Order> {
        self.state
            .read()
            .await
            .orders
            .get(&id.as_i64())
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        Ok(self
            .state
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::WaitingPayment && o.expires_at < now)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderTx for MemoryOrderTx {
    async fn create(&mut self, order: NewOrder) -> Result<Order> {
        let id = {
            let mut state = self.state.write().await;
            state.next_id += 1;
            state.next_id
        };

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(id),
            product_id: order.product_id,
            quantity: order.quantity,
            user_id: order.user_id,
            status: order.status,
            created_at: now,
            updated_at: now,
            expires_at: order.expires_at,
        };
        self.staged.insert(id, order.clone());
        Ok(order)
    }

    async fn update_status(
        &mut self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<()> {
        // Staged rows shadow committed ones, matching read-your-writes
        // inside an open database transaction.
        let mut order = match self.staged.get(&id.as_i64()) {
            Some(order) => order.clone(),
            None => {
                let order = self
                    .state
                    .read()
                    .await
                    .orders
                    .get(&id.as_i64())
                    .cloned()
                    .ok_or(StoreError::NotFound(id))?;
                self.observed.entry(id.as_i64()).or_insert(order.status);
                order
            }
        };

        if order.status != expected {
            return Err(StoreError::StatusConflict { id, expected });
        }

        order.status = next;
        order.updated_at = Utc::now();
        self.staged.insert(id.as_i64(), order);
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let mut state = self.state.write().await;

        // A row lock would have serialized these scopes; the double
        // detects the lost race at commit instead.
        for (id, expected) in &self.observed {
            if let Some(current) = state.orders.get(id) {
                if current.status != *expected {
                    return Err(StoreError::StatusConflict {
                        id: OrderId::new(*id),
                        expected: *expected,
                    });
                }
            }
        }

        state.orders.extend(self.staged);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        // Staged writes are simply dropped.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::ProductId;

    fn new_order(user: i64, product: i64) -> NewOrder {
        NewOrder {
            product_id: ProductId::new(product),
            quantity: 1,
            user_id: UserId::new(user),
            status: OrderStatus::WaitingPayment,
            expires_at: Utc::now() + Duration::minutes(15),
        }
    }

    #[tokio::test]
    async fn create_is_invisible_until_commit() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx.create(new_order(1, 10)).await.unwrap();
        assert!(matches!(
            store.get(order.id).await,
            Err(StoreError::NotFound(_))
        ));

        tx.commit().await.unwrap();
        assert_eq!(store.get(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx.create(new_order(1, 10)).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(matches!(
            store.get(order.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn dropping_an_uncommitted_tx_discards_writes() {
        let store = InMemoryOrderStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.create(new_order(1, 10)).await.unwrap();
        }

        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn update_status_within_the_creating_tx() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx.create(new_order(1, 10)).await.unwrap();
        tx.update_status(order.id, OrderStatus::WaitingPayment, OrderStatus::Paid)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.get(order.id).await.unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn update_status_conflicts_when_status_moved_on() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx.create(new_order(1, 10)).await.unwrap();
        tx.update_status(order.id, OrderStatus::WaitingPayment, OrderStatus::Cancelled)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .update_status(order.id, OrderStatus::WaitingPayment, OrderStatus::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StatusConflict { .. }));
    }

    #[tokio::test]
    async fn racing_transitions_conflict_at_commit() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let order = tx.create(new_order(1, 10)).await.unwrap();
        tx.commit().await.unwrap();

        // Both scopes pass the conditional write before either commits.
        let mut pay = store.begin().await.unwrap();
        let mut cancel = store.begin().await.unwrap();
        pay.update_status(order.id, OrderStatus::WaitingPayment, OrderStatus::Paid)
            .await
            .unwrap();
        cancel
            .update_status(order.id, OrderStatus::WaitingPayment, OrderStatus::Cancelled)
            .await
            .unwrap();

        pay.commit().await.unwrap();
        let err = cancel.commit().await.unwrap_err();

        assert!(matches!(err, StoreError::StatusConflict { .. }));
        assert_eq!(store.get(order.id).await.unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn update_status_of_missing_order_is_not_found() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let err = tx
            .update_status(
                OrderId::new(999),
                OrderStatus::WaitingPayment,
                OrderStatus::Paid,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn rolled_back_tx_still_consumes_ids() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        let first = tx.create(new_order(1, 10)).await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let second = tx.create(new_order(1, 10)).await.unwrap();
        tx.commit().await.unwrap();

        assert!(second.id.as_i64() > first.id.as_i64());
    }

    #[tokio::test]
    async fn list_by_user_filters_by_owner() {
        let store = InMemoryOrderStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.create(new_order(1, 10)).await.unwrap();
        tx.create(new_order(1, 11)).await.unwrap();
        tx.create(new_order(2, 12)).await.unwrap();
        tx.commit().await.unwrap();

        let orders = store.list_by_user(UserId::new(1)).await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user_id == UserId::new(1)));

        assert!(store.list_by_user(UserId::new(3)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_expired_returns_only_overdue_waiting_orders() {
        let store = InMemoryOrderStore::new();
        let now = Utc::now();

        let mut tx = store.begin().await.unwrap();
        let overdue = tx
            .create(NewOrder {
                expires_at: now - Duration::minutes(1),
                ..new_order(1, 10)
            })
            .await
            .unwrap();
        let fresh = tx
            .create(NewOrder {
                expires_at: now + Duration::minutes(15),
                ..new_order(1, 11)
            })
            .await
            .unwrap();
        let paid = tx
            .create(NewOrder {
                expires_at: now - Duration::minutes(1),
                ..new_order(1, 12)
            })
            .await
            .unwrap();
        tx.update_status(paid.id, OrderStatus::WaitingPayment, OrderStatus::Paid)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let expired = store.list_expired(now).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, overdue.id);
        assert_ne!(expired[0].id, fresh.id);
    }
}
