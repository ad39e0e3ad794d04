//! The storage contract consumed by the lifecycle orchestrator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use common::{OrderId, UserId};

use crate::error::Result;
use crate::order::{NewOrder, Order, OrderStatus};

/// Durable, transactional storage for order records.
///
/// Writes go through a scoped transaction obtained from [`OrderStore::begin`],
/// so a remote call can run inside the open scope and a failure on either
/// side rolls the local mutation back.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The transaction scope type produced by [`OrderStore::begin`].
    type Tx: OrderTx;

    /// Opens a transaction scope owning one connection for its duration.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Fetches an order by id, or [`StoreError::NotFound`].
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    async fn get(&self, id: OrderId) -> Result<Order>;

    /// Returns all orders owned by the user, in insertion order.
    /// A user with no orders yields an empty vec, not an error.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Returns orders still awaiting payment whose deadline is before `now`.
    /// Feeds the expiry sweep; paid and cancelled orders never appear.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>>;
}

/// A transaction scope over the order store.
///
/// Writes staged on the scope become durable only on [`OrderTx::commit`].
/// Dropping the scope without committing discards them, which covers every
/// early-return error path.
#[async_trait]
pub trait OrderTx: Send {
    /// Inserts the order, assigning its id and timestamps, and returns the
    /// fully populated record.
    async fn create(&mut self, order: NewOrder) -> Result<Order>;

    /// Moves the order from `expected` to `next` and refreshes `updated_at`.
    ///
    /// The write is conditional on the row still being in `expected`, so a
    /// concurrent transition cannot be overwritten: when no row matches,
    /// this resolves to [`StoreError::NotFound`] if the order is absent or
    /// [`StoreError::StatusConflict`] if it has already moved on.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    /// [`StoreError::StatusConflict`]: crate::StoreError::StatusConflict
    async fn update_status(
        &mut self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<()>;

    /// Commits the staged writes.
    async fn commit(self) -> Result<()>;

    /// Explicitly discards the staged writes.
    async fn rollback(self) -> Result<()>;
}
