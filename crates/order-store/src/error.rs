use thiserror::Error;

use common::OrderId;

use crate::order::OrderStatus;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order exists with the given id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// A conditional status write matched no row because the order is no
    /// longer in the expected status.
    #[error("order {id} is not in status {expected}, refusing status write")]
    StatusConflict { id: OrderId, expected: OrderStatus },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
