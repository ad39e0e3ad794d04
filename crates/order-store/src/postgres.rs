use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use common::{OrderId, ProductId, UserId};

use crate::error::{Result, StoreError};
use crate::order::{NewOrder, Order, OrderStatus};
use crate::store::{OrderStore, OrderTx};

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status)
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity: row.try_get("quantity")?,
            user_id: UserId::new(row.try_get("user_id")?),
            status,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

/// An open PostgreSQL transaction over the orders table.
///
/// Dropping it without committing rolls the transaction back.
pub struct PostgresOrderTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    type Tx = PostgresOrderTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(PostgresOrderTx { tx })
    }

    async fn get(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, quantity, user_id, status, created_at, updated_at, expires_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, quantity, user_id, status, created_at, updated_at, expires_at
            FROM orders
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, quantity, user_id, status, created_at, updated_at, expires_at
            FROM orders
            WHERE status = 'waiting_payment' AND expires_at < $1
            ORDER BY expires_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}

#[async_trait]
impl OrderTx for PostgresOrderTx {
    async fn create(&mut self, order: NewOrder) -> Result<Order> {
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (product_id, quantity, user_id, status, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(order.product_id.as_i64())
        .bind(order.quantity)
        .bind(order.user_id.as_i64())
        .bind(order.status.as_str())
        .bind(now)
        .bind(now)
        .bind(order.expires_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Order {
            id: OrderId::new(id),
            product_id: order.product_id,
            quantity: order.quantity,
            user_id: order.user_id,
            status: order.status,
            created_at: now,
            updated_at: now,
            expires_at: order.expires_at,
        })
    }

    async fn update_status(
        &mut self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = now()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(next.as_str())
        .bind(id.as_i64())
        .bind(expected.as_str())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a lost race.
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM orders WHERE id = $1")
                .bind(id.as_i64())
                .fetch_optional(&mut *self.tx)
                .await?;

            return Err(match exists {
                None => StoreError::NotFound(id),
                Some(_) => StoreError::StatusConflict { id, expected },
            });
        }

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
