//! Order data model and transactional storage.
//!
//! The [`OrderStore`] trait is the storage contract consumed by the
//! lifecycle orchestrator; [`PostgresOrderStore`] is the production
//! implementation and [`InMemoryOrderStore`] backs the test suites.

mod error;
mod memory;
mod order;
mod postgres;
mod store;

pub use common::{OrderId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use order::{NewOrder, Order, OrderStatus, ParseStatusError};
pub use postgres::PostgresOrderStore;
pub use store::{OrderStore, OrderTx};
