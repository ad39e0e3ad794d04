//! Order lifecycle orchestrator.
//!
//! [`OrderService`] composes the order store and the reservation gateway
//! into the business operations: creating an order together with its
//! stock reservation, and transitioning an order's status while keeping
//! the remote reservation in step. Each write operation runs the remote
//! call inside the open local transaction scope, so a gateway failure
//! rolls the local mutation back and the two sides never diverge as
//! committed state.

mod error;
mod service;

pub use error::{OrderError, Result};
pub use service::OrderService;
