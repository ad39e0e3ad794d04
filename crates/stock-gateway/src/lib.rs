//! Remote stock reservation gateway.
//!
//! The warehouse service owns the reservation; this crate only creates
//! and patches it. Each call is a single non-transactional HTTP request.
//! No idempotency key is sent, so a timed-out call cannot be told apart
//! from an applied one; callers must not blindly retry.

mod error;
mod gateway;
mod http;
mod memory;

pub use error::{GatewayError, Result};
pub use gateway::{ReservationGateway, ReservationStatus};
pub use http::{HttpReservationGateway, INTERNAL_AUTH_HEADER};
pub use memory::{InMemoryReservationGateway, ReserveCall, StatusCall};
