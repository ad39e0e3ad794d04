//! HTTP route handlers.

pub mod callback;
pub mod health;
pub mod metrics;
pub mod orders;
