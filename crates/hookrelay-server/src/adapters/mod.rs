//! Infrastructure Adapters
//!
//! Implementations of domain ports for external systems.

pub mod forwarder;
pub mod postgres;

// Re-exports
pub use forwarder::HttpForwarder;
pub use postgres::{PgUserRepository, PgWebhookLogRepository, PgWebhookRepository};
