//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the domain layer
//! interacts with external systems (repositories, outbound HTTP).
//!
//! Implementations of these traits live in the server crate.

pub mod forwarder;
pub mod repositories;

// Re-exports
pub use forwarder::*;
pub use repositories::*;
