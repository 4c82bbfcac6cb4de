//! Repository Ports
//!
//! Abstract interfaces for data persistence operations.

mod user_repository;
mod webhook_log_repository;
mod webhook_repository;

pub use user_repository::*;
pub use webhook_log_repository::*;
pub use webhook_repository::*;
