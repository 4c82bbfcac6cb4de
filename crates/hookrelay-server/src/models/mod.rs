//! HookRelay Data Models
//!
//! Request and response DTOs for the HTTP API. JSON fields are camelCase.
//!
//! - Auth: registration, login, profile
//! - Webhook: endpoint management and forward configuration
//! - Log: receive history and bulk deletion
//! - Dashboard: aggregated statistics

mod auth;
mod dashboard;
mod log;
mod webhook;

pub use auth::*;
pub use dashboard::*;
pub use log::*;
pub use webhook::*;
