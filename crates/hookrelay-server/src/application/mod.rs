//! Application Layer (Use Cases)
//!
//! Orchestrates domain operations and coordinates between
//! repositories and external services.

mod auth_service;
mod hook_service;
mod log_service;
mod webhook_service;

pub use auth_service::AuthService;
pub use hook_service::{HookOutcome, HookService, InboundRequest};
pub use log_service::LogService;
pub use webhook_service::WebhookService;
