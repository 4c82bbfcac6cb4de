//! Domain Entities
//!
//! Pure domain models without infrastructure dependencies.
//! - User: account owning webhooks
//! - Webhook: inbound endpoint with optional forwarding
//! - WebhookLog: one received request and its outcome

mod user;
mod webhook;
mod webhook_log;

pub use user::*;
pub use webhook::*;
pub use webhook_log::*;
