//! HookRelay API Routes
//!
//! - /api/auth - Registration, login and profile
//! - /api/webhooks - Webhook management (JWT)
//! - /api/logs - Receive history and dashboard statistics (JWT)
//! - /hook/:path - Public receive endpoint (shared secret)
//! - /api/docs - Swagger UI

pub mod auth;
pub mod hook;
pub mod log;
pub mod swagger;
pub mod webhook;
