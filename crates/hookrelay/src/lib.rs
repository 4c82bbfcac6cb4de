//! HookRelay Domain Library
//!
//! Core domain types and interfaces for the HookRelay webhook manager.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Core domain models (User, Webhook, WebhookLog)
//!   - `value_objects/`: Immutable value types (WebhookFilter, Page)
//!   - `services/`: Forward templating, secret checks, dashboard aggregation
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: Data access interfaces
//!   - `forwarder`: Outbound HTTP relay interface
//!
//! # Usage
//!
//! ```rust,ignore
//! use hookrelay::domain::{Webhook, ForwardConfig};
//! use hookrelay::ports::{WebhookRepository, Forwarder};
//! ```

pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    DailyLogStats, DomainError, ForwardConfig, ForwardMethod, Page, User, Webhook, WebhookCounts,
    WebhookFilter, WebhookLog, WebhookLogEntry,
};
pub use ports::{
    ForwardRequest, ForwardResult, Forwarder, ForwarderSettings, UserRepository,
    WebhookLogRepository, WebhookRepository,
};
