//! PostgreSQL Repository Implementations

mod user_repository;
mod webhook_log_repository;
mod webhook_repository;

pub use user_repository::PgUserRepository;
pub use webhook_log_repository::PgWebhookLogRepository;
pub use webhook_repository::PgWebhookRepository;

use hookrelay::DomainError;

/// Map unique-constraint violations to `Conflict`, everything else to `Repository`
fn unique_or_repository(e: sqlx::Error, conflict: &str) -> DomainError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::Conflict(conflict.to_string())
        }
        _ => DomainError::Repository(e.to_string()),
    }
}
