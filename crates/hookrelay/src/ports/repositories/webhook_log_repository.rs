//! WebhookLog Repository Port
//!
//! Ownership of a log is derived through its webhook, so every
//! user-scoped operation joins on `webhooks.user_id`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::entities::{DailyLogStats, WebhookLog, WebhookLogEntry};
use crate::domain::errors::DomainError;

#[async_trait]
pub trait WebhookLogRepository: Send + Sync {
    async fn create(&self, log: &WebhookLog) -> Result<WebhookLog, DomainError>;

    /// Newest logs of one webhook
    async fn list_for_webhook(
        &self,
        webhook_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookLog>, DomainError>;

    /// Newest logs across all of a user's webhooks
    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookLogEntry>, DomainError>;

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError>;

    /// Delete the listed logs the user owns, returns the number removed
    async fn delete_many_for_user(&self, ids: &[Uuid], user_id: Uuid)
        -> Result<u64, DomainError>;

    async fn delete_for_webhook(&self, webhook_id: Uuid) -> Result<u64, DomainError>;

    /// Delete a user's logs received strictly before `before`
    async fn delete_before(&self, user_id: Uuid, before: DateTime<Utc>)
        -> Result<u64, DomainError>;

    /// Per-day totals from `since` (inclusive, UTC) onwards
    async fn daily_stats(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyLogStats>, DomainError>;
}
