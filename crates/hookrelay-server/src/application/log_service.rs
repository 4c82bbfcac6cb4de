//! Log Application Service (Use Case)
//!
//! Receive history, bulk deletion and dashboard statistics.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use hookrelay::domain::services::dashboard::{self, DashboardStats};
use hookrelay::{DomainError, WebhookLog, WebhookLogEntry, WebhookLogRepository, WebhookRepository};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_LOG_LIMIT: u32 = 100;
pub const MAX_LOG_LIMIT: u32 = 500;

pub struct LogService {
    logs: Arc<dyn WebhookLogRepository>,
    webhooks: Arc<dyn WebhookRepository>,
}

impl LogService {
    pub fn new(logs: Arc<dyn WebhookLogRepository>, webhooks: Arc<dyn WebhookRepository>) -> Self {
        Self { logs, webhooks }
    }

    async fn ensure_owned(&self, user_id: Uuid, webhook_id: Uuid) -> ApiResult<()> {
        self.webhooks
            .find_by_id_for_user(webhook_id, user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Webhook", webhook_id).into())
    }

    pub async fn list_for_webhook(
        &self,
        user_id: Uuid,
        webhook_id: Uuid,
        limit: Option<u32>,
    ) -> ApiResult<Vec<WebhookLog>> {
        self.ensure_owned(user_id, webhook_id).await?;
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
        Ok(self
            .logs
            .list_for_webhook(webhook_id, i64::from(limit))
            .await?)
    }

    /// Newest entries across all of the user's webhooks
    pub async fn list_all(&self, user_id: Uuid) -> ApiResult<Vec<WebhookLogEntry>> {
        Ok(self
            .logs
            .list_for_user(user_id, i64::from(DEFAULT_LOG_LIMIT))
            .await?)
    }

    pub async fn delete_one(&self, user_id: Uuid, id: Uuid) -> ApiResult<bool> {
        Ok(self.logs.delete_for_user(id, user_id).await?)
    }

    pub async fn delete_batch(&self, user_id: Uuid, ids: &[Uuid]) -> ApiResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.logs.delete_many_for_user(ids, user_id).await?;
        tracing::info!("Deleted {} logs for user {}", deleted, user_id);
        Ok(deleted)
    }

    pub async fn delete_for_webhook(&self, user_id: Uuid, webhook_id: Uuid) -> ApiResult<u64> {
        self.ensure_owned(user_id, webhook_id).await?;
        let deleted = self.logs.delete_for_webhook(webhook_id).await?;
        tracing::info!("Cleared {} logs of webhook {}", deleted, webhook_id);
        Ok(deleted)
    }

    pub async fn delete_before(&self, user_id: Uuid, before_date: &str) -> ApiResult<u64> {
        let before = parse_before_date(before_date)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid beforeDate: {before_date}")))?;
        let deleted = self.logs.delete_before(user_id, before).await?;
        tracing::info!("Deleted {} logs before {} for user {}", deleted, before, user_id);
        Ok(deleted)
    }

    pub async fn dashboard_stats(&self, user_id: Uuid) -> ApiResult<DashboardStats> {
        let now = Utc::now();
        let since = now.date_naive() - Duration::days(dashboard::WINDOW_DAYS - 1);

        let counts = self.webhooks.counts(user_id).await?;
        let daily = self.logs.daily_stats(user_id, since).await?;
        let recent = self
            .logs
            .list_for_user(user_id, dashboard::RECENT_ACTIVITY_LIMIT as i64)
            .await?;

        Ok(dashboard::summarize(now, counts, &daily, &recent))
    }
}

/// RFC 3339 timestamp, or a bare date meaning UTC midnight
fn parse_before_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}
