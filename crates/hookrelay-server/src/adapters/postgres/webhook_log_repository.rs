//! PostgreSQL implementation of WebhookLogRepository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use hookrelay::{DailyLogStats, DomainError, WebhookLog, WebhookLogEntry, WebhookLogRepository};

pub struct PgWebhookLogRepository {
    pool: PgPool,
}

impl PgWebhookLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct WebhookLogRow {
    id: Uuid,
    webhook_id: Uuid,
    method: String,
    headers: Value,
    payload: Option<Value>,
    status_code: i32,
    response: Option<Value>,
    duration_ms: i64,
    received_at: DateTime<Utc>,
}

impl From<WebhookLogRow> for WebhookLog {
    fn from(row: WebhookLogRow) -> Self {
        Self {
            id: row.id,
            webhook_id: row.webhook_id,
            method: row.method,
            headers: row.headers,
            payload: row.payload,
            status_code: row.status_code,
            response: row.response,
            duration_ms: row.duration_ms,
            received_at: row.received_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WebhookLogEntryRow {
    #[sqlx(flatten)]
    log: WebhookLogRow,
    webhook_name: String,
    webhook_path: String,
}

impl From<WebhookLogEntryRow> for WebhookLogEntry {
    fn from(row: WebhookLogEntryRow) -> Self {
        Self {
            log: row.log.into(),
            webhook_name: row.webhook_name,
            webhook_path: row.webhook_path,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DailyStatsRow {
    day: NaiveDate,
    total: i64,
    success: i64,
    avg_duration_ms: f64,
}

impl From<DailyStatsRow> for DailyLogStats {
    fn from(row: DailyStatsRow) -> Self {
        Self {
            day: row.day,
            total: row.total,
            success: row.success,
            avg_duration_ms: row.avg_duration_ms,
        }
    }
}

/// jsonb cannot hold U+0000, so NUL in keys and strings becomes U+FFFD
fn replace_nul(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace('\0', "\u{FFFD}")),
        Value::Array(items) => Value::Array(items.iter().map(replace_nul).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.replace('\0', "\u{FFFD}"), replace_nul(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[async_trait]
impl WebhookLogRepository for PgWebhookLogRepository {
    async fn create(&self, log: &WebhookLog) -> Result<WebhookLog, DomainError> {
        let row = sqlx::query_as::<_, WebhookLogRow>(
            r#"
            INSERT INTO webhook_logs (id, webhook_id, method, headers, payload, status_code, response, duration_ms, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(log.id)
        .bind(log.webhook_id)
        .bind(&log.method)
        .bind(replace_nul(&log.headers))
        .bind(log.payload.as_ref().map(replace_nul))
        .bind(log.status_code)
        .bind(log.response.as_ref().map(replace_nul))
        .bind(log.duration_ms)
        .bind(log.received_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.into())
    }

    async fn list_for_webhook(
        &self,
        webhook_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookLog>, DomainError> {
        let rows = sqlx::query_as::<_, WebhookLogRow>(
            "SELECT * FROM webhook_logs WHERE webhook_id = $1 ORDER BY received_at DESC LIMIT $2",
        )
        .bind(webhook_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookLogEntry>, DomainError> {
        let rows = sqlx::query_as::<_, WebhookLogEntryRow>(
            r#"
            SELECT l.*, w.name AS webhook_name, w.path AS webhook_path
            FROM webhook_logs l
            INNER JOIN webhooks w ON w.id = l.webhook_id
            WHERE w.user_id = $1
            ORDER BY l.received_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM webhook_logs l
            USING webhooks w
            WHERE l.webhook_id = w.id AND l.id = $1 AND w.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_many_for_user(
        &self,
        ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            DELETE FROM webhook_logs l
            USING webhooks w
            WHERE l.webhook_id = w.id AND l.id = ANY($1) AND w.user_id = $2
            "#,
        )
        .bind(ids)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_for_webhook(&self, webhook_id: Uuid) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_logs WHERE webhook_id = $1")
            .bind(webhook_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn delete_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM webhook_logs l
            USING webhooks w
            WHERE l.webhook_id = w.id AND w.user_id = $1 AND l.received_at < $2
            "#,
        )
        .bind(user_id)
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn daily_stats(
        &self,
        user_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyLogStats>, DomainError> {
        let since = since.and_time(chrono::NaiveTime::MIN).and_utc();

        let rows = sqlx::query_as::<_, DailyStatsRow>(
            r#"
            SELECT
                (l.received_at AT TIME ZONE 'UTC')::date AS day,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE l.status_code BETWEEN 200 AND 299) AS success,
                COALESCE(AVG(l.duration_ms), 0)::float8 AS avg_duration_ms
            FROM webhook_logs l
            INNER JOIN webhooks w ON w.id = l.webhook_id
            WHERE w.user_id = $1 AND l.received_at >= $2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_replace_nul_in_strings_and_keys() {
        let value = json!({
            "body": "a\0b",
            "list": ["\0", 1, null],
            "ke\0y": {"nested": "x\0"}
        });
        assert_eq!(
            replace_nul(&value),
            json!({
                "body": "a\u{FFFD}b",
                "list": ["\u{FFFD}", 1, null],
                "ke\u{FFFD}y": {"nested": "x\u{FFFD}"}
            })
        );
    }

    #[test]
    fn test_replace_nul_leaves_clean_values() {
        let value = json!({"a": [1.5, true, "text"]});
        assert_eq!(replace_nul(&value), value);
    }
}
