//! PostgreSQL implementation of WebhookRepository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use hookrelay::{
    DomainError, ForwardConfig, Page, Webhook, WebhookCounts, WebhookFilter, WebhookRepository,
};

use super::unique_or_repository;

const PATH_TAKEN: &str = "Webhook path already exists";

/// Shared WHERE clause for listing and counting
const LIST_FILTER: &str = r#"
    WHERE user_id = $1
      AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' ESCAPE '\')
      AND ($3::boolean IS NULL OR is_active = $3)
"#;

pub struct PgWebhookRepository {
    pool: PgPool,
}

impl PgWebhookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct WebhookRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    path: String,
    secret: Option<String>,
    is_active: bool,
    config: Option<serde_json::Value>,
    forward_config: Option<serde_json::Value>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<WebhookRow> for Webhook {
    fn from(row: WebhookRow) -> Self {
        // A forward config that no longer parses is treated as absent
        let forward_config = row
            .forward_config
            .and_then(|v| serde_json::from_value::<ForwardConfig>(v).ok());

        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            path: row.path,
            secret: row.secret,
            is_active: row.is_active,
            config: row.config,
            forward_config,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escape LIKE wildcards so the search is a plain substring match
fn escape_like(search: &str) -> String {
    search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl WebhookRepository for PgWebhookRepository {
    async fn find_by_id_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Webhook>, DomainError> {
        let row = sqlx::query_as::<_, WebhookRow>(
            "SELECT * FROM webhooks WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<Webhook>, DomainError> {
        let row = sqlx::query_as::<_, WebhookRow>("SELECT * FROM webhooks WHERE path = $1")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &WebhookFilter,
    ) -> Result<Page<Webhook>, DomainError> {
        let search = filter.search.as_deref().map(escape_like);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM webhooks {LIST_FILTER}"
        ))
        .bind(user_id)
        .bind(&search)
        .bind(filter.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        let rows = sqlx::query_as::<_, WebhookRow>(&format!(
            "SELECT * FROM webhooks {LIST_FILTER} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(user_id)
        .bind(&search)
        .bind(filter.is_active)
        .bind(i64::from(filter.limit))
        .bind(filter.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(Page {
            items: rows.into_iter().map(Into::into).collect(),
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }

    async fn save(&self, webhook: &Webhook) -> Result<Webhook, DomainError> {
        let forward_json = webhook
            .forward_config
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        // Check if exists
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM webhooks WHERE id = $1)")
                .bind(webhook.id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DomainError::Repository(e.to_string()))?;

        let row = if exists {
            // Update
            sqlx::query_as::<_, WebhookRow>(
                r#"
                UPDATE webhooks
                SET name = $2, path = $3, secret = $4, is_active = $5, config = $6,
                    forward_config = $7, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(webhook.id)
            .bind(&webhook.name)
            .bind(&webhook.path)
            .bind(&webhook.secret)
            .bind(webhook.is_active)
            .bind(&webhook.config)
            .bind(&forward_json)
            .fetch_one(&self.pool)
            .await
        } else {
            // Insert
            sqlx::query_as::<_, WebhookRow>(
                r#"
                INSERT INTO webhooks (id, user_id, name, path, secret, is_active, config, forward_config, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
            )
            .bind(webhook.id)
            .bind(webhook.user_id)
            .bind(&webhook.name)
            .bind(&webhook.path)
            .bind(&webhook.secret)
            .bind(webhook.is_active)
            .bind(&webhook.config)
            .bind(&forward_json)
            .bind(webhook.created_at)
            .bind(webhook.updated_at)
            .fetch_one(&self.pool)
            .await
        }
        .map_err(|e| unique_or_repository(e, PATH_TAKEN))?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn counts(&self, user_id: Uuid) -> Result<WebhookCounts, DomainError> {
        let (total, active) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active)
            FROM webhooks
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Repository(e.to_string()))?;

        Ok(WebhookCounts { total, active })
    }
}
