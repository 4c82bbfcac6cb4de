//! Webhook Application Service (Use Case)
//!
//! Orchestrates domain operations for webhook management. Every
//! operation is scoped to the owning user.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use hookrelay::{DomainError, Page, Webhook, WebhookFilter, WebhookRepository};

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateWebhookRequest, UpdateWebhookRequest};

const PATH_TAKEN: &str = "Webhook path already exists";

pub struct WebhookService {
    webhooks: Arc<dyn WebhookRepository>,
}

impl WebhookService {
    pub fn new(webhooks: Arc<dyn WebhookRepository>) -> Self {
        Self { webhooks }
    }

    pub async fn create(&self, user_id: Uuid, request: CreateWebhookRequest) -> ApiResult<Webhook> {
        request.validate()?;

        let webhook = Webhook {
            is_active: request.is_active.unwrap_or(true),
            ..Webhook::new(user_id, request.name.trim().to_string(), request.path)
        }
        .with_secret(request.secret)
        .with_config(request.config)
        .with_forward_config(request.forward_config.map(|f| f.into_domain()));
        webhook.validate()?;

        if self.webhooks.find_by_path(&webhook.path).await?.is_some() {
            return Err(ApiError::Conflict(PATH_TAKEN.to_string()));
        }

        let saved = self.webhooks.save(&webhook).await?;
        tracing::info!("Created webhook: {} ({}) at /hook/{}", saved.name, saved.id, saved.path);

        Ok(saved)
    }

    pub async fn list(&self, user_id: Uuid, filter: WebhookFilter) -> ApiResult<Page<Webhook>> {
        Ok(self.webhooks.list(user_id, &filter).await?)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ApiResult<Webhook> {
        self.webhooks
            .find_by_id_for_user(id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Webhook", id).into())
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: UpdateWebhookRequest,
    ) -> ApiResult<Webhook> {
        let current = self.get(user_id, id).await?;
        let path_changed = patch.path.as_ref().is_some_and(|p| *p != current.path);

        let mut updated = Webhook {
            name: patch.name.map(|n| n.trim().to_string()).unwrap_or(current.name),
            path: patch.path.unwrap_or(current.path),
            is_active: patch.is_active.unwrap_or(current.is_active),
            updated_at: Utc::now(),
            ..current
        };
        if let Some(secret) = patch.secret {
            updated = updated.with_secret(secret);
        }
        if let Some(config) = patch.config {
            updated.config = config;
        }
        if let Some(forward) = patch.forward_config {
            if let Some(dto) = &forward {
                dto.validate()?;
            }
            updated.forward_config = forward.map(|f| f.into_domain());
        }
        updated.validate()?;

        if path_changed {
            if let Some(existing) = self.webhooks.find_by_path(&updated.path).await? {
                if existing.id != updated.id {
                    return Err(ApiError::Conflict(PATH_TAKEN.to_string()));
                }
            }
        }

        let saved = self.webhooks.save(&updated).await?;
        tracing::info!("Updated webhook: {} ({})", saved.name, saved.id);

        Ok(saved)
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ApiResult<()> {
        if !self.webhooks.delete(id, user_id).await? {
            return Err(DomainError::not_found("Webhook", id).into());
        }
        tracing::info!("Deleted webhook: {}", id);
        Ok(())
    }
}
