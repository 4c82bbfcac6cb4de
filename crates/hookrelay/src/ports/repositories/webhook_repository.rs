//! Webhook Repository Port
//!
//! Abstract interface for Webhook persistence operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::Webhook;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Page, WebhookCounts, WebhookFilter};

/// Repository interface for Webhook entities
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Find a webhook by ID, scoped to its owner
    async fn find_by_id_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Webhook>, DomainError>;

    /// Find a webhook by its public path, regardless of owner
    async fn find_by_path(&self, path: &str) -> Result<Option<Webhook>, DomainError>;

    /// List a user's webhooks, newest first
    async fn list(&self, user_id: Uuid, filter: &WebhookFilter)
        -> Result<Page<Webhook>, DomainError>;

    /// Save a webhook (insert or update)
    ///
    /// Fails with `DomainError::Conflict` when the path belongs to another webhook.
    async fn save(&self, webhook: &Webhook) -> Result<Webhook, DomainError>;

    /// Delete a webhook owned by `user_id`, its logs cascade
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError>;

    async fn counts(&self, user_id: Uuid) -> Result<WebhookCounts, DomainError>;
}
