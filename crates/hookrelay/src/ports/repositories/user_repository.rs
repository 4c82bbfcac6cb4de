//! User Repository Port

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{errors::DomainError, User};

/// Repository interface for User entities
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// Insert a new user
    ///
    /// Fails with `DomainError::Conflict` when the username is taken.
    async fn create(&self, user: &User) -> Result<User, DomainError>;

    /// Replace the stored password hash, returns false if the user is gone
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, DomainError>;
}
