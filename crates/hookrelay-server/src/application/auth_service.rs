//! Auth Application Service (Use Case)
//!
//! Registration, login and password changes.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use hookrelay::{DomainError, User, UserRepository};

use crate::auth::{hash_password, verify_password, JwtKeys};
use crate::error::{ApiError, ApiResult};
use crate::models::{ChangePasswordRequest, LoginRequest, RegisterRequest};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtKeys,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtKeys) -> Self {
        Self { users, jwt }
    }

    pub async fn register(&self, request: RegisterRequest) -> ApiResult<User> {
        request.validate()?;
        let username = request.username.trim().to_string();

        if self.users.find_by_username(&username).await?.is_some() {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(&User::new(username, password_hash, request.email))
            .await?;

        tracing::info!("Registered user: {} ({})", user.username, user.id);

        Ok(user)
    }

    /// Returns a signed access token
    pub async fn login(&self, request: LoginRequest) -> ApiResult<String> {
        request.validate()?;

        let user = self
            .users
            .find_by_username(request.username.trim())
            .await?
            .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            tracing::warn!("Failed login for user: {}", user.username);
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.jwt.issue(user.id, &user.username)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> ApiResult<()> {
        request.validate()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(ApiError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(&request.new_password)?;
        if !self.users.update_password(user.id, &password_hash).await? {
            return Err(DomainError::not_found("User", user_id).into());
        }

        tracing::info!("Password changed for user: {}", user.id);

        Ok(())
    }
}
