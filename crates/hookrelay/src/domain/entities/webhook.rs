//! Webhook - Inbound Endpoint with Optional Forwarding
//!
//! A webhook is a user-owned, path-addressed endpoint under `/hook/{path}`.
//! Requests arriving there are validated against an optional shared
//! secret, logged, and optionally forwarded to a third-party URL.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PATH_LEN: usize = 100;
pub const MAX_SECRET_LEN: usize = 200;
pub const MAX_TEMPLATE_LEN: usize = 10_000;

pub const DEFAULT_FORWARD_TIMEOUT_MS: u64 = 10_000;
pub const MIN_FORWARD_TIMEOUT_MS: u64 = 1_000;
pub const MAX_FORWARD_TIMEOUT_MS: u64 = 60_000;
pub const MAX_FORWARD_RETRIES: u32 = 5;

static PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid path regex"));

/// Webhook endpoint owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Human-readable name
    pub name: String,
    /// URL-safe segment, unique across all users
    pub path: String,
    /// Shared secret expected in `x-webhook-secret` or `?secret=`
    pub secret: Option<String>,
    /// Inactive webhooks answer 404
    pub is_active: bool,
    /// Free-form user configuration
    pub config: Option<serde_json::Value>,
    /// Outbound forwarding, if any
    pub forward_config: Option<ForwardConfig>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// HTTP method used when forwarding
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForwardMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
}

/// Outbound forwarding configuration
///
/// Persisted as JSON, so the field names follow the public API
/// (`targetUrl`, `bodyTemplate`, `timeout`, `retryCount`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForwardConfig {
    pub enabled: bool,
    pub target_url: String,
    #[serde(default)]
    pub method: ForwardMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Body template with `{{...}}` variables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
    /// Request timeout in milliseconds
    #[serde(
        default,
        rename = "timeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<u64>,
    /// Extra attempts after the first failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

impl Webhook {
    /// Create a new active webhook with generated ID and timestamps
    pub fn new(user_id: Uuid, name: String, path: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            path,
            secret: None,
            is_active: true,
            config: None,
            forward_config: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn with_config(mut self, config: Option<serde_json::Value>) -> Self {
        self.config = config;
        self
    }

    pub fn with_forward_config(mut self, forward_config: Option<ForwardConfig>) -> Self {
        self.forward_config = forward_config;
        self
    }

    /// Whether received requests should be forwarded
    pub fn is_forwarding(&self) -> bool {
        self.forward_config
            .as_ref()
            .is_some_and(|f| f.enabled && !f.target_url.trim().is_empty())
    }

    /// Check invariants shared by create, update and import paths
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_path(&self.path)?;
        if let Some(secret) = &self.secret {
            if secret.chars().count() > MAX_SECRET_LEN {
                return Err(DomainError::Validation(format!(
                    "secret must be at most {MAX_SECRET_LEN} characters"
                )));
            }
        }
        if let Some(config) = &self.config {
            if !config.is_object() {
                return Err(DomainError::Validation(
                    "config must be a JSON object".to_string(),
                ));
            }
        }
        if let Some(forward) = &self.forward_config {
            forward.validate()?;
        }
        Ok(())
    }
}

impl ForwardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_FORWARD_TIMEOUT_MS))
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let url = self.target_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) || url.len() < 10 {
            return Err(DomainError::Validation(
                "targetUrl must be a valid http(s) URL".to_string(),
            ));
        }
        if let Some(template) = &self.body_template {
            if template.chars().count() > MAX_TEMPLATE_LEN {
                return Err(DomainError::Validation(format!(
                    "bodyTemplate must be at most {MAX_TEMPLATE_LEN} characters"
                )));
            }
        }
        if let Some(timeout) = self.timeout_ms {
            if !(MIN_FORWARD_TIMEOUT_MS..=MAX_FORWARD_TIMEOUT_MS).contains(&timeout) {
                return Err(DomainError::Validation(format!(
                    "timeout must be between {MIN_FORWARD_TIMEOUT_MS} and {MAX_FORWARD_TIMEOUT_MS} ms"
                )));
            }
        }
        if let Some(retries) = self.retry_count {
            if retries > MAX_FORWARD_RETRIES {
                return Err(DomainError::Validation(format!(
                    "retryCount must be at most {MAX_FORWARD_RETRIES}"
                )));
            }
        }
        Ok(())
    }
}

pub fn validate_name(name: &str) -> Result<(), DomainError> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(DomainError::Validation(format!(
            "name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_path(path: &str) -> Result<(), DomainError> {
    if path.is_empty() || path.len() > MAX_PATH_LEN {
        return Err(DomainError::Validation(format!(
            "path must be 1-{MAX_PATH_LEN} characters"
        )));
    }
    if !PATH_REGEX.is_match(path) {
        return Err(DomainError::Validation(
            "path must be url-safe (letters, numbers, '_' or '-')".to_string(),
        ));
    }
    Ok(())
}

impl std::fmt::Display for ForwardMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}
