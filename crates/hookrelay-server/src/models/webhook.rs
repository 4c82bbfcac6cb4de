//! Webhook DTOs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use hookrelay::{ForwardConfig, ForwardMethod, Page, Webhook, WebhookFilter};

/// HTTP method used when forwarding
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForwardMethodDto {
    Get,
    #[default]
    Post,
    Put,
    Patch,
}

/// Outbound forwarding configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForwardConfigDto {
    pub enabled: bool,
    /// Target URL receiving the forwarded request
    #[validate(url)]
    pub target_url: String,
    #[serde(default)]
    pub method: ForwardMethodDto,
    /// Extra headers, override the defaults
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body template with `{{method}}`, `{{payload.x}}`, `{{time}}` ... variables
    #[validate(length(max = 10000))]
    pub body_template: Option<String>,
    /// Timeout in milliseconds (default: 10000)
    #[validate(range(min = 1000, max = 60000))]
    pub timeout: Option<u64>,
    /// Retries after transport failures (default: 0)
    #[validate(range(max = 5))]
    pub retry_count: Option<u32>,
}

/// Request to create a webhook
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhookRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// URL-safe segment, received at `/hook/{path}`
    #[validate(length(min = 1, max = 100))]
    pub path: String,
    /// Shared secret expected in `x-webhook-secret` or `?secret=`
    #[validate(length(max = 200))]
    pub secret: Option<String>,
    pub is_active: Option<bool>,
    pub config: Option<serde_json::Value>,
    #[validate(nested)]
    pub forward_config: Option<ForwardConfigDto>,
}

/// Partial update
///
/// For `secret`, `config` and `forwardConfig` an absent field keeps the
/// stored value while an explicit `null` clears it.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhookRequest {
    pub name: Option<String>,
    pub path: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub secret: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Object>)]
    pub config: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<ForwardConfigDto>)]
    pub forward_config: Option<Option<ForwardConfigDto>>,
}

/// Distinguish a present `null` from an absent field
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WebhookListQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Page size (1-100, default: 20)
    pub limit: Option<u32>,
    /// Case-insensitive name search
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// Webhook response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub id: Uuid,
    pub name: String,
    pub path: String,
    pub secret: Option<String>,
    pub is_active: bool,
    pub config: Option<serde_json::Value>,
    pub forward_config: Option<ForwardConfigDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookPageResponse {
    pub items: Vec<WebhookResponse>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}

impl From<ForwardMethodDto> for ForwardMethod {
    fn from(method: ForwardMethodDto) -> Self {
        match method {
            ForwardMethodDto::Get => Self::Get,
            ForwardMethodDto::Post => Self::Post,
            ForwardMethodDto::Put => Self::Put,
            ForwardMethodDto::Patch => Self::Patch,
        }
    }
}

impl From<ForwardMethod> for ForwardMethodDto {
    fn from(method: ForwardMethod) -> Self {
        match method {
            ForwardMethod::Get => Self::Get,
            ForwardMethod::Post => Self::Post,
            ForwardMethod::Put => Self::Put,
            ForwardMethod::Patch => Self::Patch,
        }
    }
}

impl ForwardConfigDto {
    pub fn into_domain(self) -> ForwardConfig {
        ForwardConfig {
            enabled: self.enabled,
            target_url: self.target_url.trim().to_string(),
            method: self.method.into(),
            headers: self.headers,
            body_template: self.body_template,
            timeout_ms: self.timeout,
            retry_count: self.retry_count,
        }
    }

    pub fn from_domain(config: ForwardConfig) -> Self {
        Self {
            enabled: config.enabled,
            target_url: config.target_url,
            method: config.method.into(),
            headers: config.headers,
            body_template: config.body_template,
            timeout: config.timeout_ms,
            retry_count: config.retry_count,
        }
    }
}

impl WebhookListQuery {
    pub fn into_filter(self) -> WebhookFilter {
        WebhookFilter::new(self.page, self.limit, self.search, self.is_active)
    }
}

impl WebhookResponse {
    pub fn from_domain(webhook: Webhook) -> Self {
        Self {
            id: webhook.id,
            name: webhook.name,
            path: webhook.path,
            secret: webhook.secret,
            is_active: webhook.is_active,
            config: webhook.config,
            forward_config: webhook.forward_config.map(ForwardConfigDto::from_domain),
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

impl WebhookPageResponse {
    pub fn from_domain(page: Page<Webhook>) -> Self {
        let page = page.map(WebhookResponse::from_domain);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}
