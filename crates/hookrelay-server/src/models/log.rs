//! Receive log DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use hookrelay::{WebhookLog, WebhookLogEntry};

/// One received request
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLogResponse {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub method: String,
    /// Request headers, credentials redacted
    pub headers: serde_json::Value,
    pub payload: Option<serde_json::Value>,
    pub status_code: i32,
    pub response: Option<serde_json::Value>,
    pub duration_ms: i64,
    pub received_at: DateTime<Utc>,
}

/// Log row with the owning webhook's name and path
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookLogEntryResponse {
    pub id: Uuid,
    pub webhook_id: Uuid,
    pub webhook_name: String,
    pub webhook_path: String,
    pub method: String,
    pub headers: serde_json::Value,
    pub payload: Option<serde_json::Value>,
    pub status_code: i32,
    pub response: Option<serde_json::Value>,
    pub duration_ms: i64,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogLimitQuery {
    /// Max entries (1-500, default: 100)
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteBatchRequest {
    #[validate(length(max = 1000))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBeforeRequest {
    /// RFC 3339 timestamp or `YYYY-MM-DD` (UTC midnight)
    pub before_date: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountResponse {
    pub deleted_count: u64,
}

impl WebhookLogResponse {
    pub fn from_domain(log: WebhookLog) -> Self {
        Self {
            id: log.id,
            webhook_id: log.webhook_id,
            method: log.method,
            headers: log.headers,
            payload: log.payload,
            status_code: log.status_code,
            response: log.response,
            duration_ms: log.duration_ms,
            received_at: log.received_at,
        }
    }
}

impl WebhookLogEntryResponse {
    pub fn from_domain(entry: WebhookLogEntry) -> Self {
        let log = entry.log;
        Self {
            id: log.id,
            webhook_id: log.webhook_id,
            webhook_name: entry.webhook_name,
            webhook_path: entry.webhook_path,
            method: log.method,
            headers: log.headers,
            payload: log.payload,
            status_code: log.status_code,
            response: log.response,
            duration_ms: log.duration_ms,
            received_at: log.received_at,
        }
    }
}
