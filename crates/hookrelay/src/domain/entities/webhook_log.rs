//! WebhookLog - One Received Request
//!
//! Every request that reaches an active webhook produces one log row,
//! including requests rejected for a missing or wrong secret.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record of a single receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLog {
    pub id: Uuid,
    pub webhook_id: Uuid,
    /// Upper-case HTTP method
    pub method: String,
    /// Lower-cased, redacted request headers
    pub headers: serde_json::Value,
    pub payload: Option<serde_json::Value>,
    /// Status returned to the caller
    pub status_code: i32,
    /// Response body plus the forward target's response, if any
    pub response: Option<serde_json::Value>,
    /// Time spent handling the request
    pub duration_ms: i64,
    pub received_at: DateTime<Utc>,
}

impl WebhookLog {
    pub fn new(webhook_id: Uuid, method: impl Into<String>, headers: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            webhook_id,
            method: method.into(),
            headers,
            payload: None,
            status_code: 200,
            response: None,
            duration_ms: 0,
            received_at: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: Option<serde_json::Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_outcome(
        mut self,
        status_code: i32,
        response: Option<serde_json::Value>,
        duration_ms: i64,
    ) -> Self {
        self.status_code = status_code;
        self.response = response;
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Log row joined with the owning webhook's name and path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLogEntry {
    #[serde(flatten)]
    pub log: WebhookLog,
    pub webhook_name: String,
    pub webhook_path: String,
}

/// Per-day aggregate used by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyLogStats {
    pub day: NaiveDate,
    pub total: i64,
    /// Requests answered with a 2xx status
    pub success: i64,
    pub avg_duration_ms: f64,
}
