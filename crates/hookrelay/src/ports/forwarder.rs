//! Forwarder Port
//!
//! Abstract interface for relaying a received webhook to a third-party URL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::ForwardConfig;

/// Received request handed to the forwarder
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    /// Upper-case method of the received request
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub payload: Option<serde_json::Value>,
    pub webhook_name: String,
    pub webhook_path: String,
}

/// Outcome of a forward attempt
///
/// `success` is true for any response status in 200..400.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardResult {
    pub success: bool,
    pub status_code: Option<u16>,
    /// Target's response body, JSON when it parses, otherwise a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ForwardResult {
    pub fn failed(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            status_code: None,
            response: None,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Forward delivery interface
///
/// Implementations never fail: transport errors, timeouts and
/// exhausted retries are reported through [`ForwardResult`].
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(&self, config: &ForwardConfig, request: &ForwardRequest) -> ForwardResult;
}

/// Settings shared by every forward
#[derive(Debug, Clone)]
pub struct ForwarderSettings {
    /// Delay before retry `n` is `base * n`
    pub retry_base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for ForwarderSettings {
    fn default() -> Self {
        Self {
            retry_base_delay_ms: 1000,
            user_agent: "HookRelay/1.0".to_string(),
        }
    }
}
