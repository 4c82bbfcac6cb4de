//! HTTP Forwarder Implementation
//!
//! Relays received webhooks to their configured target using reqwest.
//! Only transport failures (connect errors, timeouts) are retried; any
//! HTTP response, including 5xx, ends the attempt loop.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};

use hookrelay::domain::services::{build_forward_body, ForwardBody};
use hookrelay::{
    DomainError, ForwardConfig, ForwardMethod, ForwardRequest, ForwardResult, Forwarder,
    ForwarderSettings,
};

/// Largest target response body kept for the log
const MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// HTTP implementation of Forwarder
pub struct HttpForwarder {
    client: Client,
    settings: ForwarderSettings,
}

impl HttpForwarder {
    pub fn new(settings: ForwarderSettings) -> Result<Self, DomainError> {
        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .build()
            .map_err(|e| {
                DomainError::ExternalService(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, settings })
    }

    fn headers(config: &ForwardConfig, body: &ForwardBody) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let content_type = match body {
            ForwardBody::Text(_) => "text/plain; charset=utf-8",
            _ => "application/json",
        };
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        // Custom headers override the defaults
        for (name, value) in &config.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid forward header: {}", name),
            }
        }
        headers
    }
}

fn to_method(method: ForwardMethod) -> Method {
    match method {
        ForwardMethod::Get => Method::GET,
        ForwardMethod::Post => Method::POST,
        ForwardMethod::Put => Method::PUT,
        ForwardMethod::Patch => Method::PATCH,
    }
}

/// Keep JSON responses structured, everything else as a string
fn parse_response_body(text: String) -> Option<serde_json::Value> {
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
}

/// Read at most `MAX_RESPONSE_BYTES` of the body
async fn read_capped(mut response: Response, target: &str) -> String {
    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_RESPONSE_BYTES - body.len();
                if chunk.len() > room {
                    body.extend_from_slice(&chunk[..room]);
                    tracing::debug!("Forward response from {} truncated", target);
                    break;
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read forward response from {}: {}", target, e);
                break;
            }
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Linear backoff before retry number `attempt` (1-based)
fn retry_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, config: &ForwardConfig, request: &ForwardRequest) -> ForwardResult {
        if !config.enabled || config.target_url.trim().is_empty() {
            return ForwardResult::failed("Forward not enabled or target URL not configured", 0);
        }

        let started = Instant::now();
        let body = build_forward_body(config, request, Utc::now());
        let headers = Self::headers(config, &body);
        let payload = match &body {
            ForwardBody::Empty => None,
            ForwardBody::Json(json) => Some(json.to_string()),
            ForwardBody::Text(text) => Some(text.clone()),
        };

        let attempts = config.retry_count() + 1;
        let mut last_error = String::from("Unknown error");

        for attempt in 0..attempts {
            let mut builder = self
                .client
                .request(to_method(config.method), &config.target_url)
                .headers(headers.clone())
                .timeout(config.timeout());
            if let Some(payload) = &payload {
                builder = builder.body(payload.clone());
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    let text = read_capped(response, &config.target_url).await;
                    let duration_ms = elapsed_ms(started);

                    tracing::info!(
                        "Forward to {} answered {} ({}ms)",
                        config.target_url,
                        status.as_u16(),
                        duration_ms
                    );

                    return ForwardResult {
                        success: status.is_success() || status.is_redirection(),
                        status_code: Some(status.as_u16()),
                        response: parse_response_body(text),
                        error: None,
                        duration_ms,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        "Forward attempt {}/{} to {} failed: {}",
                        attempt + 1,
                        attempts,
                        config.target_url,
                        e
                    );
                    last_error = e.to_string();

                    if attempt + 1 < attempts {
                        let delay = retry_delay(self.settings.retry_base_delay_ms, attempt + 1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        tracing::warn!(
            "Forward to {} failed after {} attempts: {}",
            config.target_url,
            attempts,
            last_error
        );
        ForwardResult::failed(last_error, elapsed_ms(started))
    }
}
