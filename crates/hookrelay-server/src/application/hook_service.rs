//! Hook Application Service (Use Case)
//!
//! The receive pipeline behind `/hook/{path}`:
//!
//! 1. Resolve the webhook by path, unknown or inactive answers 404
//! 2. Check the shared secret in constant time
//! 3. Decode the payload (JSON, form fields or raw text)
//! 4. Forward when configured
//! 5. Hand back a log entry, recorded off the request path

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::StatusCode;
use serde_json::{json, Map, Value};

use hookrelay::domain::services::{constant_time_eq, redact_headers, SECRET_HEADER};
use hookrelay::{ForwardRequest, ForwardResult, Forwarder, WebhookLog, WebhookLogRepository, WebhookRepository};

use crate::error::ApiResult;

/// Request as received on `/hook/{path}`
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    /// Lower-case header names
    pub headers: BTreeMap<String, String>,
    /// First `secret` query parameter
    pub query_secret: Option<String>,
    pub body: Bytes,
}

/// What to answer, and what to log
#[derive(Debug)]
pub struct HookOutcome {
    pub status: StatusCode,
    pub body: Value,
    pub log: Option<WebhookLog>,
}

pub struct HookService {
    webhooks: Arc<dyn WebhookRepository>,
    logs: Arc<dyn WebhookLogRepository>,
    forwarder: Arc<dyn Forwarder>,
}

impl HookService {
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        logs: Arc<dyn WebhookLogRepository>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            webhooks,
            logs,
            forwarder,
        }
    }

    pub async fn receive(&self, path: &str, request: InboundRequest) -> ApiResult<HookOutcome> {
        let started = Instant::now();

        let webhook = match self.webhooks.find_by_path(path).await? {
            Some(webhook) if webhook.is_active => webhook,
            _ => {
                return Ok(HookOutcome {
                    status: StatusCode::NOT_FOUND,
                    body: error_body(StatusCode::NOT_FOUND, "Webhook not found"),
                    log: None,
                });
            }
        };

        let payload = decode_payload(request.headers.get("content-type").map(String::as_str), &request.body);
        let log = WebhookLog::new(webhook.id, request.method.clone(), redact_headers(&request.headers))
            .with_payload(payload.clone());

        if let Some(expected) = webhook.secret.as_deref().filter(|s| !s.is_empty()) {
            let provided = request
                .headers
                .get(SECRET_HEADER)
                .or(request.query_secret.as_ref())
                .filter(|s| !s.is_empty());

            let rejection = match provided {
                None => Some("Missing secret"),
                Some(provided) if !constant_time_eq(provided, expected) => Some("Invalid secret"),
                Some(_) => None,
            };

            if let Some(message) = rejection {
                tracing::warn!("Rejected {} on /hook/{}: {}", request.method, webhook.path, message);
                let body = error_body(StatusCode::UNAUTHORIZED, message);
                let log = log.with_outcome(401, Some(body.clone()), elapsed_ms(started));
                return Ok(HookOutcome {
                    status: StatusCode::UNAUTHORIZED,
                    body,
                    log: Some(log),
                });
            }
        }

        let forward = match webhook.forward_config.as_ref() {
            Some(config) if webhook.is_forwarding() => {
                let forward_request = ForwardRequest {
                    method: request.method.clone(),
                    headers: request.headers,
                    payload,
                    webhook_name: webhook.name.clone(),
                    webhook_path: webhook.path.clone(),
                };
                Some(self.forwarder.forward(config, &forward_request).await)
            }
            _ => None,
        };

        let body = match &forward {
            Some(result) => json!({ "ok": true, "forward": forward_summary(result) }),
            None => json!({ "ok": true }),
        };

        let mut response = body.clone();
        if let Some(result) = &forward {
            response["forward"]["response"] = result.response.clone().unwrap_or(Value::Null);
        }

        tracing::debug!("Received {} on /hook/{}", request.method, webhook.path);

        Ok(HookOutcome {
            status: StatusCode::OK,
            body,
            log: Some(log.with_outcome(200, Some(response), elapsed_ms(started))),
        })
    }

    /// Persist a log entry without holding up the response
    pub fn record(&self, log: WebhookLog) {
        let logs = self.logs.clone();
        tokio::spawn(async move {
            if let Err(e) = logs.create(&log).await {
                tracing::warn!("Failed to record log for webhook {}: {}", log.webhook_id, e);
            }
        });
    }
}

fn forward_summary(result: &ForwardResult) -> Value {
    json!({
        "success": result.success,
        "statusCode": result.status_code,
        "error": result.error,
        "duration": result.duration_ms,
    })
}

fn error_body(status: StatusCode, message: &str) -> Value {
    json!({
        "statusCode": status.as_u16(),
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message,
    })
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// Decode a request body into the stored payload
///
/// Form bodies become an object (repeated keys collect into arrays),
/// anything else that is not JSON is kept as a string.
fn decode_payload(content_type: Option<&str>, body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let is_form = content_type
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"));
    if is_form {
        if let Ok(pairs) = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            return Some(form_object(pairs));
        }
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(json) => Some(json),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

fn form_object(pairs: Vec<(String, String)>) -> Value {
    let mut map = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match map.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryLogs, InMemoryWebhooks, StubForwarder};
    use hookrelay::{ForwardConfig, Webhook};
    use uuid::Uuid;

    struct Fixture {
        service: HookService,
        webhooks: Arc<InMemoryWebhooks>,
        logs: Arc<InMemoryLogs>,
        forwarder: Arc<StubForwarder>,
    }

    fn fixture(forward_result: ForwardResult) -> Fixture {
        let webhooks = Arc::new(InMemoryWebhooks::default());
        let logs = Arc::new(InMemoryLogs::new(webhooks.clone()));
        let forwarder = Arc::new(StubForwarder::new(forward_result));
        Fixture {
            service: HookService::new(webhooks.clone(), logs.clone(), forwarder.clone()),
            webhooks,
            logs,
            forwarder,
        }
    }

    async fn add_webhook(f: &Fixture, path: &str, secret: Option<&str>) -> Webhook {
        let webhook = Webhook::new(Uuid::new_v4(), "Orders".into(), path.into())
            .with_secret(secret.map(str::to_string));
        f.webhooks.save(&webhook).await.unwrap()
    }

    fn json_request(body: &str) -> InboundRequest {
        InboundRequest {
            method: "POST".into(),
            headers: BTreeMap::from([("content-type".to_string(), "application/json".to_string())]),
            query_secret: None,
            body: Bytes::from(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_paths_are_not_logged() {
        let f = fixture(ForwardResult::default());
        let outcome = f.service.receive("missing", json_request("{}")).await.unwrap();
        assert_eq!(outcome.status, StatusCode::NOT_FOUND);
        assert_eq!(outcome.body["message"], "Webhook not found");
        assert!(outcome.log.is_none());

        let mut webhook = add_webhook(&f, "paused", None).await;
        webhook.is_active = false;
        f.webhooks.save(&webhook).await.unwrap();
        let outcome = f.service.receive("paused", json_request("{}")).await.unwrap();
        assert_eq!(outcome.status, StatusCode::NOT_FOUND);
        assert!(outcome.log.is_none());
    }

    #[tokio::test]
    async fn test_secret_rejections_are_logged() {
        let f = fixture(ForwardResult::default());
        add_webhook(&f, "orders", Some("s3cret")).await;

        let outcome = f.service.receive("orders", json_request("{}")).await.unwrap();
        assert_eq!(outcome.status, StatusCode::UNAUTHORIZED);
        assert_eq!(outcome.body["message"], "Missing secret");
        assert_eq!(outcome.log.unwrap().status_code, 401);

        let mut request = json_request(r#"{"a": 1}"#);
        request
            .headers
            .insert(SECRET_HEADER.to_string(), "wrong".to_string());
        let outcome = f.service.receive("orders", request).await.unwrap();
        assert_eq!(outcome.body["message"], "Invalid secret");

        let log = outcome.log.unwrap();
        assert_eq!(log.headers[SECRET_HEADER], "[redacted]");
        assert_eq!(log.payload, Some(json!({"a": 1})));
        assert_eq!(log.response.unwrap()["statusCode"], 401);
    }

    #[tokio::test]
    async fn test_secret_from_header_or_query() {
        let f = fixture(ForwardResult::default());
        add_webhook(&f, "orders", Some("s3cret")).await;

        let mut request = json_request("{}");
        request.query_secret = Some("s3cret".into());
        let outcome = f.service.receive("orders", request).await.unwrap();
        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.body, json!({"ok": true}));

        // Header wins over the query parameter
        let mut request = json_request("{}");
        request
            .headers
            .insert(SECRET_HEADER.to_string(), "s3cret".to_string());
        request.query_secret = Some("wrong".into());
        let outcome = f.service.receive("orders", request).await.unwrap();
        assert_eq!(outcome.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forward_result_is_reported() {
        let f = fixture(ForwardResult {
            success: false,
            status_code: Some(502),
            response: Some(json!({"upstream": "down"})),
            error: None,
            duration_ms: 12,
        });
        let webhook = add_webhook(&f, "orders", None).await;
        let config: ForwardConfig = serde_json::from_value(json!({
            "enabled": true,
            "targetUrl": "https://example.com/in"
        }))
        .unwrap();
        f.webhooks
            .save(&webhook.with_forward_config(Some(config)))
            .await
            .unwrap();

        let outcome = f
            .service
            .receive("orders", json_request(r#"{"id": 9}"#))
            .await
            .unwrap();

        assert_eq!(outcome.status, StatusCode::OK);
        assert_eq!(outcome.body["ok"], true);
        assert_eq!(outcome.body["forward"]["success"], false);
        assert_eq!(outcome.body["forward"]["statusCode"], 502);
        assert_eq!(outcome.body["forward"]["duration"], 12);
        assert!(outcome.body["forward"].get("response").is_none());

        let log = outcome.log.unwrap();
        assert_eq!(log.status_code, 200);
        assert_eq!(log.response.unwrap()["forward"]["response"]["upstream"], "down");

        let calls = f.forwarder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].payload, Some(json!({"id": 9})));
        assert_eq!(calls[0].webhook_path, "orders");
    }

    #[tokio::test]
    async fn test_disabled_forward_is_skipped() {
        let f = fixture(ForwardResult::default());
        let webhook = add_webhook(&f, "orders", None).await;
        let config: ForwardConfig = serde_json::from_value(json!({
            "enabled": false,
            "targetUrl": "https://example.com/in"
        }))
        .unwrap();
        f.webhooks
            .save(&webhook.with_forward_config(Some(config)))
            .await
            .unwrap();

        let outcome = f.service.receive("orders", json_request("{}")).await.unwrap();
        assert_eq!(outcome.body, json!({"ok": true}));
        assert!(f.forwarder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_record_persists_in_background() {
        let f = fixture(ForwardResult::default());
        add_webhook(&f, "orders", None).await;

        let outcome = f.service.receive("orders", json_request("{}")).await.unwrap();
        f.service.record(outcome.log.unwrap());

        for _ in 0..50 {
            if f.logs.len() == 1 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("log was not recorded");
    }

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(None, b""), None);
        assert_eq!(decode_payload(None, b"  \n"), None);
        assert_eq!(decode_payload(None, br#"{"a":1}"#), Some(json!({"a": 1})));
        assert_eq!(
            decode_payload(Some("text/plain"), b"hello"),
            Some(json!("hello"))
        );
        assert_eq!(
            decode_payload(
                Some("application/x-www-form-urlencoded; charset=utf-8"),
                b"name=a+b&tag=x&tag=y"
            ),
            Some(json!({"name": "a b", "tag": ["x", "y"]}))
        );
        assert_eq!(
            decode_payload(Some("application/octet-stream"), &[0xff, 0x61]),
            Some(json!("\u{fffd}a"))
        );
    }
}
