//! Hook Route - Public Receive Endpoint
//!
//! Accepts any method on `/hook/{path}`, hands the request to HookService
//! and records the resulting log without waiting for the insert.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    response::IntoResponse,
    routing::any,
    Json, Router,
};

use crate::application::InboundRequest;
use crate::error::{ApiResult, ErrorResponse};
use crate::extract::ApiPath;
use crate::AppState;

/// Receive a webhook
///
/// Any method is accepted. When the webhook has a secret it must be sent
/// in `x-webhook-secret` or as `?secret=`.
#[utoipa::path(
    post,
    path = "/hook/{path}",
    params(
        ("path" = String, Path, description = "Webhook path"),
        ("secret" = Option<String>, Query, description = "Secret, when not sent as a header")
    ),
    request_body(content = serde_json::Value, description = "JSON, form or text payload"),
    responses(
        (status = 200, description = "Received, with the forward outcome if any", body = serde_json::Value),
        (status = 401, description = "Missing or invalid secret", body = ErrorResponse),
        (status = 404, description = "Unknown or inactive webhook", body = ErrorResponse)
    ),
    tag = "Hook"
)]
pub async fn receive_hook(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<String>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request = InboundRequest {
        method: method.as_str().to_ascii_uppercase(),
        headers: header_map(&headers),
        query_secret: query.as_deref().and_then(query_secret),
        body,
    };

    let outcome = state.hook_service.receive(&path, request).await?;
    if let Some(log) = outcome.log {
        state.hook_service.record(log);
    }

    Ok((outcome.status, Json(outcome.body)))
}

/// Flatten headers, joining repeated values with `, `
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

fn query_secret(query: &str) -> Option<String> {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .ok()?
        .into_iter()
        .find(|(key, _)| key == "secret")
        .map(|(_, value)| value)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:path", any(receive_hook))
}
