//! Webhook Routes - Endpoint Management
//!
//! HTTP handlers that delegate to WebhookService. Every route is scoped to
//! the authenticated user; other users' webhooks answer 404.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::auth::{require_auth, AuthUser};
use crate::error::{ApiResult, ErrorResponse};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{
    CreateWebhookRequest, DeletedResponse, LogLimitQuery, UpdateWebhookRequest,
    WebhookListQuery, WebhookLogResponse, WebhookPageResponse, WebhookResponse,
};
use crate::AppState;

/// List the current user's webhooks
#[utoipa::path(
    get,
    path = "/api/webhooks",
    params(WebhookListQuery),
    responses(
        (status = 200, description = "One page of webhooks, newest first", body = WebhookPageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Webhook"
)]
pub async fn list_webhooks(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<WebhookListQuery>,
) -> ApiResult<Json<WebhookPageResponse>> {
    let page = state
        .webhook_service
        .list(user.id, query.into_filter())
        .await?;
    Ok(Json(WebhookPageResponse::from_domain(page)))
}

/// Create a webhook
#[utoipa::path(
    post,
    path = "/api/webhooks",
    request_body = CreateWebhookRequest,
    responses(
        (status = 201, description = "Webhook created", body = WebhookResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Path already in use", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Webhook"
)]
pub async fn create_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateWebhookRequest>,
) -> ApiResult<(StatusCode, Json<WebhookResponse>)> {
    let webhook = state.webhook_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(WebhookResponse::from_domain(webhook))))
}

/// Get webhook by ID
#[utoipa::path(
    get,
    path = "/api/webhooks/{id}",
    params(
        ("id" = Uuid, Path, description = "Webhook ID")
    ),
    responses(
        (status = 200, description = "Webhook found", body = WebhookResponse),
        (status = 404, description = "Webhook not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Webhook"
)]
pub async fn get_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<WebhookResponse>> {
    let webhook = state.webhook_service.get(user.id, id).await?;
    Ok(Json(WebhookResponse::from_domain(webhook)))
}

/// Partially update a webhook
///
/// Absent fields are kept, `null` clears `secret`, `config` and `forwardConfig`.
#[utoipa::path(
    patch,
    path = "/api/webhooks/{id}",
    params(
        ("id" = Uuid, Path, description = "Webhook ID")
    ),
    request_body = UpdateWebhookRequest,
    responses(
        (status = 200, description = "Webhook updated", body = WebhookResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Webhook not found", body = ErrorResponse),
        (status = 409, description = "Path already in use", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Webhook"
)]
pub async fn update_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateWebhookRequest>,
) -> ApiResult<Json<WebhookResponse>> {
    let webhook = state.webhook_service.update(user.id, id, payload).await?;
    Ok(Json(WebhookResponse::from_domain(webhook)))
}

/// Delete a webhook and its logs
#[utoipa::path(
    delete,
    path = "/api/webhooks/{id}",
    params(
        ("id" = Uuid, Path, description = "Webhook ID")
    ),
    responses(
        (status = 200, description = "Webhook deleted", body = DeletedResponse),
        (status = 404, description = "Webhook not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Webhook"
)]
pub async fn delete_webhook(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    state.webhook_service.delete(user.id, id).await?;
    Ok(Json(DeletedResponse { deleted: true }))
}

/// Receive history of one webhook, newest first
#[utoipa::path(
    get,
    path = "/api/webhooks/{id}/logs",
    params(
        ("id" = Uuid, Path, description = "Webhook ID"),
        LogLimitQuery
    ),
    responses(
        (status = 200, description = "Webhook logs", body = Vec<WebhookLogResponse>),
        (status = 404, description = "Webhook not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Webhook"
)]
pub async fn list_webhook_logs(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<LogLimitQuery>,
) -> ApiResult<Json<Vec<WebhookLogResponse>>> {
    let logs = state
        .log_service
        .list_for_webhook(user.id, id, query.limit)
        .await?;
    Ok(Json(
        logs.into_iter()
            .map(WebhookLogResponse::from_domain)
            .collect(),
    ))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_webhooks).post(create_webhook))
        .route(
            "/:id",
            get(get_webhook)
                .patch(update_webhook)
                .delete(delete_webhook),
        )
        .route("/:id/logs", get(list_webhook_logs))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
