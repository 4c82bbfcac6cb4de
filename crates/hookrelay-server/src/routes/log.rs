//! Log Routes - Receive History and Dashboard

use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{require_auth, AuthUser};
use crate::error::{ApiResult, ErrorResponse};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{
    DashboardStatsResponse, DeleteBatchRequest, DeleteBeforeRequest, DeletedCountResponse,
    DeletedResponse, WebhookLogEntryResponse,
};
use crate::AppState;

/// Newest logs across all of the user's webhooks
#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Up to 100 newest logs", body = Vec<WebhookLogEntryResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Log"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<WebhookLogEntryResponse>>> {
    let entries = state.log_service.list_all(user.id).await?;
    Ok(Json(
        entries
            .into_iter()
            .map(WebhookLogEntryResponse::from_domain)
            .collect(),
    ))
}

/// Dashboard statistics for the last 7 days
#[utoipa::path(
    get,
    path = "/api/logs/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStatsResponse)
    ),
    security(("bearer" = [])),
    tag = "Log"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<DashboardStatsResponse>> {
    let stats = state.log_service.dashboard_stats(user.id).await?;
    Ok(Json(DashboardStatsResponse::from_domain(stats)))
}

/// Delete a single log
#[utoipa::path(
    delete,
    path = "/api/logs/{id}",
    params(
        ("id" = Uuid, Path, description = "Log ID")
    ),
    responses(
        (status = 200, description = "Whether a log was deleted", body = DeletedResponse)
    ),
    security(("bearer" = [])),
    tag = "Log"
)]
pub async fn delete_log(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state.log_service.delete_one(user.id, id).await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// Delete several logs at once
#[utoipa::path(
    post,
    path = "/api/logs/delete-batch",
    request_body = DeleteBatchRequest,
    responses(
        (status = 200, description = "Number of deleted logs", body = DeletedCountResponse),
        (status = 400, description = "Too many ids", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Log"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<DeleteBatchRequest>,
) -> ApiResult<Json<DeletedCountResponse>> {
    payload.validate()?;
    let deleted_count = state.log_service.delete_batch(user.id, &payload.ids).await?;
    Ok(Json(DeletedCountResponse { deleted_count }))
}

/// Delete every log of one webhook
#[utoipa::path(
    delete,
    path = "/api/logs/webhook/{webhook_id}",
    params(
        ("webhook_id" = Uuid, Path, description = "Webhook ID")
    ),
    responses(
        (status = 200, description = "Number of deleted logs", body = DeletedCountResponse),
        (status = 404, description = "Webhook not found", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Log"
)]
pub async fn delete_webhook_logs(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(webhook_id): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedCountResponse>> {
    let deleted_count = state
        .log_service
        .delete_for_webhook(user.id, webhook_id)
        .await?;
    Ok(Json(DeletedCountResponse { deleted_count }))
}

/// Delete logs received before a date
#[utoipa::path(
    post,
    path = "/api/logs/delete-before-date",
    request_body = DeleteBeforeRequest,
    responses(
        (status = 200, description = "Number of deleted logs", body = DeletedCountResponse),
        (status = 400, description = "Invalid beforeDate", body = ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "Log"
)]
pub async fn delete_before_date(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<DeleteBeforeRequest>,
) -> ApiResult<Json<DeletedCountResponse>> {
    let deleted_count = state
        .log_service
        .delete_before(user.id, &payload.before_date)
        .await?;
    Ok(Json(DeletedCountResponse { deleted_count }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs))
        .route("/stats", get(dashboard_stats))
        .route("/delete-batch", post(delete_batch))
        .route("/delete-before-date", post(delete_before_date))
        .route("/webhook/:webhook_id", delete(delete_webhook_logs))
        .route("/:id", delete(delete_log))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
