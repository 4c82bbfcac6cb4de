use anyhow::Context;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod auth;
mod config;
mod error;
mod extract;
mod models;
mod routes;
#[cfg(test)]
mod testing;

use adapters::{HttpForwarder, PgUserRepository, PgWebhookLogRepository, PgWebhookRepository};
use application::{AuthService, HookService, LogService, WebhookService};
use auth::JwtKeys;
use config::AppConfig;
use hookrelay::ForwarderSettings;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub auth_service: Arc<AuthService>,
    pub webhook_service: Arc<WebhookService>,
    pub log_service: Arc<LogService>,
    pub hook_service: Arc<HookService>,
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "HookRelay API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Assemble every route with its middleware
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .nest("/api/auth", routes::auth::router(state.clone()))
        .nest("/api/webhooks", routes::webhook::router(state.clone()))
        .nest("/api/logs", routes::log::router(state.clone()))
        .nest("/hook", routes::hook::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Install the env-filtered subscriber unless the runtime already has one
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hookrelay_server=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    init_tracing();
    tracing::info!("🪝 HookRelay API initializing...");

    let config = AppConfig::from_lookup(|key| secrets.get(key))
        .context("Failed to load configuration")?;
    if !config.production && config.jwt_secret == config::DEV_JWT_SECRET {
        tracing::warn!("⚠️  Using the development JWT secret");
    }

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("✅ Database migrations completed");

    // Initialize adapters
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let webhooks = Arc::new(PgWebhookRepository::new(pool.clone()));
    let logs = Arc::new(PgWebhookLogRepository::new(pool));
    let forwarder = Arc::new(
        HttpForwarder::new(ForwarderSettings {
            retry_base_delay_ms: config.forward_retry_base_delay_ms,
            ..Default::default()
        })
        .context("Failed to initialize forwarder")?,
    );

    // Initialize application services
    let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_expires_in);
    let state = AppState {
        jwt: jwt.clone(),
        auth_service: Arc::new(AuthService::new(users, jwt)),
        webhook_service: Arc::new(WebhookService::new(webhooks.clone())),
        log_service: Arc::new(LogService::new(logs.clone(), webhooks.clone())),
        hook_service: Arc::new(HookService::new(webhooks, logs, forwarder)),
    };

    let router = build_router(state, config.cors_layer());

    tracing::info!("📚 Swagger UI: /api/docs");
    tracing::info!("✅ HookRelay API ready");

    Ok(router.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, testing::TestApp) {
        let test_app = testing::app();
        let router = build_router(test_app.state.clone(), CorsLayer::permissive());
        (router, test_app)
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        router.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(router: &Router, username: &str) -> String {
        let credentials = json!({"username": username, "password": "hunter22"});
        let response = send(
            router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(credentials.clone()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(router, Method::POST, "/api/auth/login", None, Some(credentials)).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["accessToken"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health_and_docs_are_public() {
        let (router, _) = app();
        let response = send(&router, Method::GET, "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");

        let response = send(&router, Method::GET, "/api-docs/openapi.json", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/hook/{path}"].is_object());
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (router, _) = app();
        let response = send(&router, Method::GET, "/api/webhooks", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 401);
        assert_eq!(body["error"], "Unauthorized");

        let response = send(&router, Method::GET, "/api/auth/profile", Some("nope"), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_register_login_profile() {
        let (router, _) = app();
        let token = login(&router, "alice").await;

        let response = send(&router, Method::GET, "/api/auth/profile", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["username"], "alice");

        let duplicate = json!({"username": "alice", "password": "hunter22"});
        let response = send(&router, Method::POST, "/api/auth/register", None, Some(duplicate)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_webhook_crud_and_receive() {
        let (router, test_app) = app();
        let token = login(&router, "alice").await;

        let response = send(
            &router,
            Method::POST,
            "/api/webhooks",
            Some(&token),
            Some(json!({"name": "GitHub", "path": "github", "secret": "s3cret"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["isActive"], true);

        let response = send(&router, Method::POST, "/hook/github", None, Some(json!({"a": 1}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["message"], "Missing secret");

        let response = send(
            &router,
            Method::POST,
            "/hook/github?secret=s3cret",
            None,
            Some(json!({"a": 1})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"ok": true}));

        // Logs are recorded in the background
        for _ in 0..50 {
            if test_app.logs.len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let response = send(
            &router,
            Method::GET,
            &format!("/api/webhooks/{id}/logs"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);

        let response = send(
            &router,
            Method::PATCH,
            &format!("/api/webhooks/{id}"),
            Some(&token),
            Some(json!({"isActive": false})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&router, Method::POST, "/hook/github?secret=s3cret", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &router,
            Method::DELETE,
            &format!("/api/webhooks/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(json_body(response).await, json!({"deleted": true}));
    }

    #[tokio::test]
    async fn test_other_users_webhooks_are_hidden() {
        let (router, _) = app();
        let alice = login(&router, "alice").await;
        let bob = login(&router, "bob").await;

        let response = send(
            &router,
            Method::POST,
            "/api/webhooks",
            Some(&alice),
            Some(json!({"name": "Stripe", "path": "stripe"})),
        )
        .await;
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = send(&router, Method::GET, &format!("/api/webhooks/{id}"), Some(&bob), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Webhook not found");

        let response = send(&router, Method::GET, "/api/webhooks", Some(&bob), None).await;
        assert_eq!(json_body(response).await["total"], 0);
    }

    #[tokio::test]
    async fn test_log_routes() {
        let (router, _) = app();
        let token = login(&router, "alice").await;

        let response = send(&router, Method::GET, "/api/logs/stats", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let stats = json_body(response).await;
        assert_eq!(stats["totalWebhooks"], 0);
        assert_eq!(stats["weeklyData"].as_array().unwrap().len(), 7);

        let response = send(
            &router,
            Method::POST,
            "/api/logs/delete-before-date",
            Some(&token),
            Some(json!({"beforeDate": "yesterday"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &router,
            Method::POST,
            "/api/logs/delete-batch",
            Some(&token),
            Some(json!({"ids": []})),
        )
        .await;
        assert_eq!(json_body(response).await, json!({"deletedCount": 0}));

        let response = send(&router, Method::DELETE, "/api/logs/not-a-uuid", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["error"], "Bad Request");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_input_uses_error_body() {
        let (router, _) = app();

        let response = send(
            &router,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "abc"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["statusCode"], 400);
        assert!(body["message"].as_str().unwrap().contains("password"));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Bad Request");

        let token = login(&router, "alice").await;
        let response = send(&router, Method::GET, "/api/webhooks?page=abc", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["statusCode"], 400);
    }
}
