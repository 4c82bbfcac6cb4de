//! OpenAPI Documentation
//!
//! Centralized API documentation using utoipa.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::models::{
    ChangePasswordRequest,
    CreateWebhookRequest,
    // Dashboard models
    DashboardStatsResponse,
    DayActivityResponse,
    DeleteBatchRequest,
    DeleteBeforeRequest,
    DeletedCountResponse,
    DeletedResponse,
    ForwardConfigDto,
    // Webhook models
    ForwardMethodDto,
    // Auth models
    LoginRequest,
    MessageResponse,
    ProfileResponse,
    RecentActivityResponse,
    RegisterRequest,
    StatusSliceResponse,
    TokenResponse,
    UpdateWebhookRequest,
    UserResponse,
    WebhookLogEntryResponse,
    // Log models
    WebhookLogResponse,
    WebhookPageResponse,
    WebhookResponse,
};

/// Registers the `bearer` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        super::auth::register,
        super::auth::login,
        super::auth::profile,
        super::auth::change_password,
        // Webhook endpoints
        super::webhook::list_webhooks,
        super::webhook::create_webhook,
        super::webhook::get_webhook,
        super::webhook::update_webhook,
        super::webhook::delete_webhook,
        super::webhook::list_webhook_logs,
        // Log endpoints
        super::log::list_logs,
        super::log::dashboard_stats,
        super::log::delete_log,
        super::log::delete_batch,
        super::log::delete_webhook_logs,
        super::log::delete_before_date,
        // Receive endpoint
        super::hook::receive_hook,
    ),
    info(
        title = "HookRelay API",
        version = "0.1.0",
        description = "Webhook management and relay API\n\nReceive webhooks on `/hook/{path}`, inspect their history and forward them to third-party services.",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Current server"),
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Registration, login and JWT profile"),
        (name = "Webhook", description = "Webhook endpoint management"),
        (name = "Log", description = "Receive history and dashboard statistics"),
        (name = "Hook", description = "Public receive endpoint"),
    ),
    components(
        schemas(
            ErrorResponse,
            // Auth
            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            UserResponse,
            TokenResponse,
            ProfileResponse,
            MessageResponse,
            // Webhook
            ForwardMethodDto,
            ForwardConfigDto,
            CreateWebhookRequest,
            UpdateWebhookRequest,
            WebhookResponse,
            WebhookPageResponse,
            DeletedResponse,
            // Log
            WebhookLogResponse,
            WebhookLogEntryResponse,
            DeleteBatchRequest,
            DeleteBeforeRequest,
            DeletedCountResponse,
            // Dashboard
            DashboardStatsResponse,
            DayActivityResponse,
            StatusSliceResponse,
            RecentActivityResponse,
        )
    ),
    modifiers(&BearerAuth),
)]
pub struct ApiDoc;
