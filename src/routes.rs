// src/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn router(app_state: AppState) -> Router {
    // Formulário público (web e chat compartilham o mesmo lead)
    let form_routes = Router::new()
        .route("/config", get(handlers::form::get_form_config))
        .route(
            "/progress",
            post(handlers::form::submit_progress).get(handlers::form::get_progress),
        );

    let lead_routes = Router::new()
        .route("/{id}", get(handlers::leads::get_lead))
        .route("/{id}/status", patch(handlers::leads::update_lead_status));

    let settings_routes = Router::new().route(
        "/form-config",
        get(handlers::settings::get_form_config).put(handlers::settings::replace_form_config),
    );

    let chat_routes = Router::new()
        .route("/tools", get(handlers::chat::list_tools))
        .route("/tools/execute", post(handlers::chat::execute_tool));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/form", form_routes)
        .route("/api/leads", get(handlers::leads::list_leads))
        .nest("/api/leads", lead_routes)
        .nest("/api/settings", settings_routes)
        .nest("/api/chat", chat_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
