// src/handlers/settings.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::form::FormConfig,
};

// GET /api/settings/form-config
#[utoipa::path(
    get,
    path = "/api/settings/form-config",
    tag = "Settings",
    responses(
        (status = 200, description = "Configuração do formulário em edição", body = FormConfig)
    )
)]
pub async fn get_form_config(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .form_config_service
        .active_config()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(config)))
}

// PUT /api/settings/form-config
#[utoipa::path(
    put,
    path = "/api/settings/form-config",
    tag = "Settings",
    request_body = FormConfig,
    responses(
        (status = 200, description = "Configuração substituída", body = FormConfig),
        (status = 400, description = "Configuração inválida")
    )
)]
pub async fn replace_form_config(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<FormConfig>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .form_config_service
        .replace_config(payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(updated)))
}
