// src/handlers/form.rs

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        lenient,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::{
        form::FormConfig,
        lead::{FormLead, FormLeadProgress, LeadSource, ProgressMetadata, ProgressSnapshot},
    },
};

// GET /api/form/config
#[utoipa::path(
    get,
    path = "/api/form/config",
    tag = "Form",
    responses(
        (status = 200, description = "Configuração ativa do formulário", body = FormConfig)
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

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProgressPayload {
    #[serde(flatten)]
    pub progress: FormLeadProgress,

    #[serde(default, deserialize_with = "lenient::string")]
    pub conversation_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::parsed")]
    pub source: Option<LeadSource>,
}

// POST /api/form/progress
#[utoipa::path(
    post,
    path = "/api/form/progress",
    tag = "Form",
    request_body = SubmitProgressPayload,
    responses(
        (status = 200, description = "Lead mesclado com pontuação atualizada", body = FormLead),
        (status = 400, description = "sessionId ausente ou lead novo sem nome")
    )
)]
pub async fn submit_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    Json(payload): Json<SubmitProgressPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .progress
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let metadata = ProgressMetadata {
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        conversation_id: payload.conversation_id,
        source: Some(payload.source.unwrap_or(LeadSource::Form)),
    };

    let config = app_state
        .form_config_service
        .active_config()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let lead = app_state
        .form_lead_service
        .upsert_form_lead_progress(payload.progress, metadata, Some(&config))
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(lead)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProgressQuery {
    pub session_id: Option<String>,
    pub conversation_id: Option<String>,
}

// GET /api/form/progress
#[utoipa::path(
    get,
    path = "/api/form/progress",
    tag = "Form",
    params(ProgressQuery),
    responses(
        (status = 200, description = "Andamento atual do lead", body = ProgressSnapshot),
        (status = 400, description = "Nenhum identificador informado")
    )
)]
pub async fn get_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ProgressQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let config = app_state
        .form_config_service
        .active_config()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let snapshot = app_state
        .form_lead_service
        .get_progress(query.session_id.as_deref(), query.conversation_id.as_deref(), &config)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(snapshot)))
}
