// src/handlers/leads.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::lead::{FormLead, LeadFilter, UpdateLeadStatusPayload},
};

// GET /api/leads
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadFilter),
    responses(
        (status = 200, description = "Leads mais recentes primeiro", body = Vec<FormLead>)
    )
)]
pub async fn list_leads(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<LeadFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let leads = app_state
        .form_lead_service
        .list_leads(&filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(leads)))
}

// GET /api/leads/{id}
#[utoipa::path(
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Lead", body = FormLead),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn get_lead(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lead = app_state
        .form_lead_service
        .get_lead(id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(lead)))
}

// PATCH /api/leads/{id}/status
#[utoipa::path(
    patch,
    path = "/api/leads/{id}/status",
    tag = "Leads",
    request_body = UpdateLeadStatusPayload,
    params(("id" = Uuid, Path, description = "ID do lead")),
    responses(
        (status = 200, description = "Status atualizado", body = FormLead),
        (status = 404, description = "Lead não encontrado")
    )
)]
pub async fn update_lead_status(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let lead = app_state
        .form_lead_service
        .update_lead_status(id, payload.status, payload.observacoes.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(lead)))
}
