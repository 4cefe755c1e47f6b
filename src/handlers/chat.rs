// src/handlers/chat.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    services::chat_tools::ChatToolCall,
};

// GET /api/chat/tools
#[utoipa::path(
    get,
    path = "/api/chat/tools",
    tag = "Chat",
    responses(
        (status = 200, description = "Definições das ferramentas para o modelo")
    )
)]
pub async fn list_tools(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.chat_tool_service.definitions()))
}

// POST /api/chat/tools/execute
#[utoipa::path(
    post,
    path = "/api/chat/tools/execute",
    tag = "Chat",
    request_body = ChatToolCall,
    responses(
        (status = 200, description = "Resultado da ferramenta"),
        (status = 400, description = "Ferramenta desconhecida ou argumentos inválidos")
    )
)]
pub async fn execute_tool(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(call): Json<ChatToolCall>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Value = app_state
        .chat_tool_service
        .execute(&call)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(result)))
}
