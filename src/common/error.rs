use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Erro interno da aplicação. Os handlers convertem para `ApiError`
// (já traduzido) antes de responder.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("sessionId é obrigatório")]
    SessionIdRequired,

    #[error("Nome completo é obrigatório para iniciar o formulário")]
    FullNameRequired,

    #[error("Configuração de formulário inválida: {0}")]
    InvalidFormConfig(String),

    #[error("Lead não encontrado")]
    LeadNotFound,

    #[error("Ferramenta de chat desconhecida: {0}")]
    UnknownChatTool(String),

    #[error("Argumentos inválidos para a ferramenta: {0}")]
    InvalidToolArguments(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// Erro pronto para o cliente: status + mensagem no idioma pedido.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

fn translate(lang: &str, pt: &str, en: &str) -> String {
    if lang == "en" { en.to_string() } else { pt.to_string() }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::SessionIdRequired
            | AppError::FullNameRequired
            | AppError::InvalidFormConfig(_)
            | AppError::UnknownChatTool(_)
            | AppError::InvalidToolArguments(_) => StatusCode::BAD_REQUEST,
            AppError::LeadNotFound => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let lang = locale.0.as_str();
        let status = self.status();

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let codes: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_ref().unwrap_or(&e.code);
                            Value::String(code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(codes));
                }
                ApiError {
                    status,
                    message: translate(lang, "Um ou mais campos são inválidos.", "One or more fields are invalid."),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::SessionIdRequired => ApiError::new(
                status,
                translate(lang, "O campo sessionId é obrigatório.", "The sessionId field is required."),
            ),
            AppError::FullNameRequired => ApiError::new(
                status,
                translate(
                    lang,
                    "É necessário informar o nome completo para iniciar o formulário.",
                    "Full name is required to start the form.",
                ),
            ),
            AppError::InvalidFormConfig(reason) => ApiError {
                status,
                message: translate(lang, "Configuração de formulário inválida.", "Invalid form configuration."),
                details: Some(json!({ "reason": reason })),
            },
            AppError::LeadNotFound => {
                ApiError::new(status, translate(lang, "Lead não encontrado.", "Lead not found."))
            }
            AppError::UnknownChatTool(name) => ApiError::new(
                status,
                translate(
                    lang,
                    &format!("Ferramenta desconhecida: {}.", name),
                    &format!("Unknown tool: {}.", name),
                ),
            ),
            AppError::InvalidToolArguments(reason) => ApiError {
                status,
                message: translate(lang, "Argumentos inválidos para a ferramenta.", "Invalid tool arguments."),
                details: Some(json!({ "reason": reason })),
            },
            AppError::UniqueConstraintViolation(_) => ApiError::new(
                status,
                translate(lang, "Registro duplicado.", "Duplicate record."),
            ),

            // 5xx: loga o detalhe, nunca expõe
            e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                ApiError::new(
                    status,
                    translate(lang, "Ocorreu um erro inesperado.", "An unexpected error occurred."),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}
