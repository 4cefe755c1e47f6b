// src/services/chat_tools.rs

// Camada de "tool calling" do assistente. O modelo escolhe a ferramenta e
// nós executamos as mesmas operações do formulário web.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, lenient},
    models::lead::{FormLeadProgress, LeadSource, ProgressMetadata},
    services::{form_config_service::FormConfigService, form_lead_service::FormLeadService},
};

pub const SUBMIT_FORM_PROGRESS: &str = "submit_form_progress";
pub const GET_FORM_PROGRESS: &str = "get_form_progress";
pub const GET_FORM_CONFIG: &str = "get_form_config";

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatToolCall {
    #[schema(example = "submit_form_progress")]
    pub name: String,
    // Objeto JSON ou a string JSON crua que o modelo devolveu
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"answers": {"nome": "Maria"}, "questionNumber": 1}))]
    pub arguments: Value,
    #[schema(example = "sess_8f2c1a")]
    pub session_id: String,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitProgressArgs {
    #[serde(default, deserialize_with = "lenient::coerced_string_map")]
    answers: HashMap<String, String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    question_number: Option<i32>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    form_completo: Option<bool>,
    #[serde(default, deserialize_with = "lenient::integer")]
    tempo_total_segundos: Option<i32>,
}

fn parse_arguments<T: for<'de> Deserialize<'de> + Default>(arguments: &Value) -> Result<T, AppError> {
    let value = match arguments {
        Value::Null => return Ok(T::default()),
        Value::String(raw) if raw.trim().is_empty() => return Ok(T::default()),
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .map_err(|e| AppError::InvalidToolArguments(e.to_string()))?,
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| AppError::InvalidToolArguments(e.to_string()))
}

#[derive(Clone)]
pub struct ChatToolService {
    form_lead_service: FormLeadService,
    form_config_service: FormConfigService,
}

impl ChatToolService {
    pub fn new(form_lead_service: FormLeadService, form_config_service: FormConfigService) -> Self {
        Self {
            form_lead_service,
            form_config_service,
        }
    }

    /// Esquemas no formato de "function calling" para enviar ao modelo.
    pub fn definitions(&self) -> Vec<Value> {
        vec![
            json!({
                "type": "function",
                "function": {
                    "name": SUBMIT_FORM_PROGRESS,
                    "description": "Salva as respostas do visitante no formulário de qualificação. \
                                    Envie só o que foi respondido agora; o que já foi salvo é mantido.",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "answers": {
                                "type": "object",
                                "description": "Respostas indexadas pelo id da pergunta (ex: {\"nome\": \"Maria\"}).",
                                "additionalProperties": { "type": "string" }
                            },
                            "questionNumber": {
                                "type": "integer",
                                "description": "Ordem da última pergunta respondida."
                            },
                            "formCompleto": {
                                "type": "boolean",
                                "description": "true quando todas as perguntas foram respondidas."
                            },
                            "tempoTotalSegundos": {
                                "type": "integer",
                                "description": "Duração da conversa até agora, em segundos."
                            }
                        },
                        "required": ["answers", "questionNumber"]
                    }
                }
            }),
            json!({
                "type": "function",
                "function": {
                    "name": GET_FORM_PROGRESS,
                    "description": "Consulta o que o visitante já respondeu e qual é a próxima pergunta.",
                    "parameters": { "type": "object", "properties": {} }
                }
            }),
            json!({
                "type": "function",
                "function": {
                    "name": GET_FORM_CONFIG,
                    "description": "Lista as perguntas do formulário, opções e pontuação.",
                    "parameters": { "type": "object", "properties": {} }
                }
            }),
        ]
    }

    pub async fn execute(&self, call: &ChatToolCall) -> Result<Value, AppError> {
        tracing::debug!("🤖 Ferramenta '{}' chamada na sessão {}", call.name, call.session_id);

        match call.name.as_str() {
            SUBMIT_FORM_PROGRESS => self.submit_progress(call).await,
            GET_FORM_PROGRESS => {
                let config = self.form_config_service.active_config().await?;
                let snapshot = self
                    .form_lead_service
                    .get_progress(Some(&call.session_id), call.conversation_id.as_deref(), &config)
                    .await?;
                to_json(&snapshot)
            }
            GET_FORM_CONFIG => {
                let config = self.form_config_service.active_config().await?;
                to_json(&config)
            }
            other => Err(AppError::UnknownChatTool(other.to_string())),
        }
    }

    async fn submit_progress(&self, call: &ChatToolCall) -> Result<Value, AppError> {
        let args: SubmitProgressArgs = parse_arguments(&call.arguments)?;

        let mut progress = FormLeadProgress::for_session(call.session_id.clone());
        progress.question_number = args.question_number;
        progress.form_completo = args.form_completo;
        progress.tempo_total_segundos = args.tempo_total_segundos;
        for (id, value) in &args.answers {
            progress.answers.set(id, value);
        }

        let metadata = ProgressMetadata {
            user_agent: None,
            conversation_id: call.conversation_id.clone(),
            source: Some(LeadSource::Chat),
        };

        let config = self.form_config_service.active_config().await?;
        let lead = self
            .form_lead_service
            .upsert_form_lead_progress(progress, metadata, Some(&config))
            .await?;

        to_json(&lead)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| anyhow::anyhow!("Falha ao serializar resposta: {}", e).into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::memory::{InMemoryFormLeadStore, InMemorySettingsStore};

    fn tools() -> (ChatToolService, Arc<InMemoryFormLeadStore>) {
        let store = Arc::new(InMemoryFormLeadStore::new());
        let leads = FormLeadService::new(store.clone());
        let config = FormConfigService::new(Arc::new(InMemorySettingsStore::new()));
        (ChatToolService::new(leads, config), store)
    }

    fn call(name: &str, arguments: Value) -> ChatToolCall {
        ChatToolCall {
            name: name.to_string(),
            arguments,
            session_id: "sess-chat".to_string(),
            conversation_id: Some("conv-1".to_string()),
        }
    }

    #[tokio::test]
    async fn submit_routes_answers_and_marks_chat_source() {
        let (tools, store) = tools();
        let result = tools
            .execute(&call(
                SUBMIT_FORM_PROGRESS,
                json!({"answers": {"nome": "Maria", "comoConheceu": "Instagram"}, "questionNumber": "1"}),
            ))
            .await
            .unwrap();

        assert_eq!(result["nome"], "Maria");
        assert_eq!(result["source"], "chat");
        assert_eq!(result["conversationId"], "conv-1");

        let lead = &store.all()[0];
        assert_eq!(lead.answers.custom_answers.get("comoConheceu").map(String::as_str), Some("Instagram"));
        assert_eq!(lead.ultima_pergunta_respondida, 1);
    }

    #[tokio::test]
    async fn submit_keeps_answers_sent_as_numbers() {
        let (tools, store) = tools();
        tools
            .execute(&call(
                SUBMIT_FORM_PROGRESS,
                json!({"answers": {"nome": "Maria", "telefone": 11999998888u64}, "questionNumber": 3}),
            ))
            .await
            .unwrap();

        let lead = &store.all()[0];
        assert_eq!(lead.answers.telefone.as_deref(), Some("11999998888"));
        assert_eq!(lead.ultima_pergunta_respondida, 3);
    }

    #[tokio::test]
    async fn submit_stores_elapsed_time() {
        let (tools, store) = tools();
        tools
            .execute(&call(
                SUBMIT_FORM_PROGRESS,
                json!({"answers": {"nome": "Maria"}, "questionNumber": 1, "tempoTotalSegundos": "95"}),
            ))
            .await
            .unwrap();
        assert_eq!(store.all()[0].tempo_total_segundos, Some(95));
    }

    #[tokio::test]
    async fn accepts_arguments_as_raw_json_string() {
        let (tools, _) = tools();
        let raw = Value::String(r#"{"answers": {"nome": "João"}, "questionNumber": 1}"#.to_string());
        let result = tools.execute(&call(SUBMIT_FORM_PROGRESS, raw)).await.unwrap();
        assert_eq!(result["nome"], "João");
    }

    #[tokio::test]
    async fn submit_without_name_on_new_conversation_fails() {
        let (tools, store) = tools();
        let result = tools
            .execute(&call(SUBMIT_FORM_PROGRESS, json!({"answers": {"email": "x@y.com"}, "questionNumber": 2})))
            .await;
        assert!(matches!(result, Err(AppError::FullNameRequired)));
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn get_progress_returns_next_question() {
        let (tools, _) = tools();
        tools
            .execute(&call(SUBMIT_FORM_PROGRESS, json!({"answers": {"nome": "Maria"}, "questionNumber": 1})))
            .await
            .unwrap();

        let snapshot = tools.execute(&call(GET_FORM_PROGRESS, Value::Null)).await.unwrap();
        assert_eq!(snapshot["nextQuestion"]["id"], "email");
        assert_eq!(snapshot["answeredQuestionIds"], json!(["nome"]));
    }

    #[tokio::test]
    async fn get_config_returns_active_config() {
        let (tools, _) = tools();
        let config = tools.execute(&call(GET_FORM_CONFIG, Value::Null)).await.unwrap();
        assert_eq!(config["questions"].as_array().map(Vec::len), Some(9));
        assert_eq!(config["thresholds"]["hot"], 58);
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_are_errors() {
        let (tools, _) = tools();
        let unknown = tools.execute(&call("apagar_tudo", Value::Null)).await;
        assert!(matches!(unknown, Err(AppError::UnknownChatTool(_))));

        let bad = tools
            .execute(&call(SUBMIT_FORM_PROGRESS, Value::String("{nao é json".to_string())))
            .await;
        assert!(matches!(bad, Err(AppError::InvalidToolArguments(_))));
    }

    #[test]
    fn definitions_cover_all_tools() {
        let (tools, _) = tools();
        let names: Vec<String> = tools
            .definitions()
            .iter()
            .filter_map(|d| d["function"]["name"].as_str().map(str::to_string))
            .collect();
        assert_eq!(names, vec![SUBMIT_FORM_PROGRESS, GET_FORM_PROGRESS, GET_FORM_CONFIG]);

        // Todo argumento que o submit entende está no esquema enviado ao modelo
        let submit = &tools.definitions()[0]["function"]["parameters"]["properties"];
        for arg in ["answers", "questionNumber", "formCompleto", "tempoTotalSegundos"] {
            assert!(submit.get(arg).is_some(), "{} ausente", arg);
        }
    }
}
