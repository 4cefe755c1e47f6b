// src/models/lead.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::lenient;

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_classification do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_classification", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum LeadClassification {
    Quente,
    Morno,
    Frio,
    Desqualificado,
}

impl LeadClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quente => "QUENTE",
            Self::Morno => "MORNO",
            Self::Frio => "FRIO",
            Self::Desqualificado => "DESQUALIFICADO",
        }
    }
}

impl fmt::Display for LeadClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadClassification {
    type Err = String;

    // O assistente às vezes manda o nome em inglês
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "QUENTE" | "HOT" => Ok(Self::Quente),
            "MORNO" | "WARM" => Ok(Self::Morno),
            "FRIO" | "COLD" => Ok(Self::Frio),
            "DESQUALIFICADO" | "DISQUALIFIED" => Ok(Self::Desqualificado),
            other => Err(format!("classificação desconhecida: {}", other)),
        }
    }
}

// Ciclo de vida comercial do lead
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Novo,
    Contatado,
    Qualificado,
    Convertido,
    Descartado,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "lead_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    #[default]
    Form,
    Chat,
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "form" => Ok(Self::Form),
            "chat" => Ok(Self::Chat),
            other => Err(format!("origem desconhecida: {}", other)),
        }
    }
}

// =========================================================================
//  RESPOSTAS (Colunas fixas + mapa de sobra)
// =========================================================================

/// Ids de pergunta que têm coluna própria na tabela `form_leads`.
pub const KNOWN_ANSWER_IDS: [&str; 10] = [
    "nome",
    "email",
    "telefone",
    "tipoNegocio",
    "tipoNegocioOutro",
    "tempoNegocio",
    "faturamento",
    "tamanhoEquipe",
    "investimentoMarketing",
    "urgencia",
];

/// Respostas do lead. Perguntas conhecidas vão para colunas nomeadas;
/// perguntas criadas pelo admin caem em `custom_answers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadAnswers {
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "Maria da Silva")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "maria@empresa.com")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "(11) 99999-8888")]
    pub telefone: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "limpeza")]
    pub tipo_negocio: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tipo_negocio_outro: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tempo_negocio: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub faturamento: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tamanho_equipe: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub investimento_marketing: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub urgencia: Option<String>,

    #[serde(default, deserialize_with = "lenient::string_map")]
    #[sqlx(json)]
    #[schema(example = json!({"comoConheceu": "Instagram"}))]
    pub custom_answers: HashMap<String, String>,
}

impl LeadAnswers {
    fn slot(&self, id: &str) -> Option<&Option<String>> {
        let slot = match id {
            "nome" => &self.nome,
            "email" => &self.email,
            "telefone" => &self.telefone,
            "tipoNegocio" => &self.tipo_negocio,
            "tipoNegocioOutro" => &self.tipo_negocio_outro,
            "tempoNegocio" => &self.tempo_negocio,
            "faturamento" => &self.faturamento,
            "tamanhoEquipe" => &self.tamanho_equipe,
            "investimentoMarketing" => &self.investimento_marketing,
            "urgencia" => &self.urgencia,
            _ => return None,
        };
        Some(slot)
    }

    fn slot_mut(&mut self, id: &str) -> Option<&mut Option<String>> {
        let slot = match id {
            "nome" => &mut self.nome,
            "email" => &mut self.email,
            "telefone" => &mut self.telefone,
            "tipoNegocio" => &mut self.tipo_negocio,
            "tipoNegocioOutro" => &mut self.tipo_negocio_outro,
            "tempoNegocio" => &mut self.tempo_negocio,
            "faturamento" => &mut self.faturamento,
            "tamanhoEquipe" => &mut self.tamanho_equipe,
            "investimentoMarketing" => &mut self.investimento_marketing,
            "urgencia" => &mut self.urgencia,
            _ => return None,
        };
        Some(slot)
    }

    /// Resposta atual de uma pergunta (coluna nomeada ou mapa customizado).
    pub fn get(&self, id: &str) -> Option<&str> {
        match self.slot(id) {
            Some(slot) => slot.as_deref(),
            None => self.custom_answers.get(id).map(String::as_str),
        }
    }

    /// Grava uma resposta. Valores em branco são ignorados.
    pub fn set(&mut self, id: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match self.slot_mut(id) {
            Some(slot) => *slot = Some(value.to_string()),
            None => {
                self.custom_answers.insert(id.to_string(), value.to_string());
            }
        }
    }

    /// Todas as respostas preenchidas, indexadas pelo id da pergunta.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut answers: HashMap<String, String> = self
            .custom_answers
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for id in KNOWN_ANSWER_IDS {
            if let Some(value) = self.get(id).filter(|v| !v.trim().is_empty()) {
                answers.insert(id.to_string(), value.to_string());
            }
        }
        answers
    }

    /// Aplica `newer` por cima: valor novo não vazio vence, senão mantém o atual.
    pub fn merge_from(&mut self, newer: &LeadAnswers) {
        for (id, value) in newer.to_map() {
            self.set(&id, &value);
        }
        self.custom_answers.retain(|_, v| !v.trim().is_empty());
    }
}

// =========================================================================
//  PONTUAÇÃO
// =========================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadScores {
    pub score_total: i32,
    pub score_tipo_negocio: i32,
    pub score_tempo_negocio: i32,
    pub score_faturamento: i32,
    pub score_tamanho_equipe: i32,
    pub score_investimento_marketing: i32,
    pub score_urgencia: i32,

    // Chaves sintéticas `score_<id>` das perguntas sem coluna própria
    #[sqlx(json)]
    pub custom_scores: HashMap<String, i32>,
}

// =========================================================================
//  ORIGEM (UTM / navegação)
// =========================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadOrigin {
    #[serde(default, deserialize_with = "lenient::string")]
    pub utm_source: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub utm_medium: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub utm_campaign: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub utm_term: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub utm_content: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub referrer: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub landing_page: Option<String>,
}

impl LeadOrigin {
    pub fn merge_from(&mut self, newer: &LeadOrigin) {
        keep_or_replace(&mut self.utm_source, &newer.utm_source);
        keep_or_replace(&mut self.utm_medium, &newer.utm_medium);
        keep_or_replace(&mut self.utm_campaign, &newer.utm_campaign);
        keep_or_replace(&mut self.utm_term, &newer.utm_term);
        keep_or_replace(&mut self.utm_content, &newer.utm_content);
        keep_or_replace(&mut self.referrer, &newer.referrer);
        keep_or_replace(&mut self.landing_page, &newer.landing_page);
    }
}

/// Substitui `current` só quando `newer` tem conteúdo.
pub fn keep_or_replace(current: &mut Option<String>, newer: &Option<String>) {
    if let Some(value) = newer.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *current = Some(value.to_string());
    }
}

// =========================================================================
//  LEAD (O registro persistido)
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormLead {
    pub id: Uuid,
    #[schema(example = "sess_8f2c1a")]
    pub session_id: String,
    pub conversation_id: Option<String>,

    #[serde(flatten)]
    #[sqlx(flatten)]
    pub answers: LeadAnswers,

    #[serde(flatten)]
    #[sqlx(flatten)]
    pub scores: LeadScores,

    // Índice (ordem) da última pergunta respondida. Nunca diminui.
    pub ultima_pergunta_respondida: i32,
    // Uma vez `true`, nunca volta a `false`
    pub form_completo: bool,
    pub classificacao: Option<LeadClassification>,
    pub tempo_total_segundos: Option<i32>,

    #[serde(flatten)]
    #[sqlx(flatten)]
    pub origin: LeadOrigin,
    pub user_agent: Option<String>,

    pub source: LeadSource,
    pub status: LeadStatus,
    pub observacoes: Option<String>,

    // Sincronização com o CRM externo
    pub ghl_contact_id: Option<String>,
    pub ghl_sync_status: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =========================================================================
//  ENTRADA DE PROGRESSO
// =========================================================================

/// Um passo do formulário: o que foi respondido agora + o ponteiro da pergunta.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormLeadProgress {
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "sess_8f2c1a")]
    pub session_id: String,

    // Ordem da pergunta que acabou de ser respondida
    #[serde(default, deserialize_with = "lenient::integer")]
    #[schema(example = 4)]
    pub question_number: Option<i32>,

    #[serde(flatten)]
    pub answers: LeadAnswers,

    #[serde(default, deserialize_with = "lenient::boolean")]
    pub form_completo: Option<bool>,

    #[serde(default, deserialize_with = "lenient::parsed")]
    pub classificacao: Option<LeadClassification>,

    #[serde(default, deserialize_with = "lenient::integer")]
    pub tempo_total_segundos: Option<i32>,

    #[serde(flatten)]
    pub origin: LeadOrigin,

    // Quando o visitante abriu o formulário (RFC 3339)
    #[serde(default, deserialize_with = "lenient::string")]
    #[schema(example = "2026-10-17T12:30:00Z")]
    pub started_at: Option<String>,
}

/// Dados de contexto de quem chamou (formulário web ou chat).
#[derive(Debug, Clone, Default)]
pub struct ProgressMetadata {
    pub user_agent: Option<String>,
    pub conversation_id: Option<String>,
    pub source: Option<LeadSource>,
}

// =========================================================================
//  CONSULTAS ADMINISTRATIVAS
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadFilter {
    pub classificacao: Option<LeadClassification>,
    pub status: Option<LeadStatus>,
    pub form_completo: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadStatusPayload {
    pub status: LeadStatus,

    #[validate(length(max = 2000, message = "too_long"))]
    #[schema(example = "Ligar na segunda de manhã")]
    pub observacoes: Option<String>,
}

/// Foto do andamento de um lead, usada pelo chat para saber o que perguntar.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub lead: Option<FormLead>,
    pub answered_question_ids: Vec<String>,
    pub next_question: Option<crate::models::form::FormQuestion>,
    pub max_score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_known_ids_to_columns_and_rest_to_custom() {
        let mut answers = LeadAnswers::default();
        answers.set("tipoNegocio", " limpeza ");
        answers.set("comoConheceu", "Instagram");
        answers.set("email", "   ");

        assert_eq!(answers.tipo_negocio.as_deref(), Some("limpeza"));
        assert_eq!(answers.get("comoConheceu"), Some("Instagram"));
        assert!(answers.email.is_none());
        assert!(!answers.custom_answers.contains_key("tipoNegocio"));
    }

    #[test]
    fn merge_keeps_existing_when_new_is_blank() {
        let mut stored = LeadAnswers {
            nome: Some("Maria".to_string()),
            email: Some("maria@empresa.com".to_string()),
            ..Default::default()
        };
        stored.custom_answers.insert("comoConheceu".to_string(), "Google".to_string());

        let newer = LeadAnswers {
            nome: None,
            email: Some("".to_string()),
            faturamento: Some("30k_100k".to_string()),
            ..Default::default()
        };

        stored.merge_from(&newer);
        assert_eq!(stored.nome.as_deref(), Some("Maria"));
        assert_eq!(stored.email.as_deref(), Some("maria@empresa.com"));
        assert_eq!(stored.faturamento.as_deref(), Some("30k_100k"));
        assert_eq!(stored.get("comoConheceu"), Some("Google"));
    }

    #[test]
    fn progress_deserializes_flattened_answers_leniently() {
        let progress: FormLeadProgress = serde_json::from_value(serde_json::json!({
            "sessionId": "s1",
            "questionNumber": "3",
            "nome": "João",
            "telefone": 11999998888u64,
            "customAnswers": {"comoConheceu": "Indicação", "vazio": " ", "numero": 4},
            "classificacao": "hot",
            "formCompleto": "false",
            "utmSource": "google"
        }))
        .unwrap();

        assert_eq!(progress.question_number, Some(3));
        assert_eq!(progress.answers.nome.as_deref(), Some("João"));
        assert_eq!(progress.answers.telefone.as_deref(), Some("11999998888"));
        assert_eq!(progress.answers.custom_answers.len(), 1);
        assert_eq!(progress.classificacao, Some(LeadClassification::Quente));
        assert_eq!(progress.form_completo, Some(false));
        assert_eq!(progress.origin.utm_source.as_deref(), Some("google"));
    }

    #[test]
    fn unknown_classification_is_dropped_not_rejected() {
        let progress: FormLeadProgress = serde_json::from_value(serde_json::json!({
            "sessionId": "s1",
            "classificacao": "MUITO_QUENTE"
        }))
        .unwrap();
        assert!(progress.classificacao.is_none());
    }

    #[test]
    fn classification_serializes_uppercase() {
        let json = serde_json::to_string(&LeadClassification::Desqualificado).unwrap();
        assert_eq!(json, "\"DESQUALIFICADO\"");
        assert_eq!("morno".parse::<LeadClassification>(), Ok(LeadClassification::Morno));
    }
}
