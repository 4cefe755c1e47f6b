// src/services/lead_progress.rs

// Mescla pura de um passo do formulário no lead gravado.
// Toda a regra de "não sobrescrever com vazio" e de monotonicidade mora aqui.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    models::{
        form::FormConfig,
        lead::{
            keep_or_replace, FormLead, FormLeadProgress, LeadScores, LeadStatus, ProgressMetadata,
        },
    },
    services::scoring::{calculate_form_scores_with_config, classify_lead},
};

/// Aceita RFC 3339, data/hora sem fuso (UTC) ou epoch em milissegundos.
pub fn parse_started_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

/// Posição da pergunta respondida, limitada a `[1, total]`.
pub fn clamp_question_number(question_number: Option<i32>, total_questions: i32) -> i32 {
    question_number
        .unwrap_or(1)
        .clamp(1, total_questions.max(1))
}

/// Produz o registro completo depois de aplicar `progress` sobre `existing`.
pub fn merge_progress(
    existing: Option<&FormLead>,
    progress: &FormLeadProgress,
    metadata: &ProgressMetadata,
    config: &FormConfig,
    now: DateTime<Utc>,
) -> FormLead {
    // 1. Respostas: novo não vazio vence, senão mantém
    let mut answers = existing.map(|l| l.answers.clone()).unwrap_or_default();
    answers.merge_from(&progress.answers);

    // 2. Pontuação: sempre do conjunto mesclado inteiro
    let result = calculate_form_scores_with_config(&answers.to_map(), config);
    let scores = LeadScores::from_result(&result);

    // 3. Ponteiro de progresso (nunca diminui)
    let total_questions = config.total_questions();
    let clamped = clamp_question_number(progress.question_number, total_questions);
    let previous = existing.map(|l| l.ultima_pergunta_respondida).unwrap_or(0);
    let ultima_pergunta_respondida = previous.max(clamped);

    // 4. Conclusão (nunca volta a false)
    let form_completo = existing.is_some_and(|l| l.form_completo)
        || progress.form_completo == Some(true)
        || clamped >= total_questions;

    // 5. Classificação final só com o formulário completo
    let classificacao = if form_completo {
        Some(classify_lead(scores.score_total, Some(&config.thresholds)))
    } else {
        existing
            .and_then(|l| l.classificacao)
            .or(progress.classificacao)
    };

    let mut origin = existing.map(|l| l.origin.clone()).unwrap_or_default();
    origin.merge_from(&progress.origin);

    let mut user_agent = existing.and_then(|l| l.user_agent.clone());
    keep_or_replace(&mut user_agent, &metadata.user_agent);

    let mut conversation_id = existing.and_then(|l| l.conversation_id.clone());
    keep_or_replace(&mut conversation_id, &metadata.conversation_id);

    let source = metadata
        .source
        .or(existing.map(|l| l.source))
        .unwrap_or_default();

    let created_at = existing.map(|l| l.created_at).unwrap_or_else(|| {
        progress
            .started_at
            .as_deref()
            .and_then(parse_started_at)
            .unwrap_or(now)
    });

    FormLead {
        id: existing.map(|l| l.id).unwrap_or_else(Uuid::new_v4),
        session_id: existing
            .map(|l| l.session_id.clone())
            .unwrap_or_else(|| progress.session_id.trim().to_string()),
        conversation_id,
        answers,
        scores,
        ultima_pergunta_respondida,
        form_completo,
        classificacao,
        tempo_total_segundos: progress
            .tempo_total_segundos
            .or(existing.and_then(|l| l.tempo_total_segundos)),
        origin,
        user_agent,
        source,
        status: existing.map(|l| l.status).unwrap_or(LeadStatus::Novo),
        observacoes: existing.and_then(|l| l.observacoes.clone()),
        ghl_contact_id: existing.and_then(|l| l.ghl_contact_id.clone()),
        ghl_sync_status: existing.and_then(|l| l.ghl_sync_status.clone()),
        created_at,
        updated_at: now,
    }
}

impl FormLeadProgress {
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }
}
