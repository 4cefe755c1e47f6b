// src/services/form_lead_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FormLeadStore,
    models::{
        form::{get_sorted_questions, FormConfig, FormQuestion, QuestionType},
        lead::{FormLead, FormLeadProgress, LeadFilter, LeadStatus, ProgressMetadata, ProgressSnapshot},
    },
    services::lead_progress::merge_progress,
};

#[derive(Clone)]
pub struct FormLeadService {
    store: Arc<dyn FormLeadStore>,
}

impl FormLeadService {
    pub fn new(store: Arc<dyn FormLeadStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  PROGRESSO (Formulário web e chat chamam igual)
    // =========================================================================

    /// Mescla um passo do formulário no lead da sessão e devolve o registro gravado.
    ///
    /// Sem `form_config`, usa a configuração padrão.
    pub async fn upsert_form_lead_progress(
        &self,
        progress: FormLeadProgress,
        metadata: ProgressMetadata,
        form_config: Option<&FormConfig>,
    ) -> Result<FormLead, AppError> {
        let session_id = progress.session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::SessionIdRequired);
        }

        let default_config;
        let config = match form_config {
            Some(config) => config,
            None => {
                default_config = FormConfig::default();
                &default_config
            }
        };

        let conversation_id = metadata.conversation_id.as_deref();
        let existing = self.find_existing(session_id, conversation_id).await?;

        // Lead novo só nasce com nome
        if existing.is_none() && progress.answers.nome.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(AppError::FullNameRequired);
        }

        let merged = merge_progress(existing.as_ref(), &progress, &metadata, config, Utc::now());

        if let Some(previous) = &existing {
            if merged.form_completo && !previous.form_completo {
                log_completion(&merged);
            }
            return self.store.update(&merged).await;
        }

        match self.store.insert(&merged).await {
            Ok(lead) => {
                tracing::info!(
                    "🆕 Lead criado para a sessão {} (origem: {:?})",
                    lead.session_id,
                    lead.source
                );
                if lead.form_completo {
                    log_completion(&lead);
                }
                Ok(lead)
            }
            Err(AppError::UniqueConstraintViolation(_)) => {
                // Outra requisição da mesma sessão inseriu primeiro: mescla no registro dela
                tracing::warn!(
                    "⚠️ Corrida na criação do lead da sessão {}; refazendo como atualização.",
                    session_id
                );
                let winner = self
                    .find_existing(session_id, conversation_id)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("violação de unicidade sem registro visível para a sessão {}", session_id)
                    })?;

                let merged = merge_progress(Some(&winner), &progress, &metadata, config, Utc::now());
                self.store.update(&merged).await
            }
            Err(e) => Err(e),
        }
    }

    // Conversa primeiro, sessão como chave de reserva
    async fn find_existing(
        &self,
        session_id: &str,
        conversation_id: Option<&str>,
    ) -> Result<Option<FormLead>, AppError> {
        if let Some(conversation_id) = conversation_id.map(str::trim).filter(|c| !c.is_empty()) {
            if let Some(lead) = self.store.find_by_conversation_id(conversation_id).await? {
                return Ok(Some(lead));
            }
        }
        self.store.find_by_session(session_id).await
    }

    /// Andamento atual do lead: o que já foi respondido e qual é a próxima pergunta.
    pub async fn get_progress(
        &self,
        session_id: Option<&str>,
        conversation_id: Option<&str>,
        config: &FormConfig,
    ) -> Result<ProgressSnapshot, AppError> {
        let session_id = session_id.map(str::trim).unwrap_or("");
        let lead = match (session_id.is_empty(), conversation_id) {
            (true, None) => return Err(AppError::SessionIdRequired),
            _ => self.find_existing(session_id, conversation_id).await?,
        };

        Ok(build_snapshot(lead, config))
    }

    // =========================================================================
    //  ADMINISTRAÇÃO
    // =========================================================================

    pub async fn list_leads(&self, filter: &LeadFilter) -> Result<Vec<FormLead>, AppError> {
        self.store.list(filter).await
    }

    pub async fn get_lead(&self, id: Uuid) -> Result<FormLead, AppError> {
        self.store.find_by_id(id).await?.ok_or(AppError::LeadNotFound)
    }

    /// Só status e observações são editáveis pelo admin.
    pub async fn update_lead_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        observacoes: Option<&str>,
    ) -> Result<FormLead, AppError> {
        let lead = self
            .store
            .update_status(id, status, observacoes)
            .await?
            .ok_or(AppError::LeadNotFound)?;

        tracing::info!("📋 Lead {} agora está '{:?}'", lead.id, lead.status);
        Ok(lead)
    }
}

fn log_completion(lead: &FormLead) {
    if let Some(tier) = lead.classificacao {
        tracing::info!(
            "🏁 Formulário concluído na sessão {}: {} pontos, {}",
            lead.session_id,
            lead.scores.score_total,
            tier
        );
    }
}

// Pergunta virtual para o campo condicional ativo
fn conditional_as_question(parent: &FormQuestion) -> Option<FormQuestion> {
    let cond = parent.conditional_field.as_ref()?;
    Some(FormQuestion {
        id: cond.id.clone(),
        order: parent.order,
        title: cond.title.clone(),
        question_type: QuestionType::Text,
        required: true,
        placeholder: cond.placeholder.clone(),
        options: None,
        conditional_field: None,
    })
}

fn build_snapshot(lead: Option<FormLead>, config: &FormConfig) -> ProgressSnapshot {
    let mut answered_question_ids = Vec::new();
    let mut next_question = None;

    for question in get_sorted_questions(config) {
        let answer = lead.as_ref().and_then(|l| l.answers.get(&question.id));

        let Some(answer) = answer else {
            if next_question.is_none() {
                next_question = Some(question.clone());
            }
            continue;
        };
        answered_question_ids.push(question.id.clone());

        if let Some(cond) = &question.conditional_field {
            // O chat pode ter gravado o rótulo ("Outro") em vez do valor
            let chosen = question.option_for(answer).map_or(answer, |o| o.value.as_str());
            if chosen != cond.show_when {
                continue;
            }
            let detail = lead.as_ref().and_then(|l| l.answers.get(&cond.id));
            if detail.is_some() {
                answered_question_ids.push(cond.id.clone());
            } else if next_question.is_none() {
                next_question = conditional_as_question(&question);
            }
        }
    }

    ProgressSnapshot {
        lead,
        answered_question_ids,
        next_question,
        max_score: config.max_score,
    }
}
