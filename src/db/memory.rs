// src/db/memory.rs

// Implementações em memória dos repositórios, usadas pelos testes.
// Reproduzem as restrições de unicidade do Postgres (session_id / conversation_id).

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{form_lead_repo::page_bounds, FormLeadStore, SettingsStore},
    models::lead::{FormLead, LeadFilter, LeadStatus},
};

#[derive(Default)]
pub struct InMemoryFormLeadStore {
    leads: Mutex<Vec<FormLead>>,
    // Quantas buscas devem "errar" de propósito (simula leitura antes do commit alheio)
    stale_lookups: AtomicUsize,
    inserts: AtomicUsize,
}

impl InMemoryFormLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// As próximas `n` buscas por sessão/conversa retornam `None`.
    pub fn miss_next_lookups(&self, n: usize) {
        self.stale_lookups.store(n, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<FormLead> {
        self.leads.lock().unwrap().clone()
    }

    pub fn insert_attempts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    fn should_miss(&self) -> bool {
        self.stale_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn conflicts(existing: &FormLead, lead: &FormLead) -> bool {
        existing.id != lead.id
            && (existing.session_id == lead.session_id
                || (lead.conversation_id.is_some() && existing.conversation_id == lead.conversation_id))
    }
}

#[async_trait]
impl FormLeadStore for InMemoryFormLeadStore {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<FormLead>, AppError> {
        if self.should_miss() {
            return Ok(None);
        }
        let leads = self.leads.lock().unwrap();
        Ok(leads.iter().find(|l| l.session_id == session_id).cloned())
    }

    async fn find_by_conversation_id(&self, conversation_id: &str) -> Result<Option<FormLead>, AppError> {
        if self.should_miss() {
            return Ok(None);
        }
        let leads = self.leads.lock().unwrap();
        Ok(leads
            .iter()
            .find(|l| l.conversation_id.as_deref() == Some(conversation_id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FormLead>, AppError> {
        let leads = self.leads.lock().unwrap();
        Ok(leads.iter().find(|l| l.id == id).cloned())
    }

    async fn insert(&self, lead: &FormLead) -> Result<FormLead, AppError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut leads = self.leads.lock().unwrap();
        if leads.iter().any(|existing| Self::conflicts(existing, lead)) {
            return Err(AppError::UniqueConstraintViolation(format!(
                "Lead da sessão '{}' já existe.",
                lead.session_id
            )));
        }
        leads.push(lead.clone());
        Ok(lead.clone())
    }

    async fn update(&self, lead: &FormLead) -> Result<FormLead, AppError> {
        let mut leads = self.leads.lock().unwrap();
        if leads.iter().any(|existing| Self::conflicts(existing, lead)) {
            return Err(AppError::UniqueConstraintViolation("conversa já vinculada".to_string()));
        }
        let slot = leads
            .iter_mut()
            .find(|l| l.id == lead.id)
            .ok_or(AppError::LeadNotFound)?;

        // Mesmo contrato do UPDATE do Postgres: campos do admin ficam como estão
        let mut updated = lead.clone();
        updated.status = slot.status;
        updated.observacoes = slot.observacoes.clone();
        updated.ghl_contact_id = slot.ghl_contact_id.clone();
        updated.ghl_sync_status = slot.ghl_sync_status.clone();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn list(&self, filter: &LeadFilter) -> Result<Vec<FormLead>, AppError> {
        let (limit, offset) = page_bounds(filter);
        let mut leads: Vec<FormLead> = self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| filter.classificacao.is_none() || l.classificacao == filter.classificacao)
            .filter(|l| filter.status.is_none_or(|s| l.status == s))
            .filter(|l| filter.form_completo.is_none_or(|c| l.form_completo == c))
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        observacoes: Option<&str>,
    ) -> Result<Option<FormLead>, AppError> {
        let mut leads = self.leads.lock().unwrap();
        let Some(lead) = leads.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        lead.status = status;
        if let Some(obs) = observacoes {
            lead.observacoes = Some(obs.to_string());
        }
        lead.updated_at = Utc::now();
        Ok(Some(lead.clone()))
    }
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    form_config: Mutex<Option<Value>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(value: Value) -> Self {
        Self {
            form_config: Mutex::new(Some(value)),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get_form_config(&self) -> Result<Option<Value>, AppError> {
        Ok(self.form_config.lock().unwrap().clone())
    }

    async fn save_form_config(&self, config: &Value) -> Result<(), AppError> {
        *self.form_config.lock().unwrap() = Some(config.clone());
        Ok(())
    }
}
