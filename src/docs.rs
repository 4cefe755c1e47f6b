// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Form ---
        handlers::form::get_form_config,
        handlers::form::submit_progress,
        handlers::form::get_progress,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::get_lead,
        handlers::leads::update_lead_status,

        // --- Settings ---
        handlers::settings::get_form_config,
        handlers::settings::replace_form_config,

        // --- Chat ---
        handlers::chat::list_tools,
        handlers::chat::execute_tool,
    ),
    components(
        schemas(
            // --- FORM ---
            models::form::QuestionType,
            models::form::QuestionOption,
            models::form::ConditionalField,
            models::form::FormQuestion,
            models::form::Thresholds,
            models::form::FormConfig,

            // --- LEADS ---
            models::lead::LeadClassification,
            models::lead::LeadStatus,
            models::lead::LeadSource,
            models::lead::LeadAnswers,
            models::lead::LeadScores,
            models::lead::LeadOrigin,
            models::lead::FormLead,
            models::lead::FormLeadProgress,
            models::lead::ProgressSnapshot,
            models::lead::UpdateLeadStatusPayload,

            // --- Payloads ---
            handlers::form::SubmitProgressPayload,
            services::chat_tools::ChatToolCall,
        )
    ),
    tags(
        (name = "Form", description = "Formulário de Qualificação"),
        (name = "Leads", description = "Gestão de Leads Qualificados"),
        (name = "Settings", description = "Configuração do Formulário"),
        (name = "Chat", description = "Ferramentas do Assistente de Chat")
    )
)]
pub struct ApiDoc;
