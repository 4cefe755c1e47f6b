pub mod chat_tools;
pub mod form_config_service;
pub mod form_lead_service;
pub mod lead_progress;
pub mod scoring;
