pub mod form_lead_repo;
pub use form_lead_repo::{FormLeadRepository, FormLeadStore};
pub mod settings_repo;
pub use settings_repo::{SettingsRepository, SettingsStore};

#[cfg(test)]
pub mod memory;
