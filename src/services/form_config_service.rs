// src/services/form_config_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::SettingsStore,
    models::form::{calculate_max_score, validate_form_config, FormConfig},
};

#[derive(Clone)]
pub struct FormConfigService {
    store: Arc<dyn SettingsStore>,
}

impl FormConfigService {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Configuração em uso. Sem nada gravado (ou com JSON quebrado), vale a padrão.
    pub async fn active_config(&self) -> Result<FormConfig, AppError> {
        let Some(raw) = self.store.get_form_config().await? else {
            return Ok(FormConfig::default());
        };

        match serde_json::from_value::<FormConfig>(raw) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("🔥 Configuração de formulário gravada é inválida, usando a padrão: {}", e);
                Ok(FormConfig::default())
            }
        }
    }

    /// Substitui a configuração inteira. O `max_score` é recalculado.
    pub async fn replace_config(&self, mut config: FormConfig) -> Result<FormConfig, AppError> {
        validate_form_config(&config).map_err(AppError::InvalidFormConfig)?;

        config.max_score = calculate_max_score(&config);

        let raw = serde_json::to_value(&config)
            .map_err(|e| anyhow::anyhow!("Falha ao serializar a configuração: {}", e))?;
        self.store.save_form_config(&raw).await?;

        tracing::info!(
            "✅ Configuração do formulário atualizada ({} perguntas, pontuação máxima {})",
            config.questions.len(),
            config.max_score
        );
        Ok(config)
    }
}
