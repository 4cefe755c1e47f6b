use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use crate::common::error::AppError;

// A empresa é única (white-label): as configurações ficam na linha id = 1
const SETTINGS_ROW_ID: i32 = 1;

/// Configurações da empresa. O `FormConfig` fica guardado como JSON opaco,
/// quem interpreta é o serviço.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_form_config(&self) -> Result<Option<Value>, AppError>;

    async fn save_form_config(&self, config: &Value) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get_form_config(&self) -> Result<Option<Value>, AppError> {
        // Sem linha ou coluna nula: o serviço usa a configuração padrão
        let row: Option<(Option<Value>,)> =
            sqlx::query_as("SELECT form_config FROM company_settings WHERE id = $1")
                .bind(SETTINGS_ROW_ID)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(config,)| config))
    }

    async fn save_form_config(&self, config: &Value) -> Result<(), AppError> {
        // UPSERT (Insert or Update): substitui o documento inteiro
        sqlx::query(
            r#"
            INSERT INTO company_settings (id, form_config)
            VALUES ($1, $2)
            ON CONFLICT (id)
            DO UPDATE SET
                form_config = EXCLUDED.form_config,
                updated_at = NOW()
            "#,
        )
        .bind(SETTINGS_ROW_ID)
        .bind(config)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
