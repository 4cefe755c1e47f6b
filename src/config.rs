// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{FormLeadRepository, FormLeadStore, SettingsRepository, SettingsStore},
    services::{
        chat_tools::ChatToolService, form_config_service::FormConfigService,
        form_lead_service::FormLeadService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub server_addr: String,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| DEFAULT_SERVER_ADDR.to_string());
        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", raw))?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            server_addr,
            max_connections,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&self.database_url)
            .await?; // <-- Se falhar, retorna um Err em vez de dar panic ou exit

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(pool)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub form_lead_service: FormLeadService,
    pub form_config_service: FormConfigService,
    pub chat_tool_service: ChatToolService,
}

impl AppState {
    pub fn new(db_pool: PgPool) -> Self {
        // --- Monta o gráfico de dependências ---
        let lead_store: Arc<dyn FormLeadStore> = Arc::new(FormLeadRepository::new(db_pool.clone()));
        let settings_store: Arc<dyn SettingsStore> = Arc::new(SettingsRepository::new(db_pool));
        Self::with_stores(lead_store, settings_store)
    }

    pub fn with_stores(lead_store: Arc<dyn FormLeadStore>, settings_store: Arc<dyn SettingsStore>) -> Self {
        let form_lead_service = FormLeadService::new(lead_store);
        let form_config_service = FormConfigService::new(settings_store);
        let chat_tool_service = ChatToolService::new(form_lead_service.clone(), form_config_service.clone());

        Self {
            form_lead_service,
            form_config_service,
            chat_tool_service,
        }
    }
}
