// src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Settings};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Falha ao carregar a configuração do ambiente.");
    let db_pool = settings
        .connect()
        .await
        .expect("Falha ao conectar ao banco de dados.");

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = routes::router(AppState::new(db_pool));

    let listener = TcpListener::bind(&settings.server_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", settings.server_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
