// src/db/form_lead_repo.rs

use async_trait::async_trait;
use sqlx::{
    postgres::PgArguments,
    query::QueryAs,
    types::Json,
    PgPool, Postgres,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{FormLead, LeadFilter, LeadStatus},
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Contrato de persistência dos leads do formulário.
///
/// `insert` precisa devolver `AppError::UniqueConstraintViolation` quando
/// `session_id` ou `conversation_id` já existem: o serviço de progresso
/// usa isso para refazer a operação como atualização.
#[async_trait]
pub trait FormLeadStore: Send + Sync {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<FormLead>, AppError>;

    async fn find_by_conversation_id(&self, conversation_id: &str) -> Result<Option<FormLead>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FormLead>, AppError>;

    async fn insert(&self, lead: &FormLead) -> Result<FormLead, AppError>;

    /// Grava o resultado do merge de progresso sobre a linha de mesmo `id`.
    /// `status`, `observacoes` e `ghl_*` são do admin e não são tocados.
    async fn update(&self, lead: &FormLead) -> Result<FormLead, AppError>;

    /// Mais recentes primeiro.
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<FormLead>, AppError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        observacoes: Option<&str>,
    ) -> Result<Option<FormLead>, AppError>;
}

pub(crate) fn page_bounds(filter: &LeadFilter) -> (i64, i64) {
    let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = filter.offset.unwrap_or(0).max(0);
    (limit, offset)
}

// =========================================================================
//  POSTGRES
// =========================================================================

const LEAD_COLUMNS: &str = r#"
    id, session_id, conversation_id,
    nome, email, telefone, tipo_negocio, tipo_negocio_outro, tempo_negocio,
    faturamento, tamanho_equipe, investimento_marketing, urgencia, custom_answers,
    score_total, score_tipo_negocio, score_tempo_negocio, score_faturamento,
    score_tamanho_equipe, score_investimento_marketing, score_urgencia, custom_scores,
    ultima_pergunta_respondida, form_completo, classificacao, tempo_total_segundos,
    utm_source, utm_medium, utm_campaign, utm_term, utm_content, referrer, landing_page,
    user_agent, source, created_at, updated_at,
    status, observacoes, ghl_contact_id, ghl_sync_status
"#;

// Colunas do admin ($38..$41): o UPDATE de progresso nunca as escreve
const ADMIN_COLUMN_COUNT: usize = 4;

#[derive(Clone)]
pub struct FormLeadRepository {
    pool: PgPool,
}

impl FormLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Liga $1..$37: tudo que o merge de progresso controla
fn bind_progress<'q>(
    query: QueryAs<'q, Postgres, FormLead, PgArguments>,
    lead: &'q FormLead,
) -> QueryAs<'q, Postgres, FormLead, PgArguments> {
    let a = &lead.answers;
    let s = &lead.scores;
    let o = &lead.origin;

    query
        .bind(lead.id)
        .bind(&lead.session_id)
        .bind(&lead.conversation_id)
        .bind(&a.nome)
        .bind(&a.email)
        .bind(&a.telefone)
        .bind(&a.tipo_negocio)
        .bind(&a.tipo_negocio_outro)
        .bind(&a.tempo_negocio)
        .bind(&a.faturamento)
        .bind(&a.tamanho_equipe)
        .bind(&a.investimento_marketing)
        .bind(&a.urgencia)
        .bind(Json(&a.custom_answers))
        .bind(s.score_total)
        .bind(s.score_tipo_negocio)
        .bind(s.score_tempo_negocio)
        .bind(s.score_faturamento)
        .bind(s.score_tamanho_equipe)
        .bind(s.score_investimento_marketing)
        .bind(s.score_urgencia)
        .bind(Json(&s.custom_scores))
        .bind(lead.ultima_pergunta_respondida)
        .bind(lead.form_completo)
        .bind(lead.classificacao)
        .bind(lead.tempo_total_segundos)
        .bind(&o.utm_source)
        .bind(&o.utm_medium)
        .bind(&o.utm_campaign)
        .bind(&o.utm_term)
        .bind(&o.utm_content)
        .bind(&o.referrer)
        .bind(&o.landing_page)
        .bind(&lead.user_agent)
        .bind(lead.source)
        .bind(lead.created_at)
        .bind(lead.updated_at)
}

// Liga os 41 campos na mesma ordem de LEAD_COLUMNS ($1..$41)
fn bind_lead<'q>(
    query: QueryAs<'q, Postgres, FormLead, PgArguments>,
    lead: &'q FormLead,
) -> QueryAs<'q, Postgres, FormLead, PgArguments> {
    bind_progress(query, lead)
        .bind(lead.status)
        .bind(&lead.observacoes)
        .bind(&lead.ghl_contact_id)
        .bind(&lead.ghl_sync_status)
}

// status, observacoes e ghl_* ficam de fora: um PATCH do admin entre a
// leitura e esta escrita não pode ser desfeito.
fn update_progress_sql() -> String {
    format!(
        r#"
        UPDATE form_leads SET
            session_id = $2, conversation_id = $3,
            nome = $4, email = $5, telefone = $6, tipo_negocio = $7, tipo_negocio_outro = $8,
            tempo_negocio = $9, faturamento = $10, tamanho_equipe = $11,
            investimento_marketing = $12, urgencia = $13, custom_answers = $14,
            score_total = $15, score_tipo_negocio = $16, score_tempo_negocio = $17,
            score_faturamento = $18, score_tamanho_equipe = $19,
            score_investimento_marketing = $20, score_urgencia = $21, custom_scores = $22,
            ultima_pergunta_respondida = $23, form_completo = $24, classificacao = $25,
            tempo_total_segundos = $26,
            utm_source = $27, utm_medium = $28, utm_campaign = $29, utm_term = $30,
            utm_content = $31, referrer = $32, landing_page = $33,
            user_agent = $34, source = $35,
            created_at = $36, updated_at = $37
        WHERE id = $1
        RETURNING {}
        "#,
        LEAD_COLUMNS
    )
}

#[async_trait]
impl FormLeadStore for FormLeadRepository {
    async fn find_by_session(&self, session_id: &str) -> Result<Option<FormLead>, AppError> {
        let sql = format!("SELECT {} FROM form_leads WHERE session_id = $1", LEAD_COLUMNS);
        let lead = sqlx::query_as::<_, FormLead>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    async fn find_by_conversation_id(&self, conversation_id: &str) -> Result<Option<FormLead>, AppError> {
        let sql = format!("SELECT {} FROM form_leads WHERE conversation_id = $1", LEAD_COLUMNS);
        let lead = sqlx::query_as::<_, FormLead>(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FormLead>, AppError> {
        let sql = format!("SELECT {} FROM form_leads WHERE id = $1", LEAD_COLUMNS);
        let lead = sqlx::query_as::<_, FormLead>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    async fn insert(&self, lead: &FormLead) -> Result<FormLead, AppError> {
        let placeholders = (1..=41).map(|i| format!("${}", i)).collect::<Vec<_>>().join(", ");
        let sql = format!(
            "INSERT INTO form_leads ({cols}) VALUES ({placeholders}) RETURNING {cols}",
            cols = LEAD_COLUMNS,
            placeholders = placeholders,
        );

        bind_lead(sqlx::query_as::<_, FormLead>(&sql), lead)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                // 23505: outra requisição criou o lead desta sessão primeiro
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!(
                            "Lead da sessão '{}' já existe.",
                            lead.session_id
                        ));
                    }
                }
                e.into()
            })
    }

    async fn update(&self, lead: &FormLead) -> Result<FormLead, AppError> {
        let sql = update_progress_sql();

        let updated = bind_progress(sqlx::query_as::<_, FormLead>(&sql), lead)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::UniqueConstraintViolation(format!(
                            "Conversa '{}' já vinculada a outro lead.",
                            lead.conversation_id.as_deref().unwrap_or("?")
                        ));
                    }
                }
                e.into()
            })?;

        updated.ok_or(AppError::LeadNotFound)
    }
    async fn list(&self, filter: &LeadFilter) -> Result<Vec<FormLead>, AppError> {
        let (limit, offset) = page_bounds(filter);
        let sql = format!(
            r#"
            SELECT {}
            FROM form_leads
            WHERE ($1::lead_classification IS NULL OR classificacao = $1)
              AND ($2::lead_status IS NULL OR status = $2)
              AND ($3::boolean IS NULL OR form_completo = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            LEAD_COLUMNS
        );

        let leads = sqlx::query_as::<_, FormLead>(&sql)
            .bind(filter.classificacao)
            .bind(filter.status)
            .bind(filter.form_completo)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(leads)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: LeadStatus,
        observacoes: Option<&str>,
    ) -> Result<Option<FormLead>, AppError> {
        // Observação ausente mantém a atual
        let sql = format!(
            r#"
            UPDATE form_leads
            SET status = $2,
                observacoes = COALESCE($3, observacoes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LEAD_COLUMNS
        );

        let lead = sqlx::query_as::<_, FormLead>(&sql)
            .bind(id)
            .bind(status)
            .bind(observacoes)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }
}
