// src/models/form.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Email,
    Tel,
    Select,
}

// --- PERGUNTAS (O Molde do Formulário) ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    // Valor gravado na resposta
    #[schema(example = "mais_5_anos")]
    pub value: String,
    // Texto exibido
    #[schema(example = "Mais de 5 anos")]
    pub label: String,
    #[schema(example = 10)]
    pub points: i32,
}

/// Campo livre que aparece quando a resposta da pergunta-pai é `show_when`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalField {
    #[schema(example = "outro")]
    pub show_when: String,
    #[schema(example = "tipoNegocioOutro")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormQuestion {
    // Também é o nome do campo da resposta persistida
    #[schema(example = "tipoNegocio")]
    pub id: String,
    pub order: i32,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_field: Option<ConditionalField>,
}

impl FormQuestion {
    pub fn is_select(&self) -> bool {
        self.question_type == QuestionType::Select
    }

    pub fn options(&self) -> &[QuestionOption] {
        self.options.as_deref().unwrap_or(&[])
    }

    /// Opção escolhida, casando por `value` ou por `label`.
    /// Alguns chamadores (o chat, principalmente) mandam o texto exibido.
    pub fn option_for(&self, answer: &str) -> Option<&QuestionOption> {
        self.options()
            .iter()
            .find(|o| o.value == answer || o.label == answer)
    }
}

// --- LIMIARES DE CLASSIFICAÇÃO ---

/// Pontuações mínimas (crescentes) de cada faixa: `hot > warm > cold`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Thresholds {
    #[schema(example = 58)]
    pub hot: i32,
    #[schema(example = 40)]
    pub warm: i32,
    #[schema(example = 25)]
    pub cold: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { hot: 58, warm: 40, cold: 25 }
    }
}

// --- CONFIGURAÇÃO COMPLETA ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    pub questions: Vec<FormQuestion>,
    #[serde(default)]
    pub max_score: i32,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl FormConfig {
    /// Quantidade de perguntas usada para limitar o progresso.
    /// Uma configuração vazia cai no tamanho da configuração padrão.
    pub fn total_questions(&self) -> i32 {
        if self.questions.is_empty() {
            Self::default().questions.len() as i32
        } else {
            self.questions.len() as i32
        }
    }
}

/// Cópia das perguntas ordenada por `order`. O array gravado não tem ordem garantida.
pub fn get_sorted_questions(config: &FormConfig) -> Vec<FormQuestion> {
    let mut questions = config.questions.clone();
    questions.sort_by_key(|q| q.order);
    questions
}

/// Soma da melhor opção de cada pergunta de seleção.
pub fn calculate_max_score(config: &FormConfig) -> i32 {
    config
        .questions
        .iter()
        .filter(|q| q.is_select())
        .map(|q| q.options().iter().map(|o| o.points).max().unwrap_or(0))
        .sum()
}

/// Validação estrutural usada quando o admin substitui a configuração.
pub fn validate_form_config(config: &FormConfig) -> Result<(), String> {
    if config.questions.is_empty() {
        return Err("O formulário precisa de pelo menos uma pergunta.".to_string());
    }

    let mut seen: HashSet<&str> = HashSet::new();

    for question in &config.questions {
        if question.id.trim().is_empty() {
            return Err(format!("A pergunta de ordem {} está sem id.", question.order));
        }
        if !seen.insert(question.id.as_str()) {
            return Err(format!("Id de pergunta duplicado: '{}'.", question.id));
        }

        if question.is_select() && question.options().is_empty() {
            return Err(format!("A pergunta '{}' é de seleção mas não tem opções.", question.id));
        }

        if let Some(cond) = &question.conditional_field {
            if cond.id.trim().is_empty() {
                return Err(format!("O campo condicional de '{}' está sem id.", question.id));
            }
            if !question.options().iter().any(|o| o.value == cond.show_when) {
                return Err(format!(
                    "O campo condicional '{}' depende do valor '{}', que não existe em '{}'.",
                    cond.id, cond.show_when, question.id
                ));
            }
            if !seen.insert(cond.id.as_str()) {
                return Err(format!("Id de pergunta duplicado: '{}'.", cond.id));
            }
        }
    }

    let t = config.thresholds;
    if !(t.hot > t.warm && t.warm > t.cold) {
        return Err("Os limiares devem obedecer hot > warm > cold.".to_string());
    }

    Ok(())
}

// =========================================================================
//  CONFIGURAÇÃO PADRÃO
// =========================================================================

fn option(value: &str, label: &str, points: i32) -> QuestionOption {
    QuestionOption {
        value: value.to_string(),
        label: label.to_string(),
        points,
    }
}

fn free_question(id: &str, order: i32, title: &str, question_type: QuestionType, placeholder: &str) -> FormQuestion {
    FormQuestion {
        id: id.to_string(),
        order,
        title: title.to_string(),
        question_type,
        required: true,
        placeholder: Some(placeholder.to_string()),
        options: None,
        conditional_field: None,
    }
}

fn select_question(id: &str, order: i32, title: &str, options: Vec<QuestionOption>) -> FormQuestion {
    FormQuestion {
        id: id.to_string(),
        order,
        title: title.to_string(),
        question_type: QuestionType::Select,
        required: true,
        placeholder: None,
        options: Some(options),
        conditional_field: None,
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        let mut tipo_negocio = select_question(
            "tipoNegocio",
            4,
            "Qual é o tipo do seu negócio?",
            vec![
                option("limpeza", "Limpeza", 10),
                option("reformas", "Reformas e Construção", 10),
                option("climatizacao", "Climatização", 10),
                option("paisagismo", "Paisagismo", 8),
                option("outro", "Outro", 5),
            ],
        );
        tipo_negocio.conditional_field = Some(ConditionalField {
            show_when: "outro".to_string(),
            id: "tipoNegocioOutro".to_string(),
            title: "Qual é o seu segmento?".to_string(),
            placeholder: Some("Ex: Dedetização".to_string()),
        });

        let questions = vec![
            free_question("nome", 1, "Qual é o seu nome completo?", QuestionType::Text, "Seu nome"),
            free_question("email", 2, "Qual é o seu melhor e-mail?", QuestionType::Email, "voce@empresa.com"),
            free_question("telefone", 3, "Qual é o seu WhatsApp?", QuestionType::Tel, "(11) 99999-8888"),
            tipo_negocio,
            select_question(
                "tempoNegocio",
                5,
                "Há quanto tempo a empresa está no mercado?",
                vec![
                    option("menos_1_ano", "Menos de 1 ano", 2),
                    option("1_3_anos", "1 a 3 anos", 5),
                    option("3_5_anos", "3 a 5 anos", 8),
                    option("mais_5_anos", "Mais de 5 anos", 10),
                ],
            ),
            select_question(
                "faturamento",
                6,
                "Qual é o faturamento mensal aproximado?",
                vec![
                    option("ate_10k", "Até R$ 10 mil", 2),
                    option("10k_30k", "R$ 10 a 30 mil", 6),
                    option("30k_100k", "R$ 30 a 100 mil", 10),
                    option("acima_100k", "Acima de R$ 100 mil", 15),
                ],
            ),
            select_question(
                "tamanhoEquipe",
                7,
                "Quantas pessoas trabalham na empresa?",
                vec![
                    option("so_eu", "Só eu", 1),
                    option("2_5", "2 a 5", 4),
                    option("6_15", "6 a 15", 7),
                    option("mais_15", "Mais de 15", 10),
                ],
            ),
            select_question(
                "investimentoMarketing",
                8,
                "Quanto você investe por mês em marketing?",
                vec![
                    option("nada", "Nada ainda", 0),
                    option("ate_1k", "Até R$ 1 mil", 4),
                    option("1k_3k", "R$ 1 a 3 mil", 8),
                    option("acima_3k", "Acima de R$ 3 mil", 12),
                ],
            ),
            select_question(
                "urgencia",
                9,
                "Quando você quer começar?",
                vec![
                    option("imediatamente", "Imediatamente", 10),
                    option("30_dias", "Nos próximos 30 dias", 7),
                    option("3_meses", "Em até 3 meses", 3),
                    option("pesquisando", "Só estou pesquisando", 0),
                ],
            ),
        ];

        let mut config = FormConfig {
            questions,
            max_score: 0,
            thresholds: Thresholds::default(),
        };
        config.max_score = calculate_max_score(&config);
        config
    }
}
