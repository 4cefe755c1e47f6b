// src/services/scoring.rs

// Funções puras de pontuação e classificação. Nada aqui toca o banco.

use std::collections::{BTreeMap, HashMap};

use crate::models::{
    form::{FormConfig, FormQuestion, Thresholds},
    lead::{LeadClassification, LeadScores},
};

/// Tabela fixa: id da pergunta -> campo de pontuação do lead.
const SCORE_FIELDS: [(&str, &str); 6] = [
    ("tipoNegocio", "scoreTipoNegocio"),
    ("tempoNegocio", "scoreTempoNegocio"),
    ("faturamento", "scoreFaturamento"),
    ("tamanhoEquipe", "scoreTamanhoEquipe"),
    ("investimentoMarketing", "scoreInvestimentoMarketing"),
    ("urgencia", "scoreUrgencia"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreResult {
    pub total: i32,
    pub breakdown: BTreeMap<String, i32>,
}

/// Nome do campo de pontuação de uma pergunta. Perguntas sem coluna
/// própria recebem a chave sintética `score_<id>`.
pub fn score_field_for(question_id: &str) -> String {
    SCORE_FIELDS
        .iter()
        .find(|(id, _)| *id == question_id)
        .map(|(_, field)| field.to_string())
        .unwrap_or_else(|| format!("score_{}", question_id))
}

fn resolve_points(question: &FormQuestion, answer: Option<&str>) -> i32 {
    answer
        .and_then(|a| question.option_for(a))
        .map(|o| o.points)
        .unwrap_or(0)
}

/// Pontua as respostas conhecidas contra a configuração ativa.
/// Pode ser chamada com respostas parciais: o que falta vale zero.
pub fn calculate_form_scores_with_config(
    answers: &HashMap<String, String>,
    config: &FormConfig,
) -> ScoreResult {
    let mut result = ScoreResult::default();

    for question in config.questions.iter().filter(|q| q.is_select()) {
        let answer = answers.get(&question.id).map(String::as_str);
        let mut points = resolve_points(question, answer);

        // Resposta livre do campo condicional ("Outro: Dedetização") não casa
        // com nenhuma opção; vale os pontos da própria opção-gatilho.
        if points == 0 {
            if let Some(cond) = &question.conditional_field {
                let triggered = answer == Some(cond.show_when.as_str());
                let has_detail = answers
                    .get(&cond.id)
                    .is_some_and(|v| !v.trim().is_empty());

                if triggered && has_detail {
                    points = question
                        .options()
                        .iter()
                        .find(|o| o.value == cond.show_when)
                        .map(|o| o.points)
                        .unwrap_or(0);
                }
            }
        }

        result.breakdown.insert(score_field_for(&question.id), points);
        result.total += points;
    }

    result
}

/// Faixas por corte simples: `>= hot` QUENTE, `>= warm` MORNO, `>= cold` FRIO.
pub fn classify_lead(score: i32, thresholds: Option<&Thresholds>) -> LeadClassification {
    let fallback = Thresholds::default();
    let t = thresholds.unwrap_or(&fallback);

    if score >= t.hot {
        LeadClassification::Quente
    } else if score >= t.warm {
        LeadClassification::Morno
    } else if score >= t.cold {
        LeadClassification::Frio
    } else {
        LeadClassification::Desqualificado
    }
}

impl LeadScores {
    /// Recalcula do zero a partir do resultado. Campos ausentes voltam a 0.
    pub fn from_result(result: &ScoreResult) -> Self {
        let mut scores = LeadScores {
            score_total: result.total,
            ..Default::default()
        };

        for (field, points) in &result.breakdown {
            let points = *points;
            match field.as_str() {
                "scoreTipoNegocio" => scores.score_tipo_negocio = points,
                "scoreTempoNegocio" => scores.score_tempo_negocio = points,
                "scoreFaturamento" => scores.score_faturamento = points,
                "scoreTamanhoEquipe" => scores.score_tamanho_equipe = points,
                "scoreInvestimentoMarketing" => scores.score_investimento_marketing = points,
                "scoreUrgencia" => scores.score_urgencia = points,
                other => {
                    scores.custom_scores.insert(other.to_string(), points);
                }
            }
        }
        scores
    }
}
