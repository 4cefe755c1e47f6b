// src/common/lenient.rs

// Desserializadores tolerantes para a entrada do formulário e do chat.
// Valor ausente, nulo ou malformado vira `None` em vez de rejeitar o payload.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Texto opcional. Números e booleanos viram texto; strings em branco viram `None`.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

/// Inteiro opcional. Aceita número ou string numérica.
pub fn integer<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|i| i32::try_from(i).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }))
}

/// Booleano opcional. Aceita `true`/`false` e as strings equivalentes.
pub fn boolean<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "sim" | "1" => Some(true),
            "false" | "nao" | "não" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }))
}

/// Qualquer tipo com `FromStr` (ex: enums). Valores desconhecidos viram `None`.
pub fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(value_to_string)
        .and_then(|s| s.parse::<T>().ok()))
}

/// Mapa de respostas livres. Só sobrevivem valores string não vazios.
pub fn string_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = value else {
        return Ok(HashMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, v)| match v {
            Value::String(s) if !s.trim().is_empty() => Some((key, s.trim().to_string())),
            _ => None,
        })
        .collect())
}

/// Mapa de respostas vindas do chat: números e booleanos viram texto,
/// como nos campos nomeados do formulário. Vazios e objetos são descartados.
pub fn coerced_string_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = value else {
        return Ok(HashMap::new());
    };

    Ok(map
        .into_iter()
        .filter_map(|(key, v)| value_to_string(v).map(|text| (key, text)))
        .collect())
}

fn value_to_string(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "string")]
        text: Option<String>,
        #[serde(default, deserialize_with = "integer")]
        number: Option<i32>,
        #[serde(default, deserialize_with = "boolean")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "string_map")]
        extra: HashMap<String, String>,
    }

    #[test]
    fn coerces_loose_values() {
        let probe: Probe = serde_json::from_value(serde_json::json!({
            "text": 11999998888u64,
            "number": "7",
            "flag": "true",
            "extra": {"a": " x ", "b": "", "c": 3, "d": null}
        }))
        .unwrap();

        assert_eq!(probe.text.as_deref(), Some("11999998888"));
        assert_eq!(probe.number, Some(7));
        assert_eq!(probe.flag, Some(true));
        assert_eq!(probe.extra.len(), 1);
        assert_eq!(probe.extra.get("a").map(String::as_str), Some("x"));
    }

    #[test]
    fn malformed_values_become_none() {
        let probe: Probe = serde_json::from_value(serde_json::json!({
            "text": "   ",
            "number": "sete",
            "flag": {"x": 1},
            "extra": ["nao", "e", "mapa"]
        }))
        .unwrap();

        assert!(probe.text.is_none());
        assert!(probe.number.is_none());
        assert!(probe.flag.is_none());
        assert!(probe.extra.is_empty());
    }

    #[derive(Debug, Deserialize)]
    struct Answers {
        #[serde(default, deserialize_with = "coerced_string_map")]
        answers: HashMap<String, String>,
    }

    #[test]
    fn coerced_map_keeps_numbers_and_booleans_as_text() {
        let parsed: Answers = serde_json::from_value(serde_json::json!({
            "answers": {"telefone": 11999998888u64, "aceita": true, "nome": " Maria ", "vazio": "", "obj": {"x": 1}}
        }))
        .unwrap();

        assert_eq!(parsed.answers.get("telefone").map(String::as_str), Some("11999998888"));
        assert_eq!(parsed.answers.get("aceita").map(String::as_str), Some("true"));
        assert_eq!(parsed.answers.get("nome").map(String::as_str), Some("Maria"));
        assert_eq!(parsed.answers.len(), 3);
    }

    #[test]
    fn missing_fields_default() {
        let probe: Probe = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(probe.text.is_none());
        assert!(probe.number.is_none());
        assert!(probe.extra.is_empty());
    }
}
