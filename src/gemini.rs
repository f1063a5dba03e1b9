use std::env;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::capture::ImagePayload;
use crate::http_client::http_client;
use crate::state::MatchReport;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const ANALYSIS_PROMPT: &str = "\
Analiza la imagen de este partido de fútbol.
1. Identifica equipos, marcador, competición.
2. Genera un análisis estadístico predictivo completo.
3. Proporciona:
   - Probabilidades de victoria y goles.
   - \"Recomendación Principal\": La mejor apuesta balanceada.
   - \"Predicción Reservada\": Una apuesta muy segura (alta probabilidad, cuota baja).
   - \"Predicción Arriesgada\": Una apuesta difícil pero posible (ej. resultado exacto, \
ganador y ambos marcan, over alto).
   - Para cada predicción, proporciona un \"insight\" breve explicando el MOTIVO \
estadístico de la elección.

Estructura la respuesta estrictamente en JSON.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub demo: bool,
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let api_key = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"));
        let model = non_empty_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = env::var("GEMINI_API_BASE")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let demo = env_bool("GOLAZO_DEMO", false);
        Self {
            api_key,
            model,
            api_base,
            demo,
        }
    }

    pub fn endpoint(&self) -> String {
        let trimmed = self.model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{model_path}:generateContent", self.api_base)
    }
}

pub fn analyze_image(cfg: &GeminiConfig, payload: &ImagePayload) -> Result<MatchReport> {
    let Some(api_key) = cfg.api_key.as_ref() else {
        return Err(anyhow::anyhow!("GEMINI_API_KEY missing"));
    };
    let client = http_client()?;

    let resp = client
        .post(cfg.endpoint())
        .query(&[("key", api_key.as_str())])
        .json(&build_request_body(payload))
        .send()
        .context("gemini request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading gemini body")?;
    if !status.is_success() {
        let snippet = body
            .trim()
            .replace('\n', " ")
            .replace('\r', " ")
            .chars()
            .take(220)
            .collect::<String>();
        return Err(anyhow::anyhow!("gemini http {}: {}", status, snippet));
    }

    parse_report_response(&body)
}

/// The image part goes ahead of the instruction text, and the response is
/// pinned to JSON with the full report schema.
pub fn build_request_body(payload: &ImagePayload) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {
                    "inlineData": {
                        "mimeType": payload.mime,
                        "data": payload.data,
                    }
                },
                { "text": ANALYSIS_PROMPT },
            ],
        }],
        "generationConfig": {
            "temperature": 0.4,
            "responseMimeType": "application/json",
            "responseSchema": report_schema(),
        },
    })
}

pub fn report_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "teamHome": { "type": "STRING", "description": "Name of the home team" },
            "teamAway": { "type": "STRING", "description": "Name of the away team" },
            "score": { "type": "STRING", "description": "Current score e.g., '1-0' or '0-0'" },
            "competition": { "type": "STRING", "description": "Competition name" },
            "date": { "type": "STRING", "description": "Date of match" },
            "winProbability": {
                "type": "OBJECT",
                "properties": {
                    "home": { "type": "NUMBER", "description": "Win Home %" },
                    "draw": { "type": "NUMBER", "description": "Draw %" },
                    "away": { "type": "NUMBER", "description": "Win Away %" },
                },
                "required": ["home", "draw", "away"],
            },
            "goalProjections": {
                "type": "OBJECT",
                "properties": {
                    "over1_5": { "type": "NUMBER", "description": "Probability % of Over 1.5 Goals" },
                    "over2_5": { "type": "NUMBER", "description": "Probability % of Over 2.5 Goals" },
                },
                "required": ["over1_5", "over2_5"],
            },
            "btts": { "type": "NUMBER", "description": "Probability % Both Teams To Score (Full Time)" },
            "predictedScore": { "type": "STRING", "description": "Most likely exact final score (e.g. '2-1')" },
            "predictedScoreProbability": { "type": "NUMBER", "description": "Probability % of this exact score happening" },
            "recommendation": pick_schema("The single best statistical recommendation (High prob/value balance)"),
            "conservativePrediction": pick_schema("A very safe prediction with high probability (low risk)"),
            "riskyPrediction": pick_schema("A riskier prediction with lower probability but higher potential return"),
            "statisticalTips": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "5 key tips",
            },
        },
        "required": [
            "teamHome", "teamAway", "score", "competition", "date", "winProbability",
            "goalProjections", "btts", "predictedScore", "predictedScoreProbability",
            "recommendation", "conservativePrediction", "riskyPrediction", "statisticalTips",
        ],
    })
}

fn pick_schema(description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "description": description,
        "properties": {
            "market": { "type": "STRING", "description": "Main title, e.g. 'Doble Oportunidad', 'Over 3.5'" },
            "selection": { "type": "STRING", "description": "Specific selection e.g. '1X', 'Local gana al descanso'" },
            "probability": { "type": "NUMBER", "description": "Estimated probability percentage" },
            "insight": { "type": "STRING", "description": "Reasoning why this bet was chosen" },
        },
        "required": ["market", "selection", "probability", "insight"],
    })
}

pub fn parse_report_response(raw: &str) -> Result<MatchReport> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid gemini json")?;
    let text = candidate_text(&root)
        .ok_or_else(|| anyhow::anyhow!("gemini response has no candidate text"))?;
    parse_report_text(&text)
}

fn candidate_text(root: &Value) -> Option<String> {
    let parts = root
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let mut text = String::new();
    for part in parts {
        if let Some(chunk) = part.get("text").and_then(Value::as_str) {
            text.push_str(chunk);
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn parse_report_text(raw: &str) -> Result<MatchReport> {
    let cleaned = strip_json_fence(raw.trim());
    if cleaned.is_empty() {
        return Err(anyhow::anyhow!("empty report payload"));
    }
    serde_json::from_str(cleaned).context("report json does not match the expected shape")
}

// Schema-constrained replies should be bare JSON, but a fenced block still
// shows up now and then.
fn strip_json_fence(raw: &str) -> &str {
    let Some(stripped) = raw.strip_prefix("```") else {
        return raw;
    };
    let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
    let stripped = stripped.strip_suffix("```").unwrap_or(stripped);
    stripped.trim()
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_adds_models_prefix_once() {
        let cfg = GeminiConfig {
            api_key: None,
            model: "gemini-3-pro-preview".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            demo: false,
        };
        assert_eq!(
            cfg.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );

        let prefixed = GeminiConfig {
            model: "models/gemini-3-pro-preview".to_string(),
            ..cfg
        };
        assert_eq!(
            prefixed.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[test]
    fn fence_stripping() {
        assert_eq!(strip_json_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_json_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn schema_requires_every_report_field() {
        let schema = report_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for field in [
            "teamHome",
            "teamAway",
            "score",
            "competition",
            "date",
            "winProbability",
            "goalProjections",
            "btts",
            "predictedScore",
            "predictedScoreProbability",
            "recommendation",
            "conservativePrediction",
            "riskyPrediction",
            "statisticalTips",
        ] {
            assert!(required.contains(&field), "missing required field {field}");
        }
        assert_eq!(
            schema["properties"]["goalProjections"]["required"],
            json!(["over1_5", "over2_5"])
        );
        assert_eq!(
            schema["properties"]["recommendation"]["required"],
            json!(["market", "selection", "probability", "insight"])
        );
    }
}
