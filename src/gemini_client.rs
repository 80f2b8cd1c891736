//! # Gemini Recipe Generator
//!
//! [`RecipeGenerator`] backed by the Gemini `generateContent` REST endpoint.
//! The request carries a JSON response schema mirroring [`GenerationResponse`]
//! so the model answers with a structured body; the text of the first
//! candidate is then parsed into recipes.
//!
//! Transient failures (network errors, HTTP 429 and 5xx) are retried with
//! jittered exponential backoff. Repeated failures open a circuit breaker so
//! later requests fail fast until the cool-down elapses.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::generation::{
    build_prompt, GenerationConstraints, GenerationError, GenerationResponse, RecipeGenerator,
};
use crate::generation_config::{GenerationConfig, RecoveryConfig};
use crate::recipe_model::Category;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: ResponseConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCandidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// Response schema sent with every request
pub fn response_schema() -> Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "request_summary": {
                "type": "OBJECT",
                "properties": {
                    "photos_used": { "type": "INTEGER" },
                    "detected_ingredients": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": {
                                "name": { "type": "STRING" },
                                "confidence": { "type": "STRING", "format": "enum", "enum": ["high", "low"] }
                            }
                        }
                    },
                    "user_constraints": {
                        "type": "OBJECT",
                        "properties": {
                            "allergies": string_array(),
                            "dietary_rules": string_array(),
                            "equipment": string_array(),
                            "detail_level": { "type": "STRING", "format": "enum", "enum": ["detailed", "concise"] },
                            "servings": { "type": "INTEGER" },
                            "preferred_categories": {
                                "type": "ARRAY",
                                "items": { "type": "STRING", "format": "enum", "enum": categories }
                            },
                            "user_free_text": { "type": "STRING" }
                        }
                    }
                }
            },
            "recipes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "recipe_id": { "type": "STRING" },
                        "source": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "category": { "type": "STRING", "format": "enum", "enum": categories },
                        "short_description": { "type": "STRING" },
                        "servings": { "type": "INTEGER" },
                        "total_time_minutes": { "type": "INTEGER" },
                        "calories_estimate_kcal": { "type": "NUMBER" },
                        "calories_confidence": { "type": "STRING" },
                        "equipment_needed": string_array(),
                        "ingredients": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "name": { "type": "STRING" },
                                    "amount": { "type": "STRING" },
                                    "optional": { "type": "BOOLEAN" },
                                    "adjustable_note": { "type": "STRING" }
                                }
                            }
                        },
                        "missing_or_substitutions": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "missing": { "type": "STRING" },
                                    "substitute": { "type": "STRING" },
                                    "severity": { "type": "STRING", "format": "enum", "enum": ["low", "medium", "high"] }
                                }
                            }
                        },
                        "steps": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "step": { "type": "INTEGER" },
                                    "title": { "type": "STRING" },
                                    "text": { "type": "STRING" },
                                    "estimated_minutes": { "type": "INTEGER" },
                                    "timer_seconds": { "type": "NUMBER", "nullable": true }
                                }
                            }
                        },
                        "safety_notes": string_array(),
                        "tags": string_array()
                    },
                    "required": ["recipe_id", "title", "category", "servings", "ingredients", "steps"]
                }
            }
        },
        "required": ["recipes"]
    })
}

/// Strip a surrounding markdown code fence, if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return trimmed;
    };
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

/// Extract and parse the structured body from a `generateContent` response
pub fn parse_generation_text(
    response: &GenerateContentResponse,
) -> Result<GenerationResponse, GenerationError> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| GenerationError::MalformedResponse("no candidates in response".into()))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|content| content.parts.iter().map(|part| part.text.as_str()).collect())
        .unwrap_or_default();

    let body = strip_code_fence(&text);
    if body.is_empty() {
        return Err(GenerationError::MalformedResponse(format!(
            "empty candidate text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    let mut parsed: GenerationResponse = serde_json::from_str(body).map_err(|e| {
        debug!(error = %e, body, "Failed to deserialize generated recipes");
        GenerationError::from(e)
    })?;
    for recipe in &mut parsed.recipes {
        recipe.fill_step_numbers();
    }
    Ok(parsed)
}

/// Backoff for the given retry attempt (0-based), capped and jittered
pub fn retry_delay(attempt: u32, recovery: &RecoveryConfig) -> Duration {
    let exponential = recovery
        .base_retry_delay_ms
        .saturating_mul(1u64 << attempt.min(16));
    let capped = exponential.min(recovery.max_retry_delay_ms);
    let jitter = rand::thread_rng().gen_range(0..=capped / 4);
    Duration::from_millis(capped.saturating_sub(jitter))
}

/// Generation client for the Gemini API
#[derive(Debug)]
pub struct GeminiRecipeGenerator {
    client: Client,
    config: GenerationConfig,
    breaker: CircuitBreaker,
}

impl GeminiRecipeGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.recovery.operation_timeout_secs))
            .build()?;
        let breaker = CircuitBreaker::new(&config.recovery);
        Ok(Self {
            client,
            config,
            breaker,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn build_request(
        &self,
        ingredients: &[String],
        constraints: &GenerationConstraints,
    ) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: build_prompt(ingredients, constraints),
                }],
            }],
            generation_config: ResponseConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                temperature: Some(self.config.temperature),
            },
        }
    }

    async fn call_once(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let content: GenerateContentResponse = response.json().await?;
        parse_generation_text(&content)
    }
}

#[async_trait]
impl RecipeGenerator for GeminiRecipeGenerator {
    async fn generate(
        &self,
        ingredients: &[String],
        constraints: &GenerationConstraints,
    ) -> Result<GenerationResponse, GenerationError> {
        if self.breaker.is_open() {
            warn!("Generation refused while circuit breaker is open");
            return Err(GenerationError::CircuitOpen);
        }

        let api_key = env::var(&self.config.api_key_env_var)
            .map_err(|_| GenerationError::MissingApiKey(self.config.api_key_env_var.clone()))?;

        let request = self.build_request(ingredients, constraints);
        let max_retries = self.config.recovery.max_retries;

        info!(
            model = %self.config.model,
            ingredients = ingredients.len(),
            servings = constraints.servings,
            "Requesting recipe generation"
        );

        let mut attempt = 0;
        loop {
            match self.call_once(&api_key, &request).await {
                Ok(response) => {
                    self.breaker.record_success();
                    info!(recipes = response.recipes.len(), attempt, "Generation succeeded");
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < max_retries => {
                    let delay = retry_delay(attempt, &self.config.recovery);
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "Retrying generation");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.breaker.record_failure();
                    error!(error = %e, attempt, "Generation failed");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_text(text: &str) -> GenerateContentResponse {
        GenerateContentResponse {
            candidates: vec![ResponseCandidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: vec![Part {
                        text: text.to_string(),
                    }],
                }),
                finish_reason: Some("STOP".to_string()),
            }],
        }
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_parse_generation_text() {
        let text = r#"```json
        {"recipes": [{"recipe_id": "a1", "title": "番茄炒蛋", "category": "飯類", "servings": 2,
                      "ingredients": [{"name": "【調味】鹽", "amount": "1 克"}], "steps": []}]}
        ```"#;
        let parsed = parse_generation_text(&response_with_text(text)).unwrap();
        assert_eq!(parsed.recipes.len(), 1);
        assert_eq!(parsed.recipes[0].ingredients[0].amount, "1 克");
    }

    #[test]
    fn test_parse_keeps_recipes_with_sparse_fields() {
        let text = r#"{"recipes": [
            {"recipe_id": "a1", "title": "炒蛋", "category": "飯類",
             "missing_or_substitutions": [{"substitute": "醬油"}],
             "steps": [{"title": "炒", "text": "下鍋"}, {"title": "盛", "text": "起鍋"}]},
            {"recipe_id": "a2", "title": "蛋花湯", "category": "湯品", "steps": []}
        ]}"#;
        let parsed = parse_generation_text(&response_with_text(text)).unwrap();

        assert_eq!(parsed.recipes.len(), 2);
        let steps: Vec<u32> = parsed.recipes[0].steps.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![1, 2]);
        assert_eq!(parsed.recipes[0].missing_or_substitutions[0].substitute, "醬油");
    }

    #[test]
    fn test_parse_failures_are_malformed() {
        let empty = GenerateContentResponse { candidates: vec![] };
        assert!(matches!(
            parse_generation_text(&empty),
            Err(GenerationError::MalformedResponse(_))
        ));

        assert!(matches!(
            parse_generation_text(&response_with_text("   ")),
            Err(GenerationError::MalformedResponse(_))
        ));

        assert!(matches!(
            parse_generation_text(&response_with_text("not json")),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let recovery = RecoveryConfig::default();
        for attempt in 0..10 {
            let delay = retry_delay(attempt, &recovery);
            assert!(delay <= Duration::from_millis(recovery.max_retry_delay_ms));
        }
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let generator = GeminiRecipeGenerator::new(GenerationConfig::default()).unwrap();
        let request = generator.build_request(
            &["雞蛋".to_string()],
            &GenerationConstraints::from_profile(&Default::default(), 2, vec![], None),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert!(json["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("雞蛋"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let config = GenerationConfig {
            api_key_env_var: "RECIPE_CHEF_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let generator = GeminiRecipeGenerator::new(config).unwrap();
        let constraints = GenerationConstraints::from_profile(&Default::default(), 2, vec![], None);
        let result = generator.generate(&["蛋".to_string()], &constraints).await;
        assert!(matches!(result, Err(GenerationError::MissingApiKey(_))));
    }
}
