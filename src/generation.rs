//! # Recipe Generation
//!
//! The seam between the resolution controller and the external generative
//! service. The controller only sees [`RecipeGenerator`]; the production
//! implementation lives in [`crate::gemini_client`].
//!
//! Every failure mode (transport, HTTP status, unparseable body, empty result)
//! is a [`GenerationError`] and all of them are retryable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::recipe_model::{Category, DetailLevel, DetectedIngredient, Recipe};
use crate::user_profile::UserProfile;

/// Constraints sent alongside the ingredient names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConstraints {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub dietary_rules: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default = "default_request_servings")]
    pub servings: u32,
    #[serde(default)]
    pub preferred_categories: Vec<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_free_text: Option<String>,
}

fn default_request_servings() -> u32 {
    2
}

impl GenerationConstraints {
    /// Constraints derived from the profile as it is right now
    pub fn from_profile(
        profile: &UserProfile,
        servings: u32,
        preferred_categories: Vec<Category>,
        user_free_text: Option<String>,
    ) -> Self {
        Self {
            allergies: profile.allergies.clone(),
            dietary_rules: profile.dietary_rules.clone(),
            equipment: profile.equipment.clone(),
            detail_level: profile.detail_level,
            servings: servings.max(1),
            preferred_categories,
            user_free_text,
        }
    }
}

/// Echo of what the service understood from the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSummary {
    #[serde(default)]
    pub photos_used: u32,
    #[serde(default)]
    pub detected_ingredients: Vec<DetectedIngredient>,
    #[serde(default)]
    pub user_constraints: Option<GenerationConstraints>,
}

/// Structured response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub request_summary: RequestSummary,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

#[derive(Debug)]
pub enum GenerationError {
    /// No API key configured
    MissingApiKey(String),
    /// Connection, timeout or body read failure
    Transport(String),
    /// Non-success HTTP status
    Api { status: u16, body: String },
    /// Body did not match the expected JSON shape
    MalformedResponse(String),
    /// Well-formed response without any recipes
    EmptyResult,
    /// Too many recent failures; not attempted
    CircuitOpen,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::MissingApiKey(var) => {
                write!(f, "API key not found in environment: {var}")
            }
            GenerationError::Transport(msg) => write!(f, "Transport error: {msg}"),
            GenerationError::Api { status, body } => write!(f, "API error {status}: {body}"),
            GenerationError::MalformedResponse(msg) => write!(f, "Malformed response: {msg}"),
            GenerationError::EmptyResult => write!(f, "The service returned no recipes"),
            GenerationError::CircuitOpen => {
                write!(f, "Generation temporarily disabled after repeated failures")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::MalformedResponse(err.to_string())
    }
}

impl GenerationError {
    /// Whether the transport layer may try again on its own
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Transport(_) => true,
            GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// External recipe generation service
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate(
        &self,
        ingredients: &[String],
        constraints: &GenerationConstraints,
    ) -> Result<GenerationResponse, GenerationError>;
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// Prompt text for a generation request
pub fn build_prompt(ingredients: &[String], constraints: &GenerationConstraints) -> String {
    let categories: Vec<String> = constraints
        .preferred_categories
        .iter()
        .map(|category| category.label().to_string())
        .collect();

    format!(
        "依據以下食材：{}。\n\
         使用者需求：{}。\n\
         過敏原：{}。\n\
         飲食習慣：{}。\n\
         可用器材：{}。\n\
         步驟詳細程度：{}。\n\
         份量：{} 人份。\n\
         偏好類別：{}。\n\
         食材名稱可加上【備料】、【輔料】或【調味】前綴以標示分組。\n\
         請生成 3-5 個食譜候選。",
        join_or(ingredients, "無"),
        constraints.user_free_text.as_deref().unwrap_or("無"),
        join_or(&constraints.allergies, "無"),
        join_or(&constraints.dietary_rules, "無"),
        join_or(&constraints.equipment, "不限"),
        constraints.detail_level,
        constraints.servings,
        join_or(&categories, "不限"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints_from_profile() {
        let mut profile = UserProfile::default();
        profile.allergies = vec!["花生".to_string()];

        let constraints =
            GenerationConstraints::from_profile(&profile, 0, vec![Category::Soup], None);
        assert_eq!(constraints.allergies, vec!["花生".to_string()]);
        assert_eq!(constraints.servings, 1);
        assert_eq!(constraints.preferred_categories, vec![Category::Soup]);
    }

    #[test]
    fn test_prompt_mentions_everything() {
        let constraints = GenerationConstraints {
            allergies: vec!["蝦".to_string()],
            dietary_rules: vec![],
            equipment: vec!["電鍋".to_string()],
            detail_level: DetailLevel::Concise,
            servings: 3,
            preferred_categories: vec![Category::Noodles],
            user_free_text: Some("想吃辣".to_string()),
        };
        let prompt = build_prompt(&["雞蛋".to_string(), "洋蔥".to_string()], &constraints);

        assert!(prompt.contains("雞蛋, 洋蔥"));
        assert!(prompt.contains("想吃辣"));
        assert!(prompt.contains("過敏原：蝦"));
        assert!(prompt.contains("飲食習慣：無"));
        assert!(prompt.contains("concise"));
        assert!(prompt.contains("3 人份"));
        assert!(prompt.contains("麵類"));
    }

    #[test]
    fn test_transient_errors() {
        assert!(GenerationError::Transport("reset".into()).is_transient());
        assert!(GenerationError::Api { status: 503, body: String::new() }.is_transient());
        assert!(!GenerationError::Api { status: 400, body: String::new() }.is_transient());
        assert!(!GenerationError::EmptyResult.is_transient());
    }

    #[test]
    fn test_response_parses_request_summary() {
        let json = r#"{
            "request_summary": {
                "photos_used": 0,
                "detected_ingredients": [{"name": "雞蛋", "confidence": "high"}],
                "user_constraints": {"allergies": [], "servings": 2, "preferred_categories": ["飯類"]}
            },
            "recipes": []
        }"#;
        let response: GenerationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.request_summary.detected_ingredients[0].name, "雞蛋");
        let echoed = response.request_summary.user_constraints.unwrap();
        assert_eq!(echoed.preferred_categories, vec![Category::Rice]);
    }
}
