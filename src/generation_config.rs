//! # Generation Configuration Module
//!
//! Endpoint, model and recovery settings for the recipe generation client,
//! with defaults that can be overridden from the environment.

use std::env;
use std::str::FromStr;
use tracing::warn;

// Constants for generation configuration
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_ENV_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_ENV_VAR: &str = "GEMINI_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "GENERATION_TIMEOUT_SECS";
pub const MAX_RETRIES_ENV_VAR: &str = "GENERATION_MAX_RETRIES";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Recovery configuration for transport errors
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of automatic retries for transient failures
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single HTTP request in seconds
    pub operation_timeout_secs: u64,
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// How long the circuit stays open, in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 5000,
            operation_timeout_secs: 60, // generation is slow
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

/// Configuration structure for the generation client
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Name of the environment variable holding the API key
    pub api_key_env_var: String,
    /// Model identifier, e.g. "gemini-2.5-flash"
    pub model: String,
    /// API root without trailing slash
    pub base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Recovery and error handling configuration
    pub recovery: RecoveryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            recovery: RecoveryConfig::default(),
        }
    }
}

fn env_parse<T: FromStr>(var: &str, fallback: T) -> T {
    match env::var(var) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var, value = %raw, "Ignoring unparseable environment value");
            fallback
        }),
        Err(_) => fallback,
    }
}

impl GenerationConfig {
    /// Defaults overridden by any of the generation environment variables
    ///
    /// The API key itself is read lazily at request time so a missing key
    /// surfaces as a generation error rather than a startup failure.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let recovery = RecoveryConfig {
            operation_timeout_secs: env_parse(
                TIMEOUT_ENV_VAR,
                defaults.recovery.operation_timeout_secs,
            ),
            max_retries: env_parse(MAX_RETRIES_ENV_VAR, defaults.recovery.max_retries),
            ..defaults.recovery
        };

        Self {
            model: env::var(MODEL_ENV_VAR).unwrap_or(defaults.model),
            base_url: env::var(BASE_URL_ENV_VAR)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            recovery,
            ..defaults
        }
    }

    /// Full URL of the content generation endpoint
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = GenerationConfig {
            base_url: "http://localhost:9000".to_string(),
            model: "test-model".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(),
            "http://localhost:9000/models/test-model:generateContent"
        );
    }

    #[test]
    fn test_recovery_defaults() {
        let recovery = RecoveryConfig::default();
        assert_eq!(recovery.max_retries, 2);
        assert!(recovery.base_retry_delay_ms < recovery.max_retry_delay_ms);
    }
}
