//! Settings Models
//!
//! Application configuration and settings data structures.

use std::time::Duration;

use interview_arena_core::Language;
use interview_arena_llm::{
    ProviderConfig, ProviderType, RetryPolicy, DEFAULT_GEMINI_MODEL,
};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the Gemini API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generative model provider: "gemini" or "openai"
    pub provider: String,
    /// API key (environment variable takes precedence)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Provider base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Outbound proxy URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Ordered model fallback list
    pub models: Vec<String>,
    /// Attempts per model before falling back
    pub attempts_per_model: u32,
    /// Time budget for a single provider call, in seconds
    pub attempt_timeout_secs: u64,
    /// First backoff between attempts of the same model, in milliseconds
    pub initial_backoff_ms: u64,
    /// Backoff ceiling, in milliseconds
    pub max_backoff_ms: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token limit per call
    pub max_output_tokens: u32,
    /// HTTP listen address
    pub bind_address: String,
    /// SQLite database file (defaults to ~/.interview-arena/data.db)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Default conversation language code (e.g., "vi-VN", "en-US")
    pub language: String,
    /// Number of questions in a generated question set
    pub question_count: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            api_key: None,
            base_url: None,
            proxy_url: None,
            models: vec![
                DEFAULT_GEMINI_MODEL.to_string(),
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
            ],
            attempts_per_model: 3,
            attempt_timeout_secs: 30,
            initial_backoff_ms: 250,
            max_backoff_ms: 2000,
            temperature: 0.5,
            max_output_tokens: 1024,
            bind_address: "127.0.0.1:3001".to_string(),
            database_path: None,
            language: "vi-VN".to_string(),
            question_count: 5,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SettingsUpdate {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub proxy_url: Option<String>,
    pub models: Option<Vec<String>>,
    pub attempts_per_model: Option<u32>,
    pub attempt_timeout_secs: Option<u64>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub language: Option<String>,
    pub question_count: Option<u32>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(provider) = update.provider {
            self.provider = provider;
        }
        if let Some(api_key) = update.api_key {
            self.api_key = Some(api_key).filter(|k| !k.trim().is_empty());
        }
        if let Some(base_url) = update.base_url {
            self.base_url = Some(base_url).filter(|u| !u.trim().is_empty());
        }
        if let Some(proxy_url) = update.proxy_url {
            self.proxy_url = Some(proxy_url).filter(|u| !u.trim().is_empty());
        }
        if let Some(models) = update.models {
            self.models = models;
        }
        if let Some(attempts) = update.attempts_per_model {
            self.attempts_per_model = attempts;
        }
        if let Some(timeout) = update.attempt_timeout_secs {
            self.attempt_timeout_secs = timeout;
        }
        if let Some(initial) = update.initial_backoff_ms {
            self.initial_backoff_ms = initial;
        }
        if let Some(max) = update.max_backoff_ms {
            self.max_backoff_ms = max;
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(tokens) = update.max_output_tokens {
            self.max_output_tokens = tokens;
        }
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(count) = update.question_count {
            self.question_count = count;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.provider
            .parse::<ProviderType>()
            .map_err(|_| format!("Invalid provider: {}. Must be 'gemini' or 'openai'", self.provider))?;

        if self.models.is_empty() || self.models.iter().any(|m| m.trim().is_empty()) {
            return Err("models must contain at least one non-empty model name".to_string());
        }

        if self.attempts_per_model == 0 || self.attempts_per_model > 10 {
            return Err("attempts_per_model must be between 1 and 10".to_string());
        }

        if self.attempt_timeout_secs == 0 {
            return Err("attempt_timeout_secs must be at least 1 second".to_string());
        }

        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err("max_backoff_ms cannot be lower than initial_backoff_ms".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("Invalid temperature: {}", self.temperature));
        }

        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be positive".to_string());
        }

        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind_address: {}", self.bind_address));
        }

        Language::from_code(&self.language).map_err(|e| e.to_string())?;

        if self.question_count == 0 || self.question_count > 20 {
            return Err("question_count must be between 1 and 20".to_string());
        }

        Ok(())
    }

    /// Parsed provider type (gemini when the value is unrecognized)
    pub fn provider_type(&self) -> ProviderType {
        self.provider.parse().unwrap_or(ProviderType::Gemini)
    }

    /// Default conversation language
    pub fn default_language(&self) -> Language {
        Language::from_code(&self.language).unwrap_or_default()
    }

    /// API key from the environment, falling back to the config file
    pub fn resolved_api_key(&self) -> Option<String> {
        let env_var = match self.provider_type() {
            ProviderType::Gemini => GEMINI_API_KEY_ENV,
            ProviderType::OpenAI => OPENAI_API_KEY_ENV,
        };
        std::env::var(env_var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    /// Provider configuration derived from these settings
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider_type(),
            api_key: self.resolved_api_key(),
            base_url: self.base_url.clone(),
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
            proxy_url: self.proxy_url.clone(),
            ..Default::default()
        }
    }

    /// Retry policy derived from these settings
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts_per_model: self.attempts_per_model,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            ..Default::default()
        }
    }

    /// Per-attempt timeout
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}
