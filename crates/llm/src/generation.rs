//! Generation Client
//!
//! Obtains a text completion for a prompt, tolerating transient provider
//! failures and unavailable models. Two nested policies apply:
//!
//! - **Retry**: each model gets up to `attempts_per_model` attempts with
//!   exponential backoff between attempts of the same model.
//! - **Fallback**: models are tried in their configured order; the backoff
//!   is reset for every model.
//!
//! The first non-empty completion wins and later models are never contacted.
//! Each attempt is bounded by a timeout and the whole sequence can be
//! cancelled through a `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use futures_util::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provider::LlmProvider;
use crate::types::{LlmError, LlmRequestOptions, LlmResult};

/// Attempts per model when not configured otherwise.
pub const DEFAULT_ATTEMPTS_PER_MODEL: u32 = 3;

/// Time budget for one provider call.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure of a whole generation request.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("No models configured for generation")]
    NoModels,

    /// Every model and attempt failed; `last` is the final underlying failure.
    #[error("Generation exhausted after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: LlmError,
    },

    #[error("Generation cancelled")]
    Cancelled,
}

/// Per-model retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub attempts_per_model: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
    pub randomization_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_model: DEFAULT_ATTEMPTS_PER_MODEL,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
            randomization_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts.
    pub fn immediate(attempts_per_model: u32) -> Self {
        Self {
            attempts_per_model,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
            randomization_factor: 0.0,
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff.max(self.initial_backoff))
            .with_multiplier(self.multiplier.max(1.0))
            .with_randomization_factor(self.randomization_factor.clamp(0.0, 1.0))
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Multi-model generation client.
///
/// The provider is injected, so tests substitute a scripted provider and
/// nothing in the application reaches for a global client.
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    models: Vec<String>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    options: LlmRequestOptions,
}

impl GenerationClient {
    /// Create a client over an ordered model list with default policies.
    pub fn new(provider: Arc<dyn LlmProvider>, models: Vec<String>) -> Self {
        Self {
            provider,
            models,
            retry: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            options: LlmRequestOptions::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_request_options(mut self, options: LlmRequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Generate text using the configured attempts per model.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        self.run(prompt, self.retry.attempts_per_model, &CancellationToken::new())
            .await
    }

    /// Generate text with an explicit number of attempts per model.
    pub async fn generate_text_with_attempts(
        &self,
        prompt: &str,
        attempts_per_model: u32,
    ) -> Result<String, GenerationError> {
        self.run(prompt, attempts_per_model, &CancellationToken::new())
            .await
    }

    /// Generate text, aborting in-flight calls and backoff waits once
    /// `cancel` fires.
    pub async fn generate_text_cancellable(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        self.run(prompt, self.retry.attempts_per_model, cancel).await
    }

    /// Run independent generations concurrently; results keep input order.
    pub async fn generate_all(&self, prompts: &[String]) -> Vec<Result<String, GenerationError>> {
        join_all(prompts.iter().map(|prompt| self.generate_text(prompt))).await
    }

    async fn run(
        &self,
        prompt: &str,
        attempts_per_model: u32,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        if self.models.is_empty() {
            return Err(GenerationError::NoModels);
        }

        let attempts_per_model = attempts_per_model.max(1);
        let mut attempts = 0u32;
        let mut last_err: Option<LlmError> = None;

        for model in &self.models {
            let mut backoff = self.retry.backoff();

            for attempt in 1..=attempts_per_model {
                if cancel.is_cancelled() {
                    return Err(GenerationError::Cancelled);
                }
                attempts += 1;

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                    outcome = self.attempt(model, prompt) => outcome,
                };

                match outcome {
                    Ok(text) => {
                        debug!(
                            provider = self.provider.name(),
                            model = %model,
                            attempt,
                            "Generation succeeded"
                        );
                        return Ok(text);
                    }
                    Err(e) => {
                        warn!(
                            provider = self.provider.name(),
                            model = %model,
                            attempt,
                            max_attempts = attempts_per_model,
                            error = %e,
                            "Generation attempt failed"
                        );
                        last_err = Some(e);
                    }
                }

                if attempt < attempts_per_model {
                    let delay = backoff.next_backoff().unwrap_or(Duration::ZERO);
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(GenerationError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                }
            }

            info!(model = %model, "Model exhausted, falling back to next model");
        }

        let last = last_err.unwrap_or_else(|| LlmError::Other {
            message: "no generation attempt was made".to_string(),
        });
        warn!(attempts, error = %last, "All models exhausted");
        Err(GenerationError::Exhausted { attempts, last })
    }

    /// One bounded provider call. Blank completions count as failures.
    async fn attempt(&self, model: &str, prompt: &str) -> LlmResult<String> {
        let response = tokio::time::timeout(
            self.attempt_timeout,
            self.provider.generate(model, prompt, &self.options),
        )
        .await
        .map_err(|_| LlmError::Timeout {
            millis: self.attempt_timeout.as_millis() as u64,
        })??;

        match response.non_empty_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(LlmError::EmptyResponse {
                model: model.to_string(),
            }),
        }
    }
}
