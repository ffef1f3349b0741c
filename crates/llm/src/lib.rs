//! Interview Arena LLM
//!
//! Generative model access for Interview Arena:
//! - `LlmProvider` trait with Gemini and OpenAI-compatible implementations
//! - `GenerationClient`, the retry + model fallback wrapper every caller goes through
//! - `ResponseNormalizer`, which turns loosely formatted output into canonical shapes
//!
//! Also includes the HTTP client factory shared by the providers.

pub mod gemini;
pub mod generation;
pub mod http_client;
pub mod normalizer;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use gemini::GeminiProvider;
pub use generation::{
    GenerationClient, GenerationError, RetryPolicy, DEFAULT_ATTEMPTS_PER_MODEL,
    DEFAULT_ATTEMPT_TIMEOUT,
};
pub use http_client::build_http_client;
pub use normalizer::{strip_code_fences, NormalizeError, ResponseNormalizer, DEFAULT_UTTERANCE_KEYS};
pub use openai::OpenAIProvider;
pub use provider::{create_provider, LlmProvider};
pub use types::*;
