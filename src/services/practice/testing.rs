//! Test doubles shared by the practice service tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interview_arena_llm::{
    GenerationClient, LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult,
    ProviderConfig, RetryPolicy,
};

/// Provider answering from per-prompt scripts.
///
/// Each route is a prompt substring with a queue of canned responses; the
/// first route whose needle occurs in the prompt answers. An exhausted route
/// yields a server error.
pub struct ScriptedProvider {
    routes: Mutex<Vec<(String, VecDeque<LlmResult<LlmResponse>>)>>,
    calls: AtomicUsize,
    config: ProviderConfig,
}

impl ScriptedProvider {
    /// One queue answering every prompt in order.
    pub fn texts(texts: &[&str]) -> Arc<Self> {
        Self::routed(&[("", texts)])
    }

    pub fn routed(routes: &[(&str, &[&str])]) -> Arc<Self> {
        let routes = routes
            .iter()
            .map(|(needle, texts)| {
                let queue = texts
                    .iter()
                    .map(|t| Ok(LlmResponse::text("test-model", *t)))
                    .collect();
                (needle.to_string(), queue)
            })
            .collect();
        Arc::new(Self {
            routes: Mutex::new(routes),
            calls: AtomicUsize::new(0),
            config: ProviderConfig::default(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _options: &LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut routes = self.routes.lock().unwrap();
        routes
            .iter_mut()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or_else(|| {
                Err(LlmError::ServerError {
                    message: "script exhausted".to_string(),
                    status: Some(500),
                })
            })
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Single-model client without retries or backoff.
pub fn client_with(provider: Arc<ScriptedProvider>) -> Arc<GenerationClient> {
    Arc::new(
        GenerationClient::new(provider, vec!["test-model".to_string()])
            .with_retry_policy(RetryPolicy::immediate(1)),
    )
}
