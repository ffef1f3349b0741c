//! Shared fixtures: a prompt-routed stub provider and a ready router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use interview_arena::storage::{ConfigService, Database};
use interview_arena::{build_router, AppState};
use interview_arena_llm::{
    GenerationClient, LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult,
    ProviderConfig, RetryPolicy,
};

pub const ANALYSIS_JSON: &str = r#"```json
{"strengths":["Clear structure"],"weaknesses":["No metrics"],"overallScore":80,"feedback":"Solid answer"}
```"#;

/// Canned answers for each prompt family, matched by a marker the prompt contains.
pub const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("overallScore", ANALYSIS_JSON),
    ("openingLine", r#"{"openingLine":"Hello, thanks for calling. How can I help?"}"#),
    (
        "customerQuery",
        r#"{"scenario":"A customer reports a double charge.","customerQuery":"Why was I charged twice?","expectedResponse":["How do you verify the charge?","How do you reassure them?","What follow-up do you offer?"]}"#,
    ),
    (r#"{"response""#, "Sure, I'd like a refund please."),
    ("suggestion", r#"{"suggestion":"Quantify the result of your work."}"#),
    (
        "interview questions",
        r#"{"questions":[{"question":"What is ownership?","answer":"Each value has one owner."},{"Question":"What is borrowing?","Answer":"Temporary access by reference."}]}"#,
    ),
    ("Rate the candidate", r#"{"rating":7,"feedback":"Good, mention lifetimes."}"#),
    ("improvement", r#"{"strengths":"Concise","improvements":["Add an example"]}"#),
];

/// Provider that answers by prompt marker; prompts without a route fail
/// with a server error.
pub struct StubProvider {
    routes: Vec<(String, String)>,
    stall_on: Option<String>,
    calls: AtomicUsize,
    config: ProviderConfig,
}

impl StubProvider {
    pub fn new(routes: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self::build(routes, None))
    }

    /// Like `new`, but prompts containing `needle` never answer.
    pub fn stalling(routes: &[(&str, &str)], needle: &str) -> Arc<Self> {
        Arc::new(Self::build(routes, Some(needle.to_string())))
    }

    fn build(routes: &[(&str, &str)], stall_on: Option<String>) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|(needle, text)| (needle.to_string(), text.to_string()))
                .collect(),
            stall_on,
            calls: AtomicUsize::new(0),
            config: ProviderConfig::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        _options: &LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(needle) = &self.stall_on {
            if prompt.contains(needle.as_str()) {
                std::future::pending::<()>().await;
            }
        }
        self.routes
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, text)| LlmResponse::text(model, text.clone()))
            .ok_or_else(|| LlmError::ServerError {
                message: "no route for prompt".to_string(),
                status: Some(503),
            })
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// Test application: router plus the pieces tests inspect directly.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub provider: Arc<StubProvider>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_routes(DEFAULT_ROUTES)
    }

    pub fn with_routes(routes: &[(&str, &str)]) -> Self {
        Self::with_provider(StubProvider::new(routes))
    }

    pub fn with_provider(provider: Arc<StubProvider>) -> Self {
        let dir = TempDir::new().unwrap();
        let config = ConfigService::load_or_create(&dir.path().join("config.json")).unwrap();
        let client = GenerationClient::new(provider.clone(), vec!["stub-model".to_string()])
            .with_retry_policy(RetryPolicy::immediate(1));
        let state = AppState::new(Database::new_in_memory().unwrap(), config, client);

        Self {
            router: build_router(state.clone()),
            state,
            provider,
            _dir: dir,
        }
    }

    /// Send a request and return the status with the parsed JSON body.
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    /// Save a scenario owned by `email` and return its mock id.
    pub async fn create_scenario(&self, email: &str) -> String {
        let (status, body) = self
            .post("/api/mock-interview", scenario_body(email))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["mockId"].as_str().unwrap().to_string()
    }
}

pub fn scenario_body(email: &str) -> Value {
    serde_json::json!({
        "title": "Billing dispute",
        "description": "Customer charged twice",
        "difficulty": "Junior",
        "scenario": "A customer reports a double charge.",
        "customerQuery": "Why was I charged twice?",
        "expectedResponse": "1. Verify\n2. Reassure\n3. Follow up",
        "language": "en-US",
        "industry": "Banking",
        "role": "Support agent",
        "focusArea": "situational",
        "createdBy": email
    })
}
