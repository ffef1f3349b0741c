//! Scenario Designer
//!
//! Asks the model for the scenario, customer query and coaching prompts of a
//! new practice scenario.

use std::sync::Arc;

use interview_arena_core::{InterviewScenario, ScenarioDraft, ScenarioRequest};
use interview_arena_llm::{GenerationClient, NormalizeError, ResponseNormalizer};
use tracing::{info, warn};

use crate::utils::error::{AppError, AppResult};

use super::prompts;

/// Regenerations allowed after the first draft is unusable.
pub const DEFAULT_MAX_REGENERATIONS: usize = 2;

pub struct ScenarioDesigner {
    client: Arc<GenerationClient>,
    normalizer: ResponseNormalizer,
    max_regenerations: usize,
}

impl ScenarioDesigner {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self {
            client,
            normalizer: ResponseNormalizer::default(),
            max_regenerations: DEFAULT_MAX_REGENERATIONS,
        }
    }

    pub fn with_max_regenerations(mut self, max_regenerations: usize) -> Self {
        self.max_regenerations = max_regenerations;
        self
    }

    /// Design a scenario. The result is not persisted.
    ///
    /// Generation failures propagate immediately (the client already retried);
    /// malformed or incomplete drafts are regenerated.
    pub async fn design(&self, request: ScenarioRequest) -> AppResult<InterviewScenario> {
        request.validate()?;
        let prompt = prompts::scenario_prompt(&request);

        let mut last_error = NormalizeError::MalformedResponse("no draft produced".to_string());
        for round in 0..=self.max_regenerations {
            let raw = self.client.generate_text(&prompt).await?;
            match self.parse_draft(&raw) {
                Ok(draft) => {
                    info!(round, title = %request.title, "Scenario designed");
                    return Ok(request.into_scenario(draft));
                }
                Err(e) => {
                    warn!(round, error = %e, "Scenario draft rejected");
                    last_error = e;
                }
            }
        }

        Err(AppError::from(last_error))
    }

    fn parse_draft(&self, raw: &str) -> Result<ScenarioDraft, NormalizeError> {
        let draft: ScenarioDraft = self.normalizer.normalize_object(raw)?;
        draft
            .validate()
            .map_err(|e| NormalizeError::MalformedResponse(e.to_string()))?;
        Ok(draft)
    }
}
