//! Coaching Service
//!
//! One-shot generations outside the live arena: weakness suggestions,
//! landing-page demo feedback, classic question sets and answer ratings.

use std::sync::Arc;

use interview_arena_core::Language;
use interview_arena_llm::{GenerationClient, NormalizeError, ResponseNormalizer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::interview::{AnswerRating, DemoFeedback, QuestionAnswer, WeaknessSuggestion};
use crate::utils::error::{AppError, AppResult};

use super::prompts;

/// Keys probed for a suggestion before the generic utterance keys.
const SUGGESTION_KEYS: &[&str] = &["suggestion", "goiY", "response", "text", "message"];

/// Keys that may wrap a question list in an object.
const QUESTION_LIST_KEYS: &[&str] = &["questions", "interviewQuestions", "data"];

pub struct CoachingService {
    client: Arc<GenerationClient>,
    normalizer: ResponseNormalizer,
    suggestion_normalizer: ResponseNormalizer,
}

impl CoachingService {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self {
            client,
            normalizer: ResponseNormalizer::default(),
            suggestion_normalizer: ResponseNormalizer::with_keys(SUGGESTION_KEYS.iter().copied()),
        }
    }

    /// Short suggestion for improving one weakness.
    pub async fn suggest_improvement(&self, weakness: &str, language: Language) -> AppResult<String> {
        if weakness.trim().is_empty() {
            return Err(AppError::validation("Missing weakness"));
        }
        let raw = self
            .client
            .generate_text(&prompts::suggestion_prompt(weakness, language))
            .await?;
        Ok(self.suggestion_normalizer.normalize_utterance(&raw)?)
    }

    /// Suggestions for several weaknesses, generated concurrently.
    ///
    /// Blank and repeated weaknesses are dropped. A failed generation only
    /// fails its own entry.
    pub async fn suggest_improvements(
        &self,
        weaknesses: &[String],
        language: Language,
    ) -> AppResult<Vec<WeaknessSuggestion>> {
        let mut unique: Vec<&str> = Vec::new();
        for weakness in weaknesses.iter().map(|w| w.trim()) {
            if !weakness.is_empty() && !unique.contains(&weakness) {
                unique.push(weakness);
            }
        }
        if unique.is_empty() {
            return Err(AppError::validation("Missing weaknesses"));
        }

        let prompts: Vec<String> = unique
            .iter()
            .map(|weakness| prompts::suggestion_prompt(weakness, language))
            .collect();
        let results = self.client.generate_all(&prompts).await;

        let suggestions: Vec<WeaknessSuggestion> = unique
            .into_iter()
            .zip(results)
            .map(|(weakness, result)| {
                let outcome = result
                    .map_err(AppError::from)
                    .and_then(|raw| Ok(self.suggestion_normalizer.normalize_utterance(&raw)?));
                match outcome {
                    Ok(suggestion) => WeaknessSuggestion {
                        weakness: weakness.to_string(),
                        suggestion: Some(suggestion),
                        error: None,
                    },
                    Err(e) => {
                        warn!(weakness, error = %e, "Suggestion failed");
                        WeaknessSuggestion {
                            weakness: weakness.to_string(),
                            suggestion: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();
        Ok(suggestions)
    }

    /// Strength and improvement notes for a question and answer.
    pub async fn demo_feedback(&self, question: &str, answer: &str) -> AppResult<DemoFeedback> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(AppError::validation("Question and answer are required"));
        }
        let raw = self
            .client
            .generate_text(&prompts::demo_feedback_prompt(question, answer))
            .await?;
        Ok(self.normalizer.normalize_object(&raw)?)
    }

    /// Generate `count` questions with suggested answers.
    pub async fn question_set(
        &self,
        job_position: &str,
        job_desc: &str,
        job_experience: &str,
        count: u32,
    ) -> AppResult<Vec<QuestionAnswer>> {
        if job_position.trim().is_empty() {
            return Err(AppError::validation("jobPosition must not be empty"));
        }
        if count == 0 {
            return Err(AppError::validation("question count must be positive"));
        }

        let prompt = prompts::question_set_prompt(job_position, job_desc, job_experience, count);
        let raw = self.client.generate_text(&prompt).await?;
        let questions = parse_questions(self.normalizer.extract_json(&raw)?)?;

        debug!(requested = count, received = questions.len(), "Question set generated");
        Ok(questions)
    }

    /// Rate a recorded answer against the suggested one.
    pub async fn rate_answer(
        &self,
        question: &str,
        suggested_answer: &str,
        user_answer: &str,
    ) -> AppResult<AnswerRating> {
        if user_answer.trim().is_empty() {
            return Err(AppError::validation("userAnswer must not be empty"));
        }
        let prompt = prompts::answer_rating_prompt(question, suggested_answer, user_answer);
        let raw = self.client.generate_text(&prompt).await?;
        Ok(self.normalizer.normalize_object(&raw)?)
    }
}

/// Accept a bare array or an object wrapping one; drop blank questions.
fn parse_questions(value: Value) -> Result<Vec<QuestionAnswer>, NormalizeError> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => QUESTION_LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| NormalizeError::MalformedResponse("no question list found".to_string()))?,
        _ => {
            return Err(NormalizeError::MalformedResponse(
                "expected a question list".to_string(),
            ))
        }
    };

    let questions: Vec<QuestionAnswer> = list
        .into_iter()
        .filter_map(|item| serde_json::from_value::<QuestionAnswer>(item).ok())
        .filter(|qa| !qa.question.trim().is_empty())
        .collect();

    if questions.is_empty() {
        return Err(NormalizeError::MalformedResponse(
            "question list is empty".to_string(),
        ));
    }
    Ok(questions)
}
