//! Live Practice Arena
//!
//! Runs a timed role-play conversation against a saved scenario. Each user
//! turn issues the interlocutor reply and the answer analysis concurrently;
//! the session report is aggregated once the session finishes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use interview_arena_core::{
    ConversationMessage, InterviewScenario, Language, NormalizedFeedback, SessionFeedback,
    TimeLimit,
};
use interview_arena_llm::{GenerationClient, ResponseNormalizer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::interview::{StoredScenario, TurnResponse};
use crate::utils::error::{AppError, AppResult};

use super::prompts;

/// State of one live practice session.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub id: String,
    pub mock_id: String,
    pub user_email: String,
    pub scenario: InterviewScenario,
    pub language: Language,
    pub time_limit: TimeLimit,
    pub started_at: DateTime<Utc>,
    pub messages: Vec<ConversationMessage>,
    cancel: CancellationToken,
}

impl PracticeSession {
    pub fn new(
        stored: StoredScenario,
        user_email: impl Into<String>,
        time_limit: TimeLimit,
        language: Option<Language>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let language = language.unwrap_or(stored.scenario.language);
        Self {
            id: Uuid::new_v4().to_string(),
            mock_id: stored.mock_id,
            user_email: user_email.into(),
            scenario: stored.scenario,
            language,
            time_limit,
            started_at,
            messages: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.started_at).num_seconds().max(0) as u64
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.time_limit
            .seconds()
            .saturating_sub(self.elapsed_seconds(now))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_seconds(now) == 0
    }

    /// Token cancelled when the session is finished or abandoned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Conversation and scoring service for live sessions.
pub struct PracticeArena {
    client: Arc<GenerationClient>,
    normalizer: ResponseNormalizer,
}

impl PracticeArena {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self {
            client,
            normalizer: ResponseNormalizer::default(),
        }
    }

    /// Start a session: generate the opening line and record it.
    pub async fn start(
        &self,
        stored: StoredScenario,
        user_email: &str,
        time_limit: TimeLimit,
        language: Option<Language>,
        now: DateTime<Utc>,
    ) -> AppResult<PracticeSession> {
        let mut session = self.begin(stored, user_email, time_limit, language, now)?;
        self.open(&mut session, now).await?;
        Ok(session)
    }

    /// Build a session without an opening line yet.
    pub fn begin(
        &self,
        stored: StoredScenario,
        user_email: &str,
        time_limit: TimeLimit,
        language: Option<Language>,
        now: DateTime<Utc>,
    ) -> AppResult<PracticeSession> {
        if user_email.trim().is_empty() {
            return Err(AppError::validation("userEmail must not be empty"));
        }
        Ok(PracticeSession::new(stored, user_email.trim(), time_limit, language, now))
    }

    /// Generate the opening line of a fresh session.
    ///
    /// Honors the session token, so abandoning the session stops the call.
    pub async fn open(&self, session: &mut PracticeSession, now: DateTime<Utc>) -> AppResult<()> {
        let prompt = prompts::opening_prompt(&session.scenario, session.language);
        let raw = self
            .client
            .generate_text_cancellable(&prompt, &session.cancellation_token())
            .await?;
        let opening = self.normalizer.normalize_utterance(&raw)?;

        session
            .messages
            .push(ConversationMessage::ai(Uuid::new_v4().to_string(), opening, now.to_rfc3339()));

        info!(
            session_id = %session.id,
            mock_id = %session.mock_id,
            language = %session.language.code(),
            minutes = session.time_limit.minutes(),
            "Practice session started"
        );
        Ok(())
    }

    /// Handle one user utterance.
    ///
    /// The reply and the analysis run concurrently. A failed analysis
    /// degrades to `NormalizedFeedback::empty()`; a failed reply fails the
    /// turn and leaves the conversation unchanged.
    pub async fn respond(
        &self,
        session: &mut PracticeSession,
        content: &str,
        now: DateTime<Utc>,
    ) -> AppResult<TurnResponse> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message must not be empty"));
        }
        if session.is_expired(now) {
            return Err(AppError::validation("Practice time is up, finish the session"));
        }

        let reply_prompt =
            prompts::reply_prompt(&session.scenario, &session.messages, content, session.language);
        let analysis_prompt =
            prompts::analysis_prompt(&session.scenario.scenario, content, session.language);
        let token = session.cancellation_token();

        let (reply, analysis) = tokio::join!(
            self.client.generate_text_cancellable(&reply_prompt, &token),
            self.analyze(&analysis_prompt, &token),
        );

        let reply_text = self.normalizer.normalize_utterance(&reply?)?;

        let timestamp = now.to_rfc3339();
        let mut user_message =
            ConversationMessage::user(Uuid::new_v4().to_string(), content, timestamp.clone());
        user_message.analysis = Some(analysis.clone());
        let reply = ConversationMessage::ai(Uuid::new_v4().to_string(), reply_text, timestamp);

        session.messages.push(user_message.clone());
        session.messages.push(reply.clone());

        debug!(
            session_id = %session.id,
            score = analysis.overall_score,
            messages = session.messages.len(),
            "Practice turn recorded"
        );

        Ok(TurnResponse {
            user_message,
            reply,
            analysis,
            remaining_seconds: session.remaining_seconds(now),
        })
    }

    async fn analyze(&self, prompt: &str, token: &CancellationToken) -> NormalizedFeedback {
        let raw = match self.client.generate_text_cancellable(prompt, token).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Answer analysis failed");
                return NormalizedFeedback::empty();
            }
        };
        self.normalizer.normalize_feedback(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Answer analysis was malformed");
            NormalizedFeedback::empty()
        })
    }

    /// Aggregate the report of a session.
    ///
    /// The session stays usable; callers drop it once the report is stored.
    pub fn finish(&self, session: &PracticeSession, now: DateTime<Utc>) -> SessionFeedback {
        let feedback = SessionFeedback::aggregate(
            session.mock_id.clone(),
            session.user_email.clone(),
            session.messages.clone(),
            session.elapsed_seconds(now),
            session.time_limit.seconds(),
            now.to_rfc3339(),
        );
        info!(
            session_id = %session.id,
            score = feedback.average_score,
            answers = feedback.message_analysis.len(),
            "Practice session finished"
        );
        feedback
    }
}
