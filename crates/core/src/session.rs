//! Practice Sessions
//!
//! Conversation records and the end-of-session aggregate, including the
//! single scoring formula used everywhere a session score is shown or stored.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::feedback::{clamp_score, NormalizedFeedback};

/// Lower bound for the time and answer factors.
pub const MIN_SCORE_FACTOR: f64 = 0.7;

/// Number of analyzed answers needed for a full answer factor.
pub const FULL_CREDIT_ANSWERS: usize = 3;

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Ai,
    User,
}

/// One turn of a practice conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<NormalizedFeedback>,
}

impl ConversationMessage {
    pub fn ai(id: impl Into<String>, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speaker: Speaker::Ai,
            content: content.into(),
            timestamp: timestamp.into(),
            analysis: None,
        }
    }

    pub fn user(id: impl Into<String>, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            speaker: Speaker::User,
            content: content.into(),
            timestamp: timestamp.into(),
            analysis: None,
        }
    }
}

/// Allowed practice durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimeLimit {
    ThreeMinutes,
    FiveMinutes,
    TenMinutes,
}

impl TimeLimit {
    pub fn minutes(&self) -> u32 {
        match self {
            TimeLimit::ThreeMinutes => 3,
            TimeLimit::FiveMinutes => 5,
            TimeLimit::TenMinutes => 10,
        }
    }

    pub fn seconds(&self) -> u64 {
        u64::from(self.minutes()) * 60
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        TimeLimit::FiveMinutes
    }
}

impl TryFrom<u32> for TimeLimit {
    type Error = CoreError;

    fn try_from(minutes: u32) -> CoreResult<Self> {
        match minutes {
            3 => Ok(TimeLimit::ThreeMinutes),
            5 => Ok(TimeLimit::FiveMinutes),
            10 => Ok(TimeLimit::TenMinutes),
            other => Err(CoreError::validation(format!(
                "Unsupported time limit: {} minutes (expected 3, 5 or 10)",
                other
            ))),
        }
    }
}

impl From<TimeLimit> for u32 {
    fn from(limit: TimeLimit) -> Self {
        limit.minutes()
    }
}

/// Analysis attached to one user message, kept for the session report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAnalysis {
    pub message_id: String,
    pub content: String,
    pub analysis: NormalizedFeedback,
}

/// Mean of the analyzed answer scores, `0.0` when nothing was analyzed.
pub fn raw_average(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64
}

/// Share of the time limit actually used, clamped to `[0.7, 1.0]`.
pub fn time_factor(elapsed_seconds: u64, limit_seconds: u64) -> f64 {
    if limit_seconds == 0 {
        return 1.0;
    }
    (elapsed_seconds as f64 / limit_seconds as f64).clamp(MIN_SCORE_FACTOR, 1.0)
}

/// Credit for the number of analyzed answers, clamped to `[0.7, 1.0]`.
pub fn answer_factor(analyzed_answers: usize) -> f64 {
    (analyzed_answers as f64 / FULL_CREDIT_ANSWERS as f64).clamp(MIN_SCORE_FACTOR, 1.0)
}

/// Final session score: `round(average * time_factor * answer_factor)`.
pub fn session_score(scores: &[u8], elapsed_seconds: u64, limit_seconds: u64) -> u8 {
    let raw = raw_average(scores);
    clamp_score(raw * time_factor(elapsed_seconds, limit_seconds) * answer_factor(scores.len()))
}

/// Aggregate report of a finished practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFeedback {
    pub mock_id_ref: String,
    pub user_email: String,
    pub duration_seconds: u64,
    pub total_messages: usize,
    pub average_score: u8,
    pub conversation: Vec<ConversationMessage>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub detailed_feedback: String,
    pub message_analysis: Vec<MessageAnalysis>,
    #[serde(default)]
    pub created_at: String,
}

impl SessionFeedback {
    /// Build the report for a conversation.
    ///
    /// Only user messages carrying a real (non-degraded) analysis contribute
    /// to the score; strengths and weaknesses are de-duplicated in order.
    pub fn aggregate(
        mock_id_ref: impl Into<String>,
        user_email: impl Into<String>,
        conversation: Vec<ConversationMessage>,
        elapsed_seconds: u64,
        limit_seconds: u64,
        created_at: impl Into<String>,
    ) -> Self {
        let message_analysis: Vec<MessageAnalysis> = conversation
            .iter()
            .filter(|m| m.speaker == Speaker::User)
            .filter_map(|m| {
                m.analysis
                    .as_ref()
                    .filter(|a| !a.is_empty())
                    .map(|a| MessageAnalysis {
                        message_id: m.id.clone(),
                        content: m.content.clone(),
                        analysis: a.clone(),
                    })
            })
            .collect();

        let mut strengths: Vec<String> = Vec::new();
        let mut weaknesses: Vec<String> = Vec::new();
        for entry in &message_analysis {
            push_unique(&mut strengths, &entry.analysis.strengths);
            push_unique(&mut weaknesses, &entry.analysis.weaknesses);
        }

        let detailed_feedback = message_analysis
            .iter()
            .map(|entry| entry.analysis.feedback.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let scores: Vec<u8> = message_analysis
            .iter()
            .map(|entry| entry.analysis.overall_score)
            .collect();
        let duration_seconds = if limit_seconds == 0 {
            elapsed_seconds
        } else {
            elapsed_seconds.min(limit_seconds)
        };

        Self {
            mock_id_ref: mock_id_ref.into(),
            user_email: user_email.into(),
            duration_seconds,
            total_messages: conversation.len(),
            average_score: session_score(&scores, elapsed_seconds, limit_seconds),
            conversation,
            strengths,
            weaknesses,
            detailed_feedback,
            message_analysis,
            created_at: created_at.into(),
        }
    }

    /// Validate a client-submitted report before it is stored.
    pub fn validate(&self) -> CoreResult<()> {
        if self.mock_id_ref.trim().is_empty() {
            return Err(CoreError::validation("mockIdRef must not be empty"));
        }
        if self.user_email.trim().is_empty() {
            return Err(CoreError::validation("userEmail must not be empty"));
        }
        if self.average_score > crate::feedback::MAX_SCORE {
            return Err(CoreError::validation("averageScore must be within 0..=100"));
        }
        Ok(())
    }
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !target.iter().any(|existing| existing == item) {
            target.push(item.to_string());
        }
    }
}
