//! Interview Models
//!
//! Stored records and request/response payloads for scenarios, practice
//! sessions, session feedback and classic question sets.

use interview_arena_core::{
    ConversationMessage, FocusArea, InterviewScenario, Language, NormalizedFeedback,
    SessionFeedback, TimeLimit,
};
use serde::{Deserialize, Deserializer, Serialize};

/// A scenario as persisted in `mock_interviews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredScenario {
    pub mock_id: String,
    #[serde(flatten)]
    pub scenario: InterviewScenario,
    pub focus_area: FocusArea,
    pub created_by: String,
    pub created_at: String,
}

/// Dashboard row: a scenario joined with its latest session score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewListItem {
    pub mock_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub industry: String,
    pub role: String,
    pub language: String,
    pub created_at: String,
    pub latest_score: Option<u8>,
    pub feedback_at: Option<String>,
}

/// Stored session feedback joined with the fields of its scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub id: i64,
    #[serde(flatten)]
    pub feedback: SessionFeedback,
    pub title: Option<String>,
    pub difficulty: Option<String>,
    pub industry: Option<String>,
    pub role: Option<String>,
}

/// One generated question with its suggested answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    #[serde(alias = "Question")]
    pub question: String,
    #[serde(alias = "Answer", alias = "suggestedAnswer", alias = "suggestAnswer")]
    pub answer: String,
}

/// A classic mock interview: position details plus generated questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub mock_id: String,
    pub job_position: String,
    pub job_desc: String,
    pub job_experience: String,
    pub questions: Vec<QuestionAnswer>,
    pub created_by: String,
    pub created_at: String,
}

/// A rated answer to one question of a question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub id: i64,
    pub mock_id_ref: String,
    pub question: String,
    pub suggested_answer: String,
    pub user_answer: String,
    pub feedback: String,
    pub rating: String,
    pub user_email: String,
    pub created_at: String,
}

/// Model verdict on a single question-set answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRating {
    #[serde(deserialize_with = "loose_text")]
    pub feedback: String,
    #[serde(deserialize_with = "loose_text")]
    pub rating: String,
}

/// Quick feedback shown on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoFeedback {
    #[serde(deserialize_with = "loose_text")]
    pub strengths: String,
    #[serde(deserialize_with = "loose_text", alias = "improvements")]
    pub improvement: String,
}

impl DemoFeedback {
    /// Display text combining both parts.
    pub fn formatted(&self) -> String {
        format!(
            "Strengths: {}\n\nArea for Improvement: {}",
            self.strengths.trim(),
            self.improvement.trim()
        )
    }
}

// ── Requests ───────────────────────────────────────────────────────────

/// Persist a scenario authored by a form or by the designer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScenarioRequest {
    #[serde(flatten)]
    pub scenario: InterviewScenario,
    #[serde(default)]
    pub focus_area: FocusArea,
    pub created_by: String,
}

/// Response of scenario creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCreated {
    pub mock_id: String,
}

/// Query string carrying the current user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_email: String,
}

/// Query string selecting one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockIdQuery {
    pub mock_id: String,
}

/// Highest session score of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestScore {
    pub highest_score: u8,
}

/// Start a live practice session for a saved scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub mock_id: String,
    pub user_email: String,
    #[serde(default)]
    pub time_limit: TimeLimit,
    /// Overrides the scenario language
    #[serde(default)]
    pub language: Option<Language>,
    /// Caller-chosen session id, so the session can be abandoned while the
    /// opening line is still generating
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A started session and the interlocutor's opening line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub session_id: String,
    pub mock_id: String,
    pub language: Language,
    pub time_limit: TimeLimit,
    pub started_at: String,
    pub opening: ConversationMessage,
}

/// A user utterance in a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTurnRequest {
    pub content: String,
}

/// Result of one user turn: the analyzed message and the reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub user_message: ConversationMessage,
    pub reply: ConversationMessage,
    pub analysis: NormalizedFeedback,
    pub remaining_seconds: u64,
}

/// Ask for an improvement suggestion for one weakness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub weakness: String,
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResponse {
    pub suggestion: String,
}

/// Ask for suggestions for several weaknesses at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionBatchRequest {
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub language: Option<Language>,
}

/// Outcome for one weakness of a batch; exactly one of `suggestion` and
/// `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeaknessSuggestion {
    pub weakness: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoFeedbackRequest {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DemoFeedbackResponse {
    #[serde(flatten)]
    pub feedback: DemoFeedback,
    pub formatted: String,
}

/// Generate a classic question set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSetRequest {
    pub job_position: String,
    pub job_desc: String,
    pub job_experience: String,
    pub created_by: String,
    /// Overrides the configured question count
    #[serde(default)]
    pub question_count: Option<u32>,
}

/// Submit an answer to one question of a question set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub question_index: usize,
    pub user_answer: String,
    pub user_email: String,
}

/// Accept a string, a number or a list of strings (joined with "; ").
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Number(serde_json::Number),
        List(Vec<String>),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(text) => text.trim().to_string(),
        Loose::Number(number) => number.to_string(),
        Loose::List(items) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
    })
}
