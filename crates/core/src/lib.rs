//! Interview Arena Core
//!
//! Domain types shared across the Interview Arena workspace. This crate has
//! no I/O and no dependency on providers, storage or the HTTP layer.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `feedback` - Per-answer analysis (`NormalizedFeedback`) and score clamping
//! - `scenario` - Practice scenarios and their taxonomy
//! - `session` - Conversation messages, session report and scoring formula

pub mod error;
pub mod feedback;
pub mod scenario;
pub mod session;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Feedback ───────────────────────────────────────────────────────────
pub use feedback::{clamp_score, NormalizedFeedback};

// ── Scenarios ──────────────────────────────────────────────────────────
pub use scenario::{
    Difficulty, FocusArea, InterviewScenario, Language, ScenarioDraft, ScenarioRequest,
};

// ── Sessions ───────────────────────────────────────────────────────────
pub use session::{
    answer_factor, session_score, time_factor, ConversationMessage, MessageAnalysis,
    SessionFeedback, Speaker, TimeLimit,
};
