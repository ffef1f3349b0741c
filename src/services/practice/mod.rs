//! Practice Services
//!
//! Everything that talks to the Generation Client on behalf of the API:
//! - `designer` - AI scenario design with bounded regeneration
//! - `arena` - live practice sessions (opening line, turns, session report)
//! - `coaching` - suggestions, demo feedback, question sets, answer ratings
//! - `prompts` - prompt builders

pub mod arena;
pub mod coaching;
pub mod designer;
pub mod prompts;

#[cfg(test)]
pub(crate) mod testing;

pub use arena::{PracticeArena, PracticeSession};
pub use coaching::CoachingService;
pub use designer::ScenarioDesigner;
