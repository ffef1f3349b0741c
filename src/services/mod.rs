//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by the HTTP handlers.

pub mod practice;

pub use practice::{CoachingService, PracticeArena, PracticeSession, ScenarioDesigner};
