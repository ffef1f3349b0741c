//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod interview;
pub mod response;
pub mod settings;

pub use interview::*;
pub use response::*;
pub use settings::*;
