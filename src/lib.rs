//! Interview Arena - Rust Backend Library
//!
//! Backend for AI mock interview practice. It includes:
//! - HTTP route handlers (axum)
//! - Practice services: scenario design, live arena, coaching
//! - Storage layer (SQLite, JSON config)
//! - Data models and utilities
//!
//! Provider access, retry and model fallback live in `interview-arena-llm`;
//! scenario, session and scoring types live in `interview-arena-core`.

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use commands::build_router;
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::{build_generation_client, AppState, SessionHandle};
pub use utils::error::{AppError, AppResult};
