//! HTTP Commands
//!
//! Route handlers for the JSON API. Every handler answers with the
//! `CommandResponse` envelope; errors map to a status code through `AppError`.

pub mod feedback;
pub mod health;
pub mod practice;
pub mod question_sets;
pub mod scenarios;
pub mod settings;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub use feedback::feedback_routes;
pub use health::health_routes;
pub use practice::practice_routes;
pub use question_sets::question_set_routes;
pub use scenarios::scenario_routes;
pub use settings::settings_routes;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(scenario_routes())
        .merge(practice_routes())
        .merge(feedback_routes())
        .merge(question_set_routes())
        .merge(settings_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
