//! Health Check Endpoint
//!
//! Reports database, configuration and provider readiness plus uptime.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::models::response::{CommandResponse, HealthResponse};
use crate::state::AppState;

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Json<CommandResponse<HealthResponse>> {
    let mut health = HealthResponse::default();

    health.database = state.db.is_healthy();
    health.config = state.config_healthy().await;
    health.provider_configured = state.config().await.resolved_api_key().is_some();
    health.active_sessions = state.active_sessions().await;
    health.uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    // Overall status
    health.status = if health.database && health.config {
        "healthy".to_string()
    } else {
        "degraded".to_string()
    };

    Json(CommandResponse::ok(health))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(get_health))
}
