//! Settings Endpoints
//!
//! Read and partially update the JSON configuration. Saving rebuilds the
//! Generation Client so new models and keys apply to the next request.

use axum::{extract::State, routing::get, Json, Router};

use crate::models::response::CommandResponse;
use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::state::AppState;
use crate::utils::error::AppResult;

/// Keep only the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

fn masked(mut config: AppConfig) -> AppConfig {
    config.api_key = config.api_key.as_deref().map(mask_secret);
    config
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<CommandResponse<AppConfig>> {
    Json(CommandResponse::ok(masked(state.config().await)))
}

/// PATCH /api/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> AppResult<Json<CommandResponse<AppConfig>>> {
    let updated = state.update_settings(update).await?;
    Ok(Json(CommandResponse::ok(masked(updated))))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).patch(update_settings))
}
