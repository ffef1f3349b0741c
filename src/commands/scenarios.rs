//! Scenario Endpoints
//!
//! Design scenarios with the AI, save them, list a user's scenarios with
//! their latest score, and delete them.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use interview_arena_core::{InterviewScenario, ScenarioRequest};
use uuid::Uuid;

use crate::models::interview::{
    CreateScenarioRequest, HighestScore, InterviewListItem, ScenarioCreated, StoredScenario,
    UserQuery,
};
use crate::models::response::{CommandResponse, Deleted};
use crate::services::practice::ScenarioDesigner;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// POST /api/scenarios/generate
///
/// Returns the designed scenario without saving it.
pub async fn generate_scenario(
    State(state): State<AppState>,
    Json(request): Json<ScenarioRequest>,
) -> AppResult<Json<CommandResponse<InterviewScenario>>> {
    let designer = ScenarioDesigner::new(state.generation_client().await);
    let scenario = designer.design(request).await?;
    Ok(Json(CommandResponse::ok(scenario)))
}

/// POST /api/mock-interview
pub async fn create_mock_interview(
    State(state): State<AppState>,
    Json(request): Json<CreateScenarioRequest>,
) -> AppResult<Json<CommandResponse<ScenarioCreated>>> {
    request.scenario.validate()?;
    if request.created_by.trim().is_empty() {
        return Err(AppError::validation("createdBy must not be empty"));
    }

    let stored = StoredScenario {
        mock_id: Uuid::new_v4().to_string(),
        scenario: request.scenario,
        focus_area: request.focus_area,
        created_by: request.created_by.trim().to_string(),
        created_at: Utc::now().to_rfc3339(),
    };
    state.db.insert_mock_interview(&stored)?;

    tracing::info!(mock_id = %stored.mock_id, created_by = %stored.created_by, "Scenario saved");
    Ok(Json(CommandResponse::ok(ScenarioCreated {
        mock_id: stored.mock_id,
    })))
}

/// GET /api/mock-interview/:mock_id
pub async fn get_mock_interview(
    State(state): State<AppState>,
    Path(mock_id): Path<String>,
) -> AppResult<Json<CommandResponse<StoredScenario>>> {
    let stored = state
        .db
        .get_mock_interview(&mock_id)?
        .ok_or_else(|| AppError::not_found(format!("Mock interview not found: {}", mock_id)))?;
    Ok(Json(CommandResponse::ok(stored)))
}

/// GET /api/interview-list?userEmail=
pub async fn list_interviews(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<CommandResponse<Vec<InterviewListItem>>>> {
    let items = state.db.list_interviews_for_user(&query.user_email)?;
    Ok(Json(CommandResponse::ok(items)))
}

/// DELETE /api/interview-list/:mock_id?userEmail=
pub async fn delete_interview(
    State(state): State<AppState>,
    Path(mock_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<CommandResponse<Deleted>>> {
    let deleted = state.db.delete_mock_interview(&mock_id, &query.user_email)?;
    if deleted == 0 {
        return Err(AppError::not_found(format!("Mock interview not found: {}", mock_id)));
    }
    Ok(Json(CommandResponse::ok(Deleted { deleted })))
}

/// GET /api/highest-score?userEmail=
pub async fn highest_score(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<CommandResponse<HighestScore>>> {
    let highest_score = state.db.highest_score(&query.user_email)?;
    Ok(Json(CommandResponse::ok(HighestScore { highest_score })))
}

/// Build scenario routes
pub fn scenario_routes() -> Router<AppState> {
    Router::new()
        .route("/api/scenarios/generate", post(generate_scenario))
        .route("/api/mock-interview", post(create_mock_interview))
        .route("/api/mock-interview/:mock_id", get(get_mock_interview))
        .route("/api/interview-list", get(list_interviews))
        .route("/api/interview-list/:mock_id", delete(delete_interview))
        .route("/api/highest-score", get(highest_score))
}
