//! Feedback Endpoints
//!
//! Store and browse session reports, plus the one-shot coaching calls
//! (weakness suggestion and landing-page demo feedback).

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use interview_arena_core::SessionFeedback;

use crate::models::interview::{
    DemoFeedbackRequest, DemoFeedbackResponse, FeedbackRecord, MockIdQuery,
    SuggestionBatchRequest, SuggestionRequest, SuggestionResponse, WeaknessSuggestion,
};
use crate::models::response::{CommandResponse, Deleted};
use crate::services::practice::CoachingService;
use crate::state::AppState;
use crate::utils::error::AppResult;

/// POST /api/interview-feedback
pub async fn save_feedback(
    State(state): State<AppState>,
    Json(feedback): Json<SessionFeedback>,
) -> AppResult<Json<CommandResponse<i64>>> {
    feedback.validate()?;
    let id = state.db.insert_feedback(&feedback)?;
    tracing::info!(
        feedback_id = id,
        mock_id = %feedback.mock_id_ref,
        score = feedback.average_score,
        "Feedback stored"
    );
    Ok(Json(CommandResponse::ok(id)))
}

/// GET /api/interview-feedback
pub async fn list_feedback(
    State(state): State<AppState>,
) -> AppResult<Json<CommandResponse<Vec<FeedbackRecord>>>> {
    let records = state.db.list_feedback_with_scenarios()?;
    Ok(Json(CommandResponse::ok(records)))
}

/// DELETE /api/interview-feedback?mockId=
pub async fn delete_feedback(
    State(state): State<AppState>,
    Query(query): Query<MockIdQuery>,
) -> AppResult<Json<CommandResponse<Deleted>>> {
    let deleted = state.db.delete_feedback(&query.mock_id)?;
    Ok(Json(CommandResponse::ok(Deleted { deleted })))
}

/// POST /api/interview-feedback/generate-suggestion
pub async fn generate_suggestion(
    State(state): State<AppState>,
    Json(request): Json<SuggestionRequest>,
) -> AppResult<Json<CommandResponse<SuggestionResponse>>> {
    let language = match request.language {
        Some(language) => language,
        None => state.config().await.default_language(),
    };
    let coaching = CoachingService::new(state.generation_client().await);
    let suggestion = coaching
        .suggest_improvement(&request.weakness, language)
        .await?;
    Ok(Json(CommandResponse::ok(SuggestionResponse { suggestion })))
}

/// POST /api/interview-feedback/generate-suggestions
pub async fn generate_suggestions(
    State(state): State<AppState>,
    Json(request): Json<SuggestionBatchRequest>,
) -> AppResult<Json<CommandResponse<Vec<WeaknessSuggestion>>>> {
    let language = match request.language {
        Some(language) => language,
        None => state.config().await.default_language(),
    };
    let coaching = CoachingService::new(state.generation_client().await);
    let suggestions = coaching
        .suggest_improvements(&request.weaknesses, language)
        .await?;
    Ok(Json(CommandResponse::ok(suggestions)))
}

/// POST /api/demo/feedback
pub async fn demo_feedback(
    State(state): State<AppState>,
    Json(request): Json<DemoFeedbackRequest>,
) -> AppResult<Json<CommandResponse<DemoFeedbackResponse>>> {
    let coaching = CoachingService::new(state.generation_client().await);
    let feedback = coaching
        .demo_feedback(&request.question, &request.answer)
        .await?;
    let formatted = feedback.formatted();
    Ok(Json(CommandResponse::ok(DemoFeedbackResponse {
        feedback,
        formatted,
    })))
}

/// Build feedback routes
pub fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/interview-feedback",
            post(save_feedback).get(list_feedback).delete(delete_feedback),
        )
        .route(
            "/api/interview-feedback/generate-suggestion",
            post(generate_suggestion),
        )
        .route(
            "/api/interview-feedback/generate-suggestions",
            post(generate_suggestions),
        )
        .route("/api/demo/feedback", post(demo_feedback))
}
