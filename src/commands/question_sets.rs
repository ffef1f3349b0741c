//! Question Set Endpoints
//!
//! Classic mock interviews: a generated list of questions with suggested
//! answers, and per-question ratings of the user's recorded answers.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use uuid::Uuid;

use crate::models::interview::{AnswerRequest, QuestionSet, QuestionSetRequest, UserAnswer, UserQuery};
use crate::models::response::CommandResponse;
use crate::services::practice::CoachingService;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

fn load_question_set(state: &AppState, mock_id: &str) -> AppResult<QuestionSet> {
    state
        .db
        .get_question_set(mock_id)?
        .ok_or_else(|| AppError::not_found(format!("Question set not found: {}", mock_id)))
}

/// POST /api/question-sets
pub async fn create_question_set(
    State(state): State<AppState>,
    Json(request): Json<QuestionSetRequest>,
) -> AppResult<Json<CommandResponse<QuestionSet>>> {
    if request.created_by.trim().is_empty() {
        return Err(AppError::validation("createdBy must not be empty"));
    }
    let count = match request.question_count {
        Some(count) => count,
        None => state.config().await.question_count,
    };

    let coaching = CoachingService::new(state.generation_client().await);
    let questions = coaching
        .question_set(
            &request.job_position,
            &request.job_desc,
            &request.job_experience,
            count,
        )
        .await?;

    let set = QuestionSet {
        mock_id: Uuid::new_v4().to_string(),
        job_position: request.job_position,
        job_desc: request.job_desc,
        job_experience: request.job_experience,
        questions,
        created_by: request.created_by,
        created_at: Utc::now().to_rfc3339(),
    };
    state.db.insert_question_set(&set)?;

    tracing::info!(mock_id = %set.mock_id, questions = set.questions.len(), "Question set stored");
    Ok(Json(CommandResponse::ok(set)))
}

/// GET /api/question-sets/:mock_id
pub async fn get_question_set(
    State(state): State<AppState>,
    Path(mock_id): Path<String>,
) -> AppResult<Json<CommandResponse<QuestionSet>>> {
    Ok(Json(CommandResponse::ok(load_question_set(&state, &mock_id)?)))
}

/// POST /api/question-sets/:mock_id/answers
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(mock_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> AppResult<Json<CommandResponse<UserAnswer>>> {
    if request.user_email.trim().is_empty() {
        return Err(AppError::validation("userEmail must not be empty"));
    }
    let set = load_question_set(&state, &mock_id)?;
    let qa = set.questions.get(request.question_index).ok_or_else(|| {
        AppError::validation(format!(
            "questionIndex {} out of range (0..{})",
            request.question_index,
            set.questions.len()
        ))
    })?;

    let coaching = CoachingService::new(state.generation_client().await);
    let rating = coaching
        .rate_answer(&qa.question, &qa.answer, &request.user_answer)
        .await?;

    let answer = state.db.insert_user_answer(&UserAnswer {
        id: 0,
        mock_id_ref: mock_id,
        question: qa.question.clone(),
        suggested_answer: qa.answer.clone(),
        user_answer: request.user_answer,
        feedback: rating.feedback,
        rating: rating.rating,
        user_email: request.user_email,
        created_at: Utc::now().to_rfc3339(),
    })?;
    Ok(Json(CommandResponse::ok(answer)))
}

/// GET /api/question-sets/:mock_id/answers?userEmail=
pub async fn list_answers(
    State(state): State<AppState>,
    Path(mock_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<CommandResponse<Vec<UserAnswer>>>> {
    let answers = state.db.list_user_answers(&mock_id, &query.user_email)?;
    Ok(Json(CommandResponse::ok(answers)))
}

/// Build question set routes
pub fn question_set_routes() -> Router<AppState> {
    Router::new()
        .route("/api/question-sets", post(create_question_set))
        .route("/api/question-sets/:mock_id", get(get_question_set))
        .route(
            "/api/question-sets/:mock_id/answers",
            post(submit_answer).get(list_answers),
        )
}
