//! Live Practice Endpoints
//!
//! Start a timed session for a saved scenario, exchange turns, finish it
//! (persisting the report) or abandon it.

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use chrono::Utc;
use interview_arena_core::SessionFeedback;
use tracing::debug;

use crate::models::interview::{SessionStarted, StartSessionRequest, TurnResponse, UserTurnRequest};
use crate::models::response::{CommandResponse, Deleted};
use crate::services::practice::PracticeArena;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Longest accepted caller-chosen session id
const MAX_SESSION_ID_LEN: usize = 64;

/// POST /api/practice/sessions
///
/// The session is registered before the opening line is generated, so a
/// DELETE on a caller-chosen `sessionId` stops a slow start.
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> AppResult<Json<CommandResponse<SessionStarted>>> {
    let requested_id = request.session_id.as_deref().map(validate_session_id).transpose()?;
    let stored = state
        .db
        .get_mock_interview(&request.mock_id)?
        .ok_or_else(|| AppError::not_found(format!("Mock interview not found: {}", request.mock_id)))?;

    let arena = PracticeArena::new(state.generation_client().await);
    let mut session = arena.begin(
        stored,
        &request.user_email,
        request.time_limit,
        request.language,
        Utc::now(),
    )?;
    if let Some(id) = requested_id {
        session.id = id;
    }
    let session_id = session.id.clone();

    let handle = state.insert_session(session).await?;
    let mut session = handle.session.lock().await;
    if let Err(e) = arena.open(&mut session, Utc::now()).await {
        drop(session);
        if state.remove_session(&session_id).await.is_err() {
            debug!(session_id = %session_id, "Session already removed during start");
        }
        return Err(e);
    }

    let started = SessionStarted {
        session_id: session.id.clone(),
        mock_id: session.mock_id.clone(),
        language: session.language,
        time_limit: session.time_limit,
        started_at: session.started_at.to_rfc3339(),
        opening: session
            .messages
            .first()
            .cloned()
            .ok_or_else(|| AppError::internal("Session started without an opening line"))?,
    };

    Ok(Json(CommandResponse::ok(started)))
}

fn validate_session_id(id: &str) -> AppResult<String> {
    let id = id.trim();
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::validation(
            "sessionId must be 1-64 letters, digits, '-' or '_'",
        ));
    }
    Ok(id.to_string())
}

/// POST /api/practice/sessions/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<UserTurnRequest>,
) -> AppResult<Json<CommandResponse<TurnResponse>>> {
    let handle = state.session(&session_id).await?;
    let arena = PracticeArena::new(state.generation_client().await);

    let mut session = handle.session.lock().await;
    let turn = arena.respond(&mut session, &request.content, Utc::now()).await?;
    Ok(Json(CommandResponse::ok(turn)))
}

/// POST /api/practice/sessions/:id/finish
///
/// Replaces any earlier report of the same user for the scenario. The
/// session is dropped only after the report is stored, so a failed write
/// can be retried.
pub async fn finish_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<CommandResponse<SessionFeedback>>> {
    let handle = state.session(&session_id).await?;
    let arena = PracticeArena::new(state.generation_client().await);

    let session = handle.session.lock().await;
    // Finished or abandoned while this request waited for the lock
    if handle.cancel.is_cancelled() {
        return Err(AppError::not_found(format!(
            "Practice session not found: {}",
            session_id
        )));
    }
    let feedback = arena.finish(&session, Utc::now());
    state.db.replace_feedback(&feedback)?;
    drop(session);

    if state.remove_session(&session_id).await.is_err() {
        debug!(session_id = %session_id, "Session removed while finishing");
    }
    Ok(Json(CommandResponse::ok(feedback)))
}

/// DELETE /api/practice/sessions/:id
pub async fn abandon_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<CommandResponse<Deleted>>> {
    state.remove_session(&session_id).await?;
    tracing::info!(session_id = %session_id, "Practice session abandoned");
    Ok(Json(CommandResponse::ok(Deleted { deleted: 1 })))
}

/// Build practice routes
pub fn practice_routes() -> Router<AppState> {
    Router::new()
        .route("/api/practice/sessions", post(start_session))
        .route("/api/practice/sessions/:id", delete(abandon_session))
        .route("/api/practice/sessions/:id/messages", post(send_message))
        .route("/api/practice/sessions/:id/finish", post(finish_session))
}
