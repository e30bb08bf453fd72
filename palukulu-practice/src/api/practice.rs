//! Practice session handlers
//!
//! POST /api/sessions, GET /api/sessions/:id, POST /api/sessions/:id/submit,
//! POST /api/sessions/:id/next

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::Proverb;
use crate::error::{ApiError, ApiResult, PracticeError};
use crate::session::{AttemptResult, Session, SessionState};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub proverb: Proverb,
    pub state: SessionState,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            proverb: session.current_proverb.clone(),
            state: session.state(),
        }
    }
}

async fn find_session(state: &AppState, id: Uuid) -> ApiResult<Arc<Mutex<Session>>> {
    state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {}", id)))
}

/// POST /api/sessions
pub async fn start_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.controller.start()?;
    let response = SessionResponse::from(&session);

    state.sessions.insert(session).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/sessions/:id
///
/// Waits for an in-flight submission on the same session to finish.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = find_session(&state, id).await?;
    let session = session.lock().await;
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/sessions/:id/submit
///
/// Body is the raw recording. A second submit while one is being scored gets
/// 409 without touching the attempt log.
pub async fn submit_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<AttemptResult>> {
    let session = find_session(&state, id).await?;
    let mut session = session
        .try_lock()
        .map_err(|_| ApiError::from(PracticeError::SubmissionInProgress))?;

    match state.controller.submit(&mut session, &body).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if !matches!(e, PracticeError::SubmissionInProgress) {
                state.record_error(&e).await;
            }
            Err(e.into())
        }
    }
}

/// POST /api/sessions/:id/next
pub async fn next_proverb(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    state.controller.next(&mut session)?;
    Ok(Json(SessionResponse::from(&*session)))
}

pub fn practice_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/submit", post(submit_recording))
        .route("/api/sessions/:id/next", post(next_proverb))
}
