//! Proverb lookup, attempt history, playback and analysis

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::attempt_log::Attempt;
use crate::catalog::Proverb;
use crate::error::{ApiError, ApiResult, ServiceError};
use crate::services::{LabelScore, DEFAULT_LABELS};
use crate::AppState;

fn lookup(state: &AppState, id: i64) -> ApiResult<Proverb> {
    state
        .controller
        .catalog()
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Proverb {}", id)))
}

/// GET /api/proverbs/:id
pub async fn get_proverb(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Proverb>> {
    Ok(Json(lookup(&state, id)?))
}

/// GET /api/proverbs/:id/attempts
///
/// Oldest first. Attempts for ids no longer in the catalog are still listed.
pub async fn list_attempts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Attempt>>> {
    let attempts: Vec<Attempt> = state.attempt_log.list_for_proverb(id).try_collect().await?;
    Ok(Json(attempts))
}

/// GET /api/proverbs/:id/speech
pub async fn proverb_speech(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let proverb = lookup(&state, id)?;
    let audio = state
        .synthesis
        .synthesize(&proverb.original_text, &state.synthesis_language)
        .await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub labels: Vec<LabelScore>,
}

/// POST /api/analysis
pub async fn analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    let classifier = state.classifier.as_ref().ok_or_else(|| {
        ServiceError::NotConfigured("Text analysis requires a classifier token".to_string())
    })?;

    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }

    let labels = match request.labels {
        Some(labels) if !labels.is_empty() => labels,
        _ => DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
    };

    let labels = classifier.classify(&request.text, &labels).await?;
    Ok(Json(AnalysisResponse { labels }))
}

pub fn proverb_routes() -> Router<AppState> {
    Router::new()
        .route("/api/proverbs/:id", get(get_proverb))
        .route("/api/proverbs/:id/attempts", get(list_attempts))
        .route("/api/proverbs/:id/speech", get(proverb_speech))
        .route("/api/analysis", post(analyze_text))
}
