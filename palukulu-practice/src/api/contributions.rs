//! User and contribution handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use palukulu_common::db::models::{
    ContributedProverb, NewProverb, NewTongueTwister, NewUser, TongueTwister, User,
};

use crate::db::contributions;
use crate::error::ApiResult;
use crate::AppState;

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = contributions::create_user(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    Ok(Json(contributions::get_user(&state.db, id).await?))
}

/// GET /api/users/:id/proverbs
pub async fn user_proverbs(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ContributedProverb>>> {
    Ok(Json(contributions::proverbs_by_contributor(&state.db, id).await?))
}

/// GET /api/users/:id/tongue-twisters
pub async fn user_tongue_twisters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<TongueTwister>>> {
    Ok(Json(
        contributions::tongue_twisters_by_contributor(&state.db, id).await?,
    ))
}

/// POST /api/contributions/proverbs
pub async fn contribute_proverb(
    State(state): State<AppState>,
    Json(request): Json<NewProverb>,
) -> ApiResult<(StatusCode, Json<ContributedProverb>)> {
    let proverb = contributions::add_proverb(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(proverb)))
}

/// POST /api/contributions/tongue-twisters
pub async fn contribute_tongue_twister(
    State(state): State<AppState>,
    Json(request): Json<NewTongueTwister>,
) -> ApiResult<(StatusCode, Json<TongueTwister>)> {
    let twister = contributions::add_tongue_twister(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(twister)))
}

pub fn contribution_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/:id", get(get_user))
        .route("/api/users/:id/proverbs", get(user_proverbs))
        .route("/api/users/:id/tongue-twisters", get(user_tongue_twisters))
        .route("/api/contributions/proverbs", post(contribute_proverb))
        .route(
            "/api/contributions/tongue-twisters",
            post(contribute_tongue_twister),
        )
}
