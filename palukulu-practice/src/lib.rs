//! palukulu-practice library interface
//!
//! Proverb pronunciation practice: pick a proverb, record it, transcribe,
//! score against the reference text and keep an append-only attempt log.
//! Also serves user contributions and the auxiliary analysis and playback
//! endpoints.

pub mod api;
pub mod attempt_log;
pub mod audio_store;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod registry;
pub mod scorer;
pub mod services;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::attempt_log::AttemptLog;
use crate::services::{ClassifierService, SynthesisService};
use crate::registry::SessionRegistry;
use crate::session::SessionController;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Users and contributions
    pub db: SqlitePool,
    pub controller: Arc<SessionController>,
    /// Live sessions; lost on restart, dropped when idle
    pub sessions: Arc<SessionRegistry>,
    pub attempt_log: Arc<dyn AttemptLog>,
    /// `None` disables `/api/analysis`
    pub classifier: Option<Arc<dyn ClassifierService>>,
    pub synthesis: Arc<dyn SynthesisService>,
    pub synthesis_language: String,
    pub max_upload_bytes: usize,
    pub startup_time: DateTime<Utc>,
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        controller: Arc<SessionController>,
        attempt_log: Arc<dyn AttemptLog>,
        synthesis: Arc<dyn SynthesisService>,
    ) -> Self {
        Self {
            db,
            controller,
            sessions: Arc::new(SessionRegistry::default()),
            attempt_log,
            classifier: None,
            synthesis,
            synthesis_language: "te".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ClassifierService>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_synthesis_language(mut self, language: impl Into<String>) -> Self {
        self.synthesis_language = language.into();
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<SessionRegistry>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Remember a failure for `/health`
    pub async fn record_error(&self, error: &impl Display) {
        *self.last_error.write().await = Some(error.to_string());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .merge(api::ui_routes())
        .merge(api::practice_routes())
        .merge(api::proverb_routes())
        .merge(api::contribution_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
