//! palukulu-practice - Telugu proverb pronunciation practice service
//!
//! Serves the practice page and API on port 5730 by default.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use palukulu_common::config::{load_toml_config, AttemptLogBackend, RootFolder, DEFAULT_PORT};
use palukulu_practice::attempt_log::{AttemptLog, JsonIndexAttemptLog, SqliteAttemptLog};
use palukulu_practice::audio_store::AudioStore;
use palukulu_practice::catalog::ProverbCatalog;
use palukulu_practice::registry::SessionRegistry;
use palukulu_practice::error::CatalogError;
use palukulu_practice::services::{GoogleSpeechClient, GoogleTranslateTts, HuggingFaceClassifier};
use palukulu_practice::session::SessionController;
use palukulu_practice::{config, AppState};

#[derive(Parser, Debug)]
#[command(name = "palukulu-practice")]
#[command(about = "Telugu proverb pronunciation practice")]
#[command(version)]
struct Args {
    /// Root folder for the database, recordings and catalog
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proverb catalog JSON file
    #[arg(long)]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref());
    let level = toml_config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "palukulu_practice={0},palukulu_common={0},tower_http={0}",
                level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting palukulu-practice v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let toml_config = toml_config.context("Failed to load configuration")?;

    let root_folder = RootFolder::resolve(args.root_folder.as_deref(), &toml_config);
    root_folder
        .ensure_directories()
        .context("Failed to initialize root folder")?;
    info!("Root folder: {}", root_folder.path().display());

    let db_path = root_folder.database_path();
    let db_pool = palukulu_common::db::init_database_pool(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database: {}", db_path.display());

    let catalog_path = args
        .catalog
        .clone()
        .or_else(|| toml_config.catalog_path.clone())
        .unwrap_or_else(|| root_folder.default_catalog_path());
    let catalog = ProverbCatalog::load(&catalog_path)?;
    if catalog.is_empty() {
        bail!(CatalogError::Empty);
    }
    let catalog = Arc::new(catalog);

    let speech_api_key = config::resolve_speech_api_key(&toml_config)?;
    let transcriber = Arc::new(GoogleSpeechClient::new(
        toml_config.speech.endpoint.clone(),
        speech_api_key,
    )?);

    let attempt_log: Arc<dyn AttemptLog> = match toml_config.practice.attempt_log {
        AttemptLogBackend::Sqlite => Arc::new(SqliteAttemptLog::new(db_pool.clone())),
        AttemptLogBackend::JsonIndex => {
            warn!("Using legacy JSON index attempt log; appends from other processes may be lost");
            Arc::new(JsonIndexAttemptLog::new(root_folder.legacy_index_path()))
        }
    };
    let logged = attempt_log
        .count()
        .await
        .context("Failed to read attempt log")?;
    info!(backend = attempt_log.name(), attempts = logged, "Attempt log ready");

    let controller = SessionController::new(
        catalog,
        transcriber,
        attempt_log.clone(),
        AudioStore::new(root_folder.audio_folder()),
    )
    .with_language(toml_config.speech.language_code.clone())
    .with_timeout(Duration::from_secs(
        toml_config.practice.transcription_timeout_secs,
    ));

    let synthesis = Arc::new(GoogleTranslateTts::new(
        toml_config.synthesis.endpoint.clone(),
    )?);

    let sessions = Arc::new(SessionRegistry::new(
        Duration::from_secs(toml_config.practice.session_idle_secs),
        toml_config.practice.max_sessions,
    ));
    let sweep_period = (sessions.idle_ttl() / 4).max(Duration::from_secs(1));
    Arc::clone(&sessions).spawn_sweeper(sweep_period);

    let mut state = AppState::new(db_pool, Arc::new(controller), attempt_log, synthesis)
        .with_sessions(sessions)
        .with_synthesis_language(toml_config.synthesis.language.clone())
        .with_max_upload_bytes(toml_config.practice.max_upload_bytes);

    if let Some(token) = config::resolve_classifier_token(&toml_config) {
        let classifier = HuggingFaceClassifier::new(
            &toml_config.classifier.endpoint,
            &toml_config.classifier.model,
            token,
            toml_config.classifier.threshold,
        )?;
        state = state.with_classifier(Arc::new(classifier));
    }

    let app = palukulu_practice::build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
