//! Database initialization
//!
//! Opens (or creates) `palukulu.db` and creates every table idempotently.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Open the shared database and make sure the schema exists
///
/// WAL journal with `synchronous=FULL`: a committed insert survives a crash
/// immediately after the call returns.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!("Connecting to database: {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_attempts_table(pool).await?;
    create_users_table(pool).await?;
    create_proverbs_table(pool).await?;
    create_tongue_twisters_table(pool).await?;

    tracing::info!("Database tables initialized (attempts, users, proverbs, tongue_twisters)");
    Ok(())
}

/// Append-only practice attempt log
///
/// `seq` fixes insertion order; `attempt_id` is the public identity.
pub async fn create_attempts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attempts (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            attempt_id TEXT NOT NULL UNIQUE,
            proverb_id INTEGER NOT NULL,
            proverb_text TEXT NOT NULL,
            audio_path TEXT NOT NULL,
            transcription TEXT NOT NULL,
            similarity_score REAL NOT NULL CHECK (similarity_score >= 0.0 AND similarity_score <= 1.0),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attempts_proverb ON attempts(proverb_id, seq)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL CHECK (length(display_name) <= 128),
            email TEXT CHECK (email IS NULL OR length(email) <= 128)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// User-contributed proverbs (separate from the static practice catalog)
pub async fn create_proverbs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS proverbs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            contributor_id INTEGER NOT NULL REFERENCES users(id),
            meaning TEXT,
            region TEXT CHECK (region IS NULL OR length(region) <= 128),
            tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_proverbs_contributor ON proverbs(contributor_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_tongue_twisters_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tongue_twisters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            contributor_id INTEGER NOT NULL REFERENCES users(id),
            region TEXT CHECK (region IS NULL OR length(region) <= 128),
            audio_url TEXT CHECK (audio_url IS NULL OR length(audio_url) <= 256),
            difficulty TEXT CHECK (difficulty IS NULL OR length(difficulty) <= 32),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tongue_twisters_contributor ON tongue_twisters(contributor_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
