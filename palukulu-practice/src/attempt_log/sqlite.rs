//! SQLite-backed attempt log
//!
//! One row per attempt in `attempts`. A single INSERT is atomic for readers,
//! and WAL + `synchronous=FULL` (set when the pool is opened) makes it durable
//! on commit. Re-appending an attempt id is a no-op.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{Attempt, AttemptLog};
use crate::db::retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use crate::error::PersistenceError;

pub struct SqliteAttemptLog {
    pool: SqlitePool,
    max_lock_wait_ms: u64,
}

impl SqliteAttemptLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    pub fn with_max_lock_wait_ms(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttemptRow {
    attempt_id: String,
    proverb_id: i64,
    proverb_text: String,
    audio_path: String,
    transcription: String,
    similarity_score: f64,
    created_at: String,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = PersistenceError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let attempt_id = Uuid::parse_str(&row.attempt_id).map_err(|e| {
            PersistenceError::Corrupt(format!("attempt_id {:?}: {}", row.attempt_id, e))
        })?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| {
                PersistenceError::Corrupt(format!("created_at {:?}: {}", row.created_at, e))
            })?
            .with_timezone(&chrono::Utc);

        Ok(Attempt {
            attempt_id,
            proverb_id: row.proverb_id,
            proverb_text: row.proverb_text,
            audio_reference: row.audio_path,
            transcription: row.transcription,
            similarity_score: row.similarity_score,
            created_at,
        })
    }
}

#[async_trait]
impl AttemptLog for SqliteAttemptLog {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn append(&self, attempt: &Attempt) -> Result<(), PersistenceError> {
        // Prepare all data BEFORE acquiring a connection
        let attempt_id = attempt.attempt_id.to_string();
        let created_at = attempt.created_at.to_rfc3339();

        retry_on_lock("attempt append", self.max_lock_wait_ms, || async {
            sqlx::query(
                r#"
                INSERT INTO attempts (
                    attempt_id, proverb_id, proverb_text, audio_path,
                    transcription, similarity_score, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(attempt_id) DO NOTHING
                "#,
            )
            .bind(&attempt_id)
            .bind(attempt.proverb_id)
            .bind(&attempt.proverb_text)
            .bind(&attempt.audio_reference)
            .bind(&attempt.transcription)
            .bind(attempt.similarity_score)
            .bind(&created_at)
            .execute(&self.pool)
            .await
            .map_err(PersistenceError::Database)?;

            Ok(())
        })
        .await
    }

    fn list_for_proverb(
        &self,
        proverb_id: i64,
    ) -> BoxStream<'_, Result<Attempt, PersistenceError>> {
        sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT attempt_id, proverb_id, proverb_text, audio_path,
                   transcription, similarity_score, created_at
            FROM attempts
            WHERE proverb_id = ?
            ORDER BY seq
            "#,
        )
        .bind(proverb_id)
        .fetch(&self.pool)
        .map(|row| row.map_err(PersistenceError::Database).and_then(Attempt::try_from))
        .boxed()
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attempts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}
