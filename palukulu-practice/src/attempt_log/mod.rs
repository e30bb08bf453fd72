//! Append-only practice attempt log
//!
//! Every scored submission becomes exactly one [`Attempt`]. Records are never
//! updated or removed. Reading back preserves insertion order.

mod json_index;
mod sqlite;

pub use json_index::JsonIndexAttemptLog;
pub use sqlite::SqliteAttemptLog;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PersistenceError;

/// One recorded-and-scored try at a proverb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub proverb_id: i64,
    /// Reference text at submission time
    pub proverb_text: String,
    /// Stored recording path
    #[serde(rename = "audio_path")]
    pub audio_reference: String,
    /// Recognized text or a legacy placeholder
    pub transcription: String,
    pub similarity_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Durable, append-only attempt storage
///
/// `append` returns only after the record is durable. Concurrent readers see
/// either the log without the record or with all of it.
#[async_trait]
pub trait AttemptLog: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn append(&self, attempt: &Attempt) -> Result<(), PersistenceError>;

    /// Attempts for one proverb, oldest first
    fn list_for_proverb(
        &self,
        proverb_id: i64,
    ) -> BoxStream<'_, Result<Attempt, PersistenceError>>;

    /// Total number of logged attempts
    async fn count(&self) -> Result<u64, PersistenceError>;
}
