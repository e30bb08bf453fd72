//! Legacy JSON index attempt log (`user_audio_index.json`)
//!
//! The file is a single JSON array. Each append rewrites the whole array to a
//! temporary file in the same directory, fsyncs it, and renames it over the
//! original, so readers never see a truncated file. Appends are serialized
//! within the process; across processes the last rename wins, which is why
//! SQLite is the default backend.
//!
//! Entries written before attempt ids existed are kept byte-for-byte on
//! rewrite. When read they get a position-derived id and an epoch timestamp.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Attempt, AttemptLog};
use crate::error::PersistenceError;

pub struct JsonIndexAttemptLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonIndexAttemptLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Value>, PersistenceError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_entries(&path))
            .await
            .map_err(join_error)?
    }
}

/// Entry shape, tolerant of records that predate ids and timestamps
#[derive(Debug, Deserialize)]
struct IndexEntry {
    #[serde(default)]
    attempt_id: Option<Uuid>,
    proverb_id: i64,
    proverb_text: String,
    audio_path: String,
    transcription: String,
    similarity_score: f64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl IndexEntry {
    fn into_attempt(self, position: usize) -> Attempt {
        Attempt {
            attempt_id: self
                .attempt_id
                .unwrap_or_else(|| Uuid::from_u128(position as u128 + 1)),
            proverb_id: self.proverb_id,
            proverb_text: self.proverb_text,
            audio_reference: self.audio_path,
            transcription: self.transcription,
            similarity_score: self.similarity_score,
            created_at: self.created_at.unwrap_or_default(),
        }
    }
}

fn read_entries(path: &Path) -> Result<Vec<Value>, PersistenceError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(&content)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(PersistenceError::Corrupt(format!(
            "{} is not a JSON array",
            path.display()
        ))),
    }
}

fn append_blocking(path: &Path, attempt: &Attempt) -> Result<bool, PersistenceError> {
    let mut entries = read_entries(path)?;

    let id = attempt.attempt_id.to_string();
    let already_logged = entries
        .iter()
        .any(|entry| entry.get("attempt_id").and_then(Value::as_str) == Some(id.as_str()));
    if already_logged {
        return Ok(false);
    }

    entries.push(serde_json::to_value(attempt)?);

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
    serde_json::to_writer_pretty(&mut temp, &entries)?;
    temp.write_all(b"\n")?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| PersistenceError::Io(e.error))?;

    // Make the rename itself durable
    #[cfg(unix)]
    std::fs::File::open(&parent)?.sync_all()?;

    Ok(true)
}

fn join_error(err: tokio::task::JoinError) -> PersistenceError {
    PersistenceError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}

#[async_trait]
impl AttemptLog for JsonIndexAttemptLog {
    fn name(&self) -> &'static str {
        "json_index"
    }

    async fn append(&self, attempt: &Attempt) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        let record = attempt.clone();
        let written = tokio::task::spawn_blocking(move || append_blocking(&path, &record))
            .await
            .map_err(join_error)??;

        if !written {
            tracing::debug!(attempt_id = %attempt.attempt_id, "Attempt already in index, skipped");
        }
        Ok(())
    }

    fn list_for_proverb(
        &self,
        proverb_id: i64,
    ) -> BoxStream<'_, Result<Attempt, PersistenceError>> {
        stream::once(self.load())
            .flat_map(move |loaded| match loaded {
                Ok(entries) => stream::iter(entries.into_iter().enumerate().filter_map(
                    move |(position, entry)| match IndexEntry::deserialize(entry) {
                        Ok(entry) if entry.proverb_id == proverb_id => {
                            Some(Ok(entry.into_attempt(position)))
                        }
                        Ok(_) => None,
                        Err(e) => Some(Err(PersistenceError::Corrupt(format!(
                            "index entry {}: {}",
                            position + 1,
                            e
                        )))),
                    },
                ))
                .boxed(),
                Err(e) => stream::iter(vec![Err(e)]).boxed(),
            })
            .boxed()
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        Ok(self.load().await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::TempDir;

    fn attempt(proverb_id: i64, transcription: &str) -> Attempt {
        Attempt {
            attempt_id: Uuid::new_v4(),
            proverb_id,
            proverb_text: "ఆ".to_string(),
            audio_reference: format!("user_audios/user_audio_{}.wav", proverb_id),
            transcription: transcription.to_string(),
            similarity_score: 0.5,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = JsonIndexAttemptLog::new(temp_dir.path().join("user_audio_index.json"));

        assert_eq!(log.count().await.unwrap(), 0);
        let listed: Vec<Attempt> = log.list_for_proverb(1).try_collect().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_append_then_list_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let log = JsonIndexAttemptLog::new(temp_dir.path().join("user_audio_index.json"));

        let first = attempt(1, "ఆ");
        let other = attempt(2, "ఇ");
        let second = attempt(1, "Could not understand audio");
        for a in [&first, &other, &second] {
            log.append(a).await.unwrap();
        }

        let listed: Vec<Attempt> = log.list_for_proverb(1).try_collect().await.unwrap();
        assert_eq!(listed, vec![first, second]);
        assert_eq!(log.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reappend_same_attempt_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let log = JsonIndexAttemptLog::new(temp_dir.path().join("user_audio_index.json"));

        let a = attempt(1, "ఆ");
        log.append(&a).await.unwrap();
        log.append(&a).await.unwrap();

        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let log = JsonIndexAttemptLog::new(temp_dir.path().join("user_audio_index.json"));

        log.append(&attempt(1, "ఆ")).await.unwrap();
        log.append(&attempt(1, "ఆ")).await.unwrap();

        let files: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_entries_are_read_and_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_audio_index.json");
        std::fs::write(
            &path,
            r#"[
  {
    "proverb_id": 3,
    "proverb_text": "కారు కారు కారుమాటలు",
    "audio_path": "user_audios/user_audio_3_4821.wav",
    "transcription": "Could not understand audio",
    "similarity_score": 0.0
  }
]"#,
        )
        .unwrap();
        let log = JsonIndexAttemptLog::new(&path);

        log.append(&attempt(3, "కారు")).await.unwrap();

        let listed: Vec<Attempt> = log.list_for_proverb(3).try_collect().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].transcription, "Could not understand audio");
        assert_eq!(listed[0].attempt_id, Uuid::from_u128(1));
        assert_eq!(listed[1].transcription, "కారు");

        let raw: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw[0].get("attempt_id").is_none(), "legacy entry must not be rewritten");
    }

    #[tokio::test]
    async fn test_unwritable_location_is_persistence_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        std::fs::write(&blocker, "file").unwrap();
        let log = JsonIndexAttemptLog::new(blocker.join("user_audio_index.json"));

        let result = log.append(&attempt(1, "ఆ")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("user_audio_index.json");
        std::fs::write(&path, r#"{"not": "a list"}"#).unwrap();
        let log = JsonIndexAttemptLog::new(&path);

        assert!(matches!(log.count().await, Err(PersistenceError::Corrupt(_))));
        assert!(log.append(&attempt(1, "ఆ")).await.is_err());
    }
}
