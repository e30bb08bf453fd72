//! Retention of submitted recordings
//!
//! Recordings land in `<root>/user_audios/user_audio_<proverb>_<attempt>.wav`.
//! The bytes are written as received; the format is not inspected.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AudioStore {
    folder: PathBuf,
}

impl AudioStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Where the recording for an attempt is (or will be) stored
    pub fn path_for(&self, proverb_id: i64, attempt_id: Uuid) -> PathBuf {
        self.folder.join(format!(
            "user_audio_{}_{}.wav",
            proverb_id,
            attempt_id.simple()
        ))
    }

    /// Write and fsync the recording
    pub async fn save(&self, path: &Path, audio: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.folder).await?;

        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(audio).await?;
        file.sync_all().await?;

        tracing::debug!(path = %path.display(), bytes = audio.len(), "Recording stored");
        Ok(())
    }

    /// Remove a recording whose attempt was never logged. Missing files are fine.
    pub async fn discard(&self, path: &Path) -> std::io::Result<()> {
        match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
