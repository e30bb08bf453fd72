//! Fake collaborators

use async_trait::async_trait;
use futures::stream::BoxStream;
use palukulu_practice::attempt_log::{Attempt, AttemptLog};
use palukulu_practice::error::{PersistenceError, ServiceError};
use palukulu_practice::services::{
    ClassifierService, LabelScore, SynthesisService, Transcription, TranscriptionError,
    TranscriptionService,
};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Returns the same outcome for every recording
pub struct FixedTranscriber {
    outcome: Result<Transcription, String>,
    calls: AtomicUsize,
}

impl FixedTranscriber {
    pub fn recognized(text: &str) -> Self {
        Self::new(Ok(Transcription::Recognized(text.to_string())))
    }

    pub fn unintelligible() -> Self {
        Self::new(Ok(Transcription::Unintelligible))
    }

    pub fn service_error(detail: &str) -> Self {
        Self::new(Ok(Transcription::ServiceError(detail.to_string())))
    }

    pub fn failing(detail: &str) -> Self {
        Self::new(Err(detail.to_string()))
    }

    fn new(outcome: Result<Transcription, String>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptionService for FixedTranscriber {
    fn provider_name(&self) -> &'static str {
        "fixed"
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        _language: &str,
    ) -> Result<Transcription, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }
        self.outcome.clone().map_err(TranscriptionError::Failed)
    }
}

/// Recognizes `text` after a delay
pub struct SlowTranscriber {
    pub delay: Duration,
    pub text: String,
}

#[async_trait]
impl TranscriptionService for SlowTranscriber {
    fn provider_name(&self) -> &'static str {
        "slow"
    }

    async fn transcribe(
        &self,
        _audio: &[u8],
        _language: &str,
    ) -> Result<Transcription, TranscriptionError> {
        tokio::time::sleep(self.delay).await;
        Ok(Transcription::Recognized(self.text.clone()))
    }
}

/// Wraps a real log and fails the first `failures` appends
pub struct FlakyLog {
    inner: Arc<dyn AttemptLog>,
    failures_left: AtomicU32,
}

impl FlakyLog {
    pub fn new(inner: Arc<dyn AttemptLog>, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl AttemptLog for FlakyLog {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn append(&self, attempt: &Attempt) -> Result<(), PersistenceError> {
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(PersistenceError::Busy("injected failure".to_string()));
        }
        self.inner.append(attempt).await
    }

    fn list_for_proverb(
        &self,
        proverb_id: i64,
    ) -> BoxStream<'_, Result<Attempt, PersistenceError>> {
        self.inner.list_for_proverb(proverb_id)
    }

    async fn count(&self) -> Result<u64, PersistenceError> {
        self.inner.count().await
    }
}

pub struct FakeSynthesis;

pub const FAKE_MP3: &[u8] = b"ID3\x03\x00\x00\x00\x00\x00\x00fake_mp3_data";

#[async_trait]
impl SynthesisService for FakeSynthesis {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<Vec<u8>, ServiceError> {
        if text.is_empty() {
            return Err(ServiceError::Parse("No text to speak".to_string()));
        }
        Ok(FAKE_MP3.to_vec())
    }
}

/// Scores the first two requested labels 0.6 and 0.4
pub struct FakeClassifier;

#[async_trait]
impl ClassifierService for FakeClassifier {
    async fn classify(
        &self,
        _text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ServiceError> {
        Ok(labels
            .iter()
            .take(2)
            .enumerate()
            .map(|(i, label)| LabelScore {
                label: label.clone(),
                score: 0.6 - 0.2 * i as f64,
            })
            .collect())
    }
}
