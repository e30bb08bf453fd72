//! Practice sessions
//!
//! A [`Session`] is an explicit value owned by the caller (the HTTP layer
//! keeps one per browser session). [`SessionController`] drives it through
//! `AwaitingSubmission → Scoring → AwaitingSubmission`: transcribe, score,
//! store the recording, append the attempt.

use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::attempt_log::{Attempt, AttemptLog};
use crate::audio_store::AudioStore;
use crate::catalog::{Proverb, ProverbCatalog};
use crate::error::{PersistenceError, PracticeError};
use crate::scorer::SimilarityScorer;
use crate::services::{TranscriptionError, TranscriptionService};

pub const DEFAULT_LANGUAGE: &str = "te-IN";
pub const DEFAULT_TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingSubmission,
    Scoring,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub current_proverb: Proverb,
    state: SessionState,
}

impl Session {
    pub(crate) fn new(proverb: Proverb) -> Self {
        Self {
            id: Uuid::new_v4(),
            current_proverb: proverb,
            state: SessionState::AwaitingSubmission,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

/// What the user sees after a submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptResult {
    pub attempt_id: Uuid,
    pub proverb_id: i64,
    pub transcription: String,
    pub similarity_score: f64,
    pub audio_reference: String,
}

/// Puts the session back into `AwaitingSubmission` however `submit` exits,
/// including when its future is dropped mid-transcription.
struct ScoringGuard<'a> {
    session: &'a mut Session,
}

impl<'a> ScoringGuard<'a> {
    fn enter(session: &'a mut Session) -> Self {
        session.state = SessionState::Scoring;
        Self { session }
    }
}

impl Drop for ScoringGuard<'_> {
    fn drop(&mut self) {
        self.session.state = SessionState::AwaitingSubmission;
    }
}

pub struct SessionController {
    catalog: Arc<ProverbCatalog>,
    transcriber: Arc<dyn TranscriptionService>,
    log: Arc<dyn AttemptLog>,
    audio_store: AudioStore,
    scorer: SimilarityScorer,
    language: String,
    timeout: Duration,
}

impl SessionController {
    pub fn new(
        catalog: Arc<ProverbCatalog>,
        transcriber: Arc<dyn TranscriptionService>,
        log: Arc<dyn AttemptLog>,
        audio_store: AudioStore,
    ) -> Self {
        Self {
            catalog,
            transcriber,
            log,
            audio_store,
            scorer: SimilarityScorer::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TRANSCRIPTION_TIMEOUT,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &Arc<ProverbCatalog> {
        &self.catalog
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// New session on a random proverb
    pub fn start(&self) -> Result<Session, PracticeError> {
        let session = Session::new(self.catalog.pick_random()?);
        tracing::info!(
            session_id = %session.id,
            proverb_id = session.current_proverb.id,
            "Practice session started"
        );
        Ok(session)
    }

    /// Score one recording of the session's current proverb
    pub async fn submit(
        &self,
        session: &mut Session,
        audio: &[u8],
    ) -> Result<AttemptResult, PracticeError> {
        if session.state != SessionState::AwaitingSubmission {
            return Err(PracticeError::SubmissionInProgress);
        }

        let guard = ScoringGuard::enter(session);
        let proverb = guard.session.current_proverb.clone();
        let session_id = guard.session.id;

        let transcription = if audio.is_empty() {
            Err(TranscriptionError::EmptyAudio.to_string())
        } else {
            match tokio::time::timeout(
                self.timeout,
                self.transcriber.transcribe(audio, &self.language),
            )
            .await
            {
                Ok(Ok(transcription)) => Ok(transcription),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(format!(
                    "no response within {}s",
                    self.timeout.as_secs_f64()
                )),
            }
        };

        let transcription = match transcription {
            Ok(t) => t,
            Err(detail) => {
                tracing::warn!(
                    session_id = %session_id,
                    proverb_id = proverb.id,
                    provider = self.transcriber.provider_name(),
                    error = %detail,
                    "Transcription failed, attempt not logged"
                );
                return Err(PracticeError::TranscriptionUnavailable(detail));
            }
        };

        let outcome = transcription.outcome();
        let text = transcription.into_text();
        let similarity_score = self.scorer.score(&proverb.original_text, &text);

        let attempt_id = Uuid::new_v4();
        let audio_path = self.audio_store.path_for(proverb.id, attempt_id);
        let attempt = Attempt {
            attempt_id,
            proverb_id: proverb.id,
            proverb_text: proverb.original_text.clone(),
            audio_reference: audio_path.to_string_lossy().into_owned(),
            transcription: text,
            similarity_score,
            created_at: Utc::now(),
        };

        let result = AttemptResult {
            attempt_id,
            proverb_id: proverb.id,
            transcription: attempt.transcription.clone(),
            similarity_score,
            audio_reference: attempt.audio_reference.clone(),
        };

        if let Err(first) = self.persist(&audio_path, audio, &attempt).await {
            tracing::warn!(
                attempt_id = %attempt_id,
                log = self.log.name(),
                error = %first,
                "Saving attempt failed, retrying once"
            );
            if let Err(source) = self.persist(&audio_path, audio, &attempt).await {
                tracing::warn!(
                    attempt_id = %attempt_id,
                    log = self.log.name(),
                    error = %source,
                    "Attempt scored but not saved"
                );
                if let Err(e) = self.audio_store.discard(&audio_path).await {
                    tracing::warn!(
                        path = %audio_path.display(),
                        error = %e,
                        "Could not remove recording of unsaved attempt"
                    );
                }
                return Err(PracticeError::Persistence { result, source });
            }
        }

        tracing::info!(
            session_id = %session_id,
            proverb_id = proverb.id,
            attempt_id = %attempt_id,
            score = similarity_score,
            outcome = outcome,
            "Attempt scored"
        );

        drop(guard);
        Ok(result)
    }

    /// Move the session to another random proverb
    pub fn next(&self, session: &mut Session) -> Result<Proverb, PracticeError> {
        let proverb = self.catalog.pick_random()?;
        session.current_proverb = proverb.clone();
        session.state = SessionState::AwaitingSubmission;

        tracing::debug!(session_id = %session.id, proverb_id = proverb.id, "Next proverb");
        Ok(proverb)
    }

    /// Recording first, so a logged attempt always has its audio on disk
    async fn persist(
        &self,
        audio_path: &Path,
        audio: &[u8],
        attempt: &Attempt,
    ) -> Result<(), PersistenceError> {
        self.audio_store.save(audio_path, audio).await?;
        self.log.append(attempt).await
    }
}
