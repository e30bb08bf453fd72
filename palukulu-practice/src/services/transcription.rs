//! Speech transcription boundary
//!
//! [`TranscriptionService`] turns a recording into a [`Transcription`]. Two
//! non-success outcomes are values, not errors: unintelligible audio and a
//! rejected/failed service request. They are scored and logged with the
//! legacy placeholder text from [`Transcription::into_text`]. Anything else is
//! a [`TranscriptionError`] and nothing gets logged.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Logged text for audio the recognizer could not understand
pub const UNINTELLIGIBLE_TEXT: &str = "Could not understand audio";

/// Logged prefix for a failed recognition request
pub const REQUEST_ERROR_PREFIX: &str = "Recognition request error; ";

const USER_AGENT: &str = concat!("palukulu/", env!("CARGO_PKG_VERSION"));

/// Outcome of a transcription call that reached a recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcription {
    Recognized(String),
    Unintelligible,
    ServiceError(String),
}

impl Transcription {
    /// Text stored in the attempt log
    pub fn into_text(self) -> String {
        match self {
            Transcription::Recognized(text) => text,
            Transcription::Unintelligible => UNINTELLIGIBLE_TEXT.to_string(),
            Transcription::ServiceError(detail) => format!("{}{}", REQUEST_ERROR_PREFIX, detail),
        }
    }

    /// Short label for structured logs
    pub fn outcome(&self) -> &'static str {
        match self {
            Transcription::Recognized(_) => "recognized",
            Transcription::Unintelligible => "unintelligible",
            Transcription::ServiceError(_) => "service_error",
        }
    }
}

/// Hard transcription failures
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("No audio supplied")]
    EmptyAudio,

    #[error("Invalid recognizer response: {0}")]
    InvalidResponse(String),

    #[error("Client setup failed: {0}")]
    Client(String),

    #[error("Transcription failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Transcribe `audio` in the given BCP-47 language
    async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
    ) -> Result<Transcription, TranscriptionError>;
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

impl RecognizeResponse {
    /// Best alternative of every result, joined
    fn transcript(&self) -> String {
        self.results
            .iter()
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Google Cloud Speech-to-Text (`v1/speech:recognize`) client
///
/// WAV and FLAC headers carry encoding and sample rate, so only the language
/// is sent in the recognition config.
pub struct GoogleSpeechClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleSpeechClient {
    pub fn new(endpoint: String, api_key: String) -> Result<Self, TranscriptionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TranscriptionError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TranscriptionService for GoogleSpeechClient {
    fn provider_name(&self) -> &'static str {
        "google-speech"
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
    ) -> Result<Transcription, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let request = RecognizeRequest {
            config: RecognitionConfig {
                language_code: language,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(audio),
            },
        };

        tracing::debug!(
            bytes = audio.len(),
            language = language,
            "Sending recognition request"
        );

        let response = match self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Recognition request could not be sent");
                return Ok(Transcription::ServiceError(e.without_url().to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Recognition request rejected");
            return Ok(Transcription::ServiceError(format!(
                "recognition request failed with status {}",
                status
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        let transcript = parsed.transcript();
        if transcript.is_empty() {
            Ok(Transcription::Unintelligible)
        } else {
            Ok(Transcription::Recognized(transcript))
        }
    }
}
