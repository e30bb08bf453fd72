//! Text-to-speech for proverb playback
//!
//! Uses the Google Translate TTS endpoint, which accepts at most 100
//! characters per request. Longer text is split on whitespace and the MP3
//! chunks are concatenated; MP3 frames play back fine when joined.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ServiceError;

const USER_AGENT: &str = concat!("palukulu/", env!("CARGO_PKG_VERSION"));

/// Per-request character limit of the TTS endpoint
pub const MAX_CHUNK_CHARS: usize = 100;

#[async_trait]
pub trait SynthesisService: Send + Sync {
    /// MP3 audio for `text`
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Split into chunks of at most `max_chars` characters
///
/// Breaks on whitespace where possible; a single word longer than the limit
/// is cut at character boundaries.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub struct GoogleTranslateTts {
    http_client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslateTts {
    pub fn new(endpoint: String) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        index: usize,
        total: usize,
    ) -> Result<Vec<u8>, ServiceError> {
        let len = chunk.chars().count().to_string();
        let idx = index.to_string();
        let total = total.to_string();

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", chunk),
                ("textlen", len.as_str()),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Api(
                status.as_u16(),
                format!("speech chunk {} of {} rejected", index + 1, total),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SynthesisService for GoogleTranslateTts {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, ServiceError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ServiceError::Parse("No text to speak".to_string()));
        }

        tracing::debug!(chunks = chunks.len(), language = language, "Synthesizing speech");

        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, language, index, chunks.len()).await?);
        }
        Ok(audio)
    }
}
