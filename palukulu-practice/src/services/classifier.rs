//! Zero-shot text classification
//!
//! Tags a proverb with themes, region and difficulty using a hosted NLI model
//! (`facebook/bart-large-mnli` by default) through the Hugging Face Inference
//! API. Only labels scoring above the configured threshold are returned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ServiceError;

const USER_AGENT: &str = concat!("palukulu/", env!("CARGO_PKG_VERSION"));

/// Labels used when the caller supplies none
pub const DEFAULT_LABELS: &[&str] = &[
    "wisdom",
    "life",
    "humor",
    "education",
    "motivation",
    "child",
    "region:Andhra Pradesh",
    "region:Telangana",
    "difficulty:easy",
    "difficulty:medium",
    "difficulty:hard",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[async_trait]
pub trait ClassifierService: Send + Sync {
    /// Labels above threshold, highest score first
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<LabelScore>, ServiceError>;
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

/// The Inference API has returned both shapes over time
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Columns {
        labels: Vec<String>,
        scores: Vec<f64>,
    },
    Pairs(Vec<LabelScore>),
}

impl ZeroShotResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ZeroShotResponse::Columns { labels, scores } => labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| LabelScore { label, score })
                .collect(),
            ZeroShotResponse::Pairs(pairs) => pairs,
        }
    }
}

/// Keep labels strictly above `threshold`, best first
fn above_threshold(mut scores: Vec<LabelScore>, threshold: f64) -> Vec<LabelScore> {
    scores.retain(|s| s.score > threshold);
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    scores
}

pub struct HuggingFaceClassifier {
    http_client: reqwest::Client,
    model_url: String,
    api_token: String,
    threshold: f64,
}

impl HuggingFaceClassifier {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_token: String,
        threshold: f64,
    ) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            model_url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            api_token,
            threshold,
        })
    }
}

#[async_trait]
impl ClassifierService for HuggingFaceClassifier {
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<LabelScore>, ServiceError> {
        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
            },
        };

        tracing::debug!(labels = labels.len(), "Classifying text");

        let response = self
            .http_client
            .post(&self.model_url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api(status.as_u16(), body));
        }

        let parsed: ZeroShotResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        Ok(above_threshold(parsed.into_scores(), self.threshold))
    }
}
