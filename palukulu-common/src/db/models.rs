//! Contribution records
//!
//! Plain data; relationships are followed through explicit queries by
//! `contributor_id`, never through embedded object graphs.

use super::JsonList;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A proverb submitted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributedProverb {
    pub id: i64,
    pub text: String,
    pub contributor_id: i64,
    pub meaning: Option<String>,
    pub region: Option<String>,
    pub tags: JsonList,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProverb {
    pub text: String,
    pub contributor_id: i64,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TongueTwister {
    pub id: i64,
    pub text: String,
    pub contributor_id: i64,
    pub region: Option<String>,
    pub audio_url: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTongueTwister {
    pub text: String,
    pub contributor_id: i64,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}
