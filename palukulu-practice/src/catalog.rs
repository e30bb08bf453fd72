//! Proverb catalog
//!
//! Loaded once at startup from a JSON array of objects:
//!
//! ```json
//! [{"Original": "ఆకలి రుచి ఎరుగదు", "English": "Hunger knows no taste"}]
//! ```
//!
//! Ids are the 1-based position in the file, so reloading an unchanged file
//! always yields the same ids. Malformed entries fail the whole load.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::CatalogError;

/// One practice proverb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proverb {
    pub id: i64,
    pub original_text: String,
    pub english_text: Option<String>,
}

/// On-disk shape of a catalog entry; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "Original", alias = "original")]
    original: String,
    #[serde(rename = "English", alias = "english", default)]
    english: Option<String>,
}

/// Ordered, immutable proverb collection
#[derive(Debug, Clone, Default)]
pub struct ProverbCatalog {
    proverbs: Vec<Proverb>,
}

impl ProverbCatalog {
    /// Load the catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Load(format!("Read {} failed: {}", path.display(), e))
        })?;

        let catalog = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            proverbs = catalog.len(),
            "Proverb catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse catalog JSON text
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let document: Value = serde_json::from_str(content)
            .map_err(|e| CatalogError::Load(format!("Invalid JSON: {}", e)))?;

        let entries = match document {
            Value::Array(entries) => entries,
            other => {
                return Err(CatalogError::Load(format!(
                    "Expected a list of proverb objects, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut proverbs = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let position = index + 1;
            if !entry.is_object() {
                return Err(CatalogError::Load(format!(
                    "Entry {} is {}, expected an object",
                    position,
                    json_kind(&entry)
                )));
            }

            let entry: CatalogEntry = serde_json::from_value(entry)
                .map_err(|e| CatalogError::Load(format!("Entry {}: {}", position, e)))?;

            proverbs.push(Proverb {
                id: position as i64,
                original_text: entry.original,
                english_text: entry.english,
            });
        }

        Ok(Self { proverbs })
    }

    pub fn from_proverbs(proverbs: Vec<Proverb>) -> Self {
        Self { proverbs }
    }

    pub fn len(&self) -> usize {
        self.proverbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proverbs.is_empty()
    }

    pub fn proverbs(&self) -> &[Proverb] {
        &self.proverbs
    }

    pub fn get(&self, id: i64) -> Option<&Proverb> {
        if id < 1 {
            return None;
        }
        self.proverbs.get((id - 1) as usize)
    }

    /// Uniform random choice; repeats are allowed
    pub fn pick_random(&self) -> Result<Proverb, CatalogError> {
        self.proverbs
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(CatalogError::Empty)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
