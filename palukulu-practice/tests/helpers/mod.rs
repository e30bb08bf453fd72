//! Test Helper Utilities
//!
//! Shared fakes and fixtures for palukulu-practice integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod fakes;

#[allow(unused_imports)]
pub use audio_generator::generate_test_wav;
#[allow(unused_imports)]
pub use fakes::{FakeClassifier, FakeSynthesis, FixedTranscriber, SlowTranscriber};

use palukulu_practice::catalog::ProverbCatalog;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Open a fresh database with the full schema under `dir`
pub async fn create_test_db(dir: &Path) -> SqlitePool {
    palukulu_common::db::init_database_pool(&dir.join("palukulu.db"))
        .await
        .expect("Failed to create test database")
}

/// Catalog holding only `ఆ`
pub fn single_proverb_catalog() -> Arc<ProverbCatalog> {
    Arc::new(ProverbCatalog::from_json(r#"[{"Original": "ఆ"}]"#).expect("valid catalog"))
}

pub fn sample_catalog() -> Arc<ProverbCatalog> {
    Arc::new(
        ProverbCatalog::from_json(
            r#"[
                {"Original": "ఆకలి రుచి ఎరుగదు", "English": "Hunger knows no taste"},
                {"Original": "కోటి విద్యలూ కూటి కొరకే"},
                {"Original": "అడగనిదే అమ్మైనా పెట్టదు", "English": null}
            ]"#,
        )
        .expect("valid catalog"),
    )
}
