//! Credential resolution for palukulu-practice
//!
//! API credentials resolve ENV → TOML. When both are set the environment
//! wins and a warning is logged.

use palukulu_common::config::TomlConfig;
use palukulu_common::{Error, Result};
use tracing::{info, warn};

pub const SPEECH_API_KEY_ENV: &str = "PALUKULU_SPEECH_API_KEY";
pub const CLASSIFIER_TOKEN_ENV: &str = "PALUKULU_CLASSIFIER_TOKEN";

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn resolve_credential(label: &str, env_var: &str, toml_value: Option<&String>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_value = toml_value.filter(|k| is_valid_key(k)).cloned();

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment.",
            label
        );
    }

    if let Some(key) = env_value {
        info!("{} loaded from environment variable", label);
        return Some(key);
    }
    if let Some(key) = toml_value {
        info!("{} loaded from TOML config", label);
        return Some(key);
    }
    None
}

/// Speech recognition API key; required to serve practice sessions
pub fn resolve_speech_api_key(toml_config: &TomlConfig) -> Result<String> {
    resolve_credential(
        "Speech API key",
        SPEECH_API_KEY_ENV,
        toml_config.speech.api_key.as_ref(),
    )
    .ok_or_else(|| {
        Error::Config(format!(
            "Speech API key not configured. Please configure using one of:\n\
             1. Environment: {}=your-key-here\n\
             2. TOML config: ~/.config/palukulu/config.toml ([speech] api_key = \"your-key\")\n\
             \n\
             Create a key for the Cloud Speech-to-Text API in the Google Cloud console.",
            SPEECH_API_KEY_ENV
        ))
    })
}

/// Classifier token; text analysis is disabled without one
pub fn resolve_classifier_token(toml_config: &TomlConfig) -> Option<String> {
    let token = resolve_credential(
        "Classifier token",
        CLASSIFIER_TOKEN_ENV,
        toml_config.classifier.api_token.as_ref(),
    );
    if token.is_none() {
        info!("No classifier token configured, text analysis disabled");
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }
}
