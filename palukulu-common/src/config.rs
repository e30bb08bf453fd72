//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from a TOML file. Everything in it is optional;
//! missing values fall back to the compiled defaults below. The root folder
//! follows a four-tier priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`PALUKULU_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PALUKULU_ROOT_FOLDER";

/// Default HTTP port for the practice service
pub const DEFAULT_PORT: u16 = 5730;

const DATABASE_FILE: &str = "palukulu.db";
const AUDIO_FOLDER: &str = "user_audios";
const CATALOG_FILE: &str = "proverbs.json";
const LEGACY_INDEX_FILE: &str = "user_audio_index.json";

/// Bootstrap configuration loaded from TOML
///
/// Cannot change while running; restart to pick up edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the database, recordings and catalog
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port (default 5730)
    #[serde(default)]
    pub port: Option<u16>,

    /// Proverb catalog file (default `<root>/proverbs.json`)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub practice: PracticeConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Speech recognition service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// API key for the speech endpoint
    #[serde(default)]
    pub api_key: Option<String>,

    /// BCP-47 language code sent with every recognition request
    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            language_code: default_language_code(),
            endpoint: default_speech_endpoint(),
        }
    }
}

/// Zero-shot text classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Inference API token; text analysis is disabled without one
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_classifier_model")]
    pub model: String,

    #[serde(default = "default_classifier_endpoint")]
    pub endpoint: String,

    /// Labels scoring at or below this are dropped
    #[serde(default = "default_classifier_threshold")]
    pub threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            model: default_classifier_model(),
            endpoint: default_classifier_endpoint(),
            threshold: default_classifier_threshold(),
        }
    }
}

/// Text-to-speech settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    #[serde(default = "default_synthesis_language")]
    pub language: String,

    #[serde(default = "default_synthesis_endpoint")]
    pub endpoint: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            language: default_synthesis_language(),
            endpoint: default_synthesis_endpoint(),
        }
    }
}

/// Practice session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeConfig {
    /// Upper bound on one transcription call
    #[serde(default = "default_transcription_timeout_secs")]
    pub transcription_timeout_secs: u64,

    /// Largest accepted recording upload
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub attempt_log: AttemptLogBackend,

    /// Sessions untouched for this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    /// Live session cap; the least recently used session goes first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            transcription_timeout_secs: default_transcription_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            attempt_log: AttemptLogBackend::default(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Where practice attempts are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptLogBackend {
    /// `attempts` table in the shared SQLite database
    #[default]
    Sqlite,
    /// Legacy `user_audio_index.json` array, rewritten atomically per append
    JsonIndex,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language_code() -> String {
    "te-IN".to_string()
}

fn default_speech_endpoint() -> String {
    "https://speech.googleapis.com/v1/speech:recognize".to_string()
}

fn default_classifier_model() -> String {
    "facebook/bart-large-mnli".to_string()
}

fn default_classifier_endpoint() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_classifier_threshold() -> f64 {
    0.1
}

fn default_synthesis_language() -> String {
    "te".to_string()
}

fn default_synthesis_endpoint() -> String {
    "https://translate.google.com/translate_tts".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_session_idle_secs() -> u64 {
    60 * 60
}

fn default_max_sessions() -> usize {
    1000
}

/// Load the bootstrap TOML configuration
///
/// An explicit path must exist. Without one, the platform default location is
/// tried and a missing file yields the built-in defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Platform config file location (`~/.config/palukulu/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("palukulu").join("config.toml"))
}

/// Resolved root folder and the well-known paths beneath it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFolder {
    path: PathBuf,
}

impl RootFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve following CLI → ENV → TOML → OS default
    pub fn resolve(cli_arg: Option<&Path>, config: &TomlConfig) -> Self {
        if let Some(path) = cli_arg {
            return Self::new(path);
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return Self::new(path);
            }
        }

        if let Some(path) = &config.root_folder {
            return Self::new(path.clone());
        }

        Self::new(default_root_folder())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the root folder and the recordings folder if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.path)?;
        std::fs::create_dir_all(self.audio_folder())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.path.join(DATABASE_FILE)
    }

    pub fn audio_folder(&self) -> PathBuf {
        self.path.join(AUDIO_FOLDER)
    }

    pub fn default_catalog_path(&self) -> PathBuf {
        self.path.join(CATALOG_FILE)
    }

    pub fn legacy_index_path(&self) -> PathBuf {
        self.path.join(LEGACY_INDEX_FILE)
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("palukulu"))
        .unwrap_or_else(|| PathBuf::from("./palukulu_data"))
}
