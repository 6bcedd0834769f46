//! Application configuration.
//!
//! Settings come from the environment (and a `.env` file when present) and
//! end up in a single `Config` that the command handlers share.

use std::env;
use std::path::PathBuf;

use secrecy::SecretString;
use tracing::Level;
use tutor_core::tutor::{DEFAULT_BASE_URL, DEFAULT_FAST_MODEL, DEFAULT_LESSON_MODEL};

// --- Audio constants ---

/// Samples per microphone frame sent to the Live API (at 16 kHz).
pub const INPUT_FRAME_SIZE: usize = 4096;
/// Buffer size requested from the input device.
pub const INPUT_CHUNK_SIZE: usize = 1024;
/// Buffer size requested from the output device.
pub const OUTPUT_CHUNK_SIZE: usize = 1024;
/// Input chunk size of the playback resampler, in 24 kHz samples.
pub const OUTPUT_RESAMPLE_CHUNK: usize = 480;
/// How much speech the playback ring buffer can hold.
pub const OUTPUT_BUFFER_SECS: usize = 60;

pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-09-2025";
pub const DEFAULT_LIVE_VOICE: &str = "Zephyr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorProvider {
    Gemini,
    Offline,
}

#[derive(Debug)]
pub struct Config {
    pub provider: TutorProvider,
    pub api_key: Option<SecretString>,
    pub lesson_model: String,
    pub fast_model: String,
    pub live_model: String,
    pub live_voice: String,
    pub base_url: String,
    pub data_dir: PathBuf,
    pub prompts_dir: Option<PathBuf>,
    pub log_level: Level,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid log level provided for RUST_LOG: {0}")]
    InvalidLogLevel(String),
    #[error("Unknown TUTOR_PROVIDER '{0}'. Expected 'gemini' or 'offline'.")]
    InvalidProvider(String),
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    // *   `TUTOR_PROVIDER`: "gemini" (default) or "offline".
    // *   `GEMINI_API_KEY`: Gemini key, `API_KEY` is accepted as a fallback. Required for gemini.
    // *   `LESSON_MODEL`, `FAST_MODEL`, `LIVE_MODEL`, `LIVE_VOICE`: model and voice overrides.
    // *   `GEMINI_BASE_URL`: REST endpoint; the Live socket uses the same host.
    // *   `TUTOR_DATA_DIR`: where lesson history is kept.
    // *   `PROMPTS_DIR`: optional directory of `<name>.md` prompt overrides.
    // *   `RUST_LOG`: log level, defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("TUTOR_PROVIDER") {
            None => TutorProvider::Gemini,
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "gemini" => TutorProvider::Gemini,
                "offline" => TutorProvider::Offline,
                _ => return Err(ConfigError::InvalidProvider(raw)),
            },
        };

        let api_key = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .map(SecretString::from);

        if provider == TutorProvider::Gemini && api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "GEMINI_API_KEY must be set for gemini provider".to_string(),
            ));
        }

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(log_level_str))?;

        let data_dir = var("TUTOR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Ok(Self {
            provider,
            api_key,
            lesson_model: var("LESSON_MODEL").unwrap_or_else(|| DEFAULT_LESSON_MODEL.to_string()),
            fast_model: var("FAST_MODEL").unwrap_or_else(|| DEFAULT_FAST_MODEL.to_string()),
            live_model: var("LIVE_MODEL").unwrap_or_else(|| DEFAULT_LIVE_MODEL.to_string()),
            live_voice: var("LIVE_VOICE").unwrap_or_else(|| DEFAULT_LIVE_VOICE.to_string()),
            base_url: var("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            data_dir,
            prompts_dir: var("PROMPTS_DIR").map(PathBuf::from),
            log_level,
        })
    }

    /// WebSocket origin for the Live API, derived from the REST base URL.
    pub fn live_base_url(&self) -> String {
        if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        }
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "lexi", "english-tutor")
        .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}
