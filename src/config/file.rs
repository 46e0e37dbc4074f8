//! TOML configuration file loading
//!
//! Supports `~/.config/haven/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct HavenConfigFile {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/audio configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Crisis detection and alerting
    #[serde(default)]
    pub safety: SafetyFileConfig,

    /// Dashboard aggregation
    #[serde(default)]
    pub dashboard: DashboardFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// Sampling temperature for reply generation
    pub temperature: Option<f32>,

    /// Output token cap for reply generation
    pub max_output_tokens: Option<u32>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// STT provider ("google" or "whisper")
    pub stt_provider: Option<String>,

    /// STT model (e.g. "latest_short", "whisper-1")
    pub stt_model: Option<String>,

    /// BCP-47 language code (e.g. "en-US")
    pub language_code: Option<String>,

    /// Recognition audio encoding (e.g. "WEBM_OPUS")
    pub encoding: Option<String>,

    /// Recognition sample rate
    pub sample_rate_hertz: Option<u32>,

    /// TTS provider ("google" or "openai")
    pub tts_provider: Option<String>,

    /// TTS voice identifier (e.g. "en-US-Neural2-F")
    pub tts_voice: Option<String>,

    /// SSML gender for Google voices
    pub tts_gender: Option<String>,

    /// Speaking rate multiplier
    pub speaking_rate: Option<f64>,

    /// Pitch in semitones
    pub pitch: Option<f64>,

    /// Volume gain in dB
    pub volume_gain_db: Option<f64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub google: Option<String>,
    pub openai: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Option<Vec<String>>,

    /// Global requests-per-minute cap
    pub rate_limit_rpm: Option<u32>,

    /// Timeout for each external provider call
    pub provider_timeout_secs: Option<u64>,
}

/// Safety configuration
#[derive(Debug, Default, Deserialize)]
pub struct SafetyFileConfig {
    /// Keywords added to the built-in crisis list
    pub extra_keywords: Option<Vec<String>>,

    /// Operator webhook notified on crisis detection
    pub alert_webhook_url: Option<String>,
}

/// Dashboard configuration
#[derive(Debug, Default, Deserialize)]
pub struct DashboardFileConfig {
    /// Trailing window in days
    pub window_days: Option<i64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HavenConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> HavenConfigFile {
    let Some(path) = config_file_path() else {
        return HavenConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load a TOML config file from an explicit path
///
/// Missing or unparseable files fall back to defaults with a warning.
pub fn load_config_file_from(path: &Path) -> HavenConfigFile {
    if !path.exists() {
        return HavenConfigFile::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            HavenConfigFile::default()
        }
    }
}

/// Read and parse a TOML config file
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read and `Error::Toml` if it is not valid
pub fn read_config_file(path: &Path) -> Result<HavenConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/haven/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("haven").join("config.toml"))
}
