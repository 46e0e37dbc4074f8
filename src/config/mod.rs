//! Configuration management for Haven gateway
//!
//! Values resolve env > TOML file > default.

pub mod file;

use std::time::Duration;

use file::HavenConfigFile;

/// Haven gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Language model configuration
    pub llm: LlmConfig,

    /// Crisis detection and alerting
    pub safety: SafetyConfig,

    /// Budget for each external provider call
    pub provider_timeout: Duration,

    /// Trailing dashboard window in days
    pub dashboard_window_days: i64,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,

    /// Global requests-per-minute cap (`None` disables rate limiting)
    pub rate_limit_rpm: Option<u32>,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Google API key (Speech, Text-to-Speech, Generative Language)
    pub google: Option<String>,

    /// `OpenAI` API key (optional Whisper and TTS)
    pub openai: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("google", &self.google.as_ref().map(|_| "<redacted>"))
            .field("openai", &self.openai.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT provider ("google" or "whisper")
    pub stt_provider: String,

    /// STT model; empty lets the provider choose
    pub stt_model: String,

    /// BCP-47 language code for recognition and synthesis
    pub language_code: String,

    /// Recognition audio encoding (Google enum name)
    pub encoding: String,

    /// Recognition sample rate
    pub sample_rate_hertz: u32,

    /// TTS provider ("google" or "openai")
    pub tts_provider: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// SSML gender ("FEMALE", "MALE", "NEUTRAL")
    pub tts_gender: String,

    /// Speaking rate multiplier (0.25 to 4.0)
    pub speaking_rate: f64,

    /// Pitch in semitones (-20.0 to 20.0)
    pub pitch: f64,

    /// Volume gain in dB (-96.0 to 16.0)
    pub volume_gain_db: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_provider: "google".to_string(),
            stt_model: String::new(),
            language_code: "en-US".to_string(),
            encoding: "WEBM_OPUS".to_string(),
            sample_rate_hertz: 48_000,
            tts_provider: "google".to_string(),
            tts_voice: "en-US-Neural2-F".to_string(),
            tts_gender: "FEMALE".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
            volume_gain_db: 0.0,
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Sampling temperature for replies
    pub temperature: f32,

    /// Output token cap for replies
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 256,
        }
    }
}

/// Crisis detection configuration
#[derive(Debug, Clone, Default)]
pub struct SafetyConfig {
    /// Keywords appended to the built-in list
    pub extra_keywords: Vec<String>,

    /// Operator webhook for crisis incidents
    pub alert_webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from the environment and the config file
    #[must_use]
    pub fn load() -> Self {
        Self::resolve(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an env lookup
    ///
    /// Env values win over file values, which win over defaults.
    #[must_use]
    pub fn resolve(fc: HavenConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let parse_list = |s: String| -> Vec<String> {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        };

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            google: env("GOOGLE_API_KEY").or(fc.api_keys.google),
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
        };

        // API server config (env > toml > default)
        let api_server = ApiServerConfig {
            port: env("HAVEN_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(8000),
            cors_origins: env("HAVEN_CORS_ORIGINS")
                .map(parse_list)
                .or(fc.server.cors_origins)
                .unwrap_or_default(),
            rate_limit_rpm: env("HAVEN_RATE_LIMIT_RPM")
                .and_then(|s| s.parse().ok())
                .or(fc.server.rate_limit_rpm)
                .filter(|rpm| *rpm > 0),
        };

        // Voice config (env > toml > default)
        let default_voice = VoiceConfig::default();
        let fv = fc.voice;
        let voice = VoiceConfig {
            stt_provider: env("HAVEN_STT_PROVIDER")
                .or(fv.stt_provider)
                .unwrap_or(default_voice.stt_provider),
            stt_model: env("HAVEN_STT_MODEL")
                .or(fv.stt_model)
                .unwrap_or(default_voice.stt_model),
            language_code: env("HAVEN_LANGUAGE")
                .or(fv.language_code)
                .unwrap_or(default_voice.language_code),
            encoding: fv.encoding.unwrap_or(default_voice.encoding),
            sample_rate_hertz: fv
                .sample_rate_hertz
                .unwrap_or(default_voice.sample_rate_hertz),
            tts_provider: env("HAVEN_TTS_PROVIDER")
                .or(fv.tts_provider)
                .unwrap_or(default_voice.tts_provider),
            tts_voice: env("HAVEN_TTS_VOICE")
                .or(fv.tts_voice)
                .unwrap_or(default_voice.tts_voice),
            tts_gender: fv.tts_gender.unwrap_or(default_voice.tts_gender),
            speaking_rate: fv
                .speaking_rate
                .unwrap_or(default_voice.speaking_rate)
                .clamp(0.25, 4.0),
            pitch: fv.pitch.unwrap_or(default_voice.pitch).clamp(-20.0, 20.0),
            volume_gain_db: fv
                .volume_gain_db
                .unwrap_or(default_voice.volume_gain_db)
                .clamp(-96.0, 16.0),
        };

        let default_llm = LlmConfig::default();
        let llm = LlmConfig {
            model: env("HAVEN_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or(default_llm.model),
            temperature: fc.llm.temperature.unwrap_or(default_llm.temperature),
            max_output_tokens: fc
                .llm
                .max_output_tokens
                .unwrap_or(default_llm.max_output_tokens),
        };

        let safety = SafetyConfig {
            extra_keywords: env("HAVEN_CRISIS_KEYWORDS")
                .map(parse_list)
                .or(fc.safety.extra_keywords)
                .unwrap_or_default(),
            alert_webhook_url: env("HAVEN_ALERT_WEBHOOK_URL").or(fc.safety.alert_webhook_url),
        };

        let timeout_secs = env("HAVEN_PROVIDER_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .or(fc.server.provider_timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(15);

        let dashboard_window_days = env("HAVEN_DASHBOARD_WINDOW_DAYS")
            .and_then(|s| s.parse().ok())
            .or(fc.dashboard.window_days)
            .filter(|days| *days > 0)
            .unwrap_or(7);

        Self {
            api_server,
            api_keys,
            voice,
            llm,
            safety,
            provider_timeout: Duration::from_secs(timeout_secs),
            dashboard_window_days,
        }
    }
}
