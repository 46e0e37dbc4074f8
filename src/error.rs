//! Error types for Haven gateway

use thiserror::Error;

/// Result type alias for Haven operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Haven gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Language model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Provider returned output we could not interpret
    #[error("malformed provider output: {0}")]
    Malformed(String),

    /// External call exceeded its time budget
    #[error("{stage} timed out after {secs}s")]
    Timeout {
        /// Pipeline stage that timed out
        stage: &'static str,
        /// Budget in seconds
        secs: u64,
    },

    /// Alert delivery error
    #[error("alert error: {0}")]
    Alert(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error came from a call that ran out of time
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the provider answered but the answer was unusable
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
