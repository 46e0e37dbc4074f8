//! Voice adapters
//!
//! Speech recognition and synthesis are delegated to cloud providers.
//! The pipeline only sees the [`Transcriber`] and [`Synthesizer`] traits.

mod stt;
mod tts;

pub use stt::{RecognitionConfig, SpeechToText};
pub use tts::{TextToSpeech, VoiceParams};

use async_trait::async_trait;
use base64::Engine;

use crate::Result;

/// Transcript text reported when the provider heard nothing
pub const NO_SPEECH_SENTINEL: &str = "[no speech detected]";

/// Encoded audio submitted by a client for one turn
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    /// MIME type as uploaded (e.g. "audio/webm"), if the client sent one
    pub content_type: Option<String>,
}

impl AudioBlob {
    /// Wrap raw bytes with an optional content type
    #[must_use]
    pub const fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    /// Whether the blob carries no audio at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of speech recognition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized speech (never blank)
    Speech(String),
    /// Provider returned no results
    NoSpeech,
}

impl Transcript {
    /// Normalize provider text; blank text means nothing was heard
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            Self::NoSpeech
        } else {
            Self::Speech(text.to_string())
        }
    }

    /// Transcript text, or the sentinel when nothing was heard
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Speech(text) => text,
            Self::NoSpeech => NO_SPEECH_SENTINEL,
        }
    }

    /// Whether any speech was recognized
    #[must_use]
    pub const fn has_speech(&self) -> bool {
        matches!(self, Self::Speech(_))
    }
}

/// Speech-to-text provider
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe one audio blob
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails. An empty result set is
    /// [`Transcript::NoSpeech`], not an error.
    async fn transcribe(&self, audio: &AudioBlob) -> Result<Transcript>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Text-to-speech provider
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize text into encoded audio (MP3)
    ///
    /// # Errors
    ///
    /// Returns error if the provider call fails or returns no audio
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Base64-encode audio for JSON transport
#[must_use]
pub fn encode_audio(audio: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(audio)
}

/// Decode base64 audio received from a provider
///
/// # Errors
///
/// Returns error if the payload is not valid base64
pub fn decode_audio(encoded: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| crate::Error::Malformed(format!("invalid base64 audio: {e}")))
}
