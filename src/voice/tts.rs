//! Text-to-speech (TTS) processing

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Synthesizer, decode_audio};
use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Fixed voice parameters applied to every synthesis
#[derive(Debug, Clone)]
pub struct VoiceParams {
    pub language_code: String,
    /// Provider voice name (e.g. "en-US-Neural2-F", "nova")
    pub name: String,
    /// SSML gender ("FEMALE", "MALE", "NEUTRAL")
    pub gender: String,
    pub speaking_rate: f64,
    pub pitch: f64,
    pub volume_gain_db: f64,
}

impl From<&VoiceConfig> for VoiceParams {
    fn from(voice: &VoiceConfig) -> Self {
        Self {
            language_code: voice.language_code.clone(),
            name: voice.tts_voice.clone(),
            gender: voice.tts_gender.to_uppercase(),
            speaking_rate: voice.speaking_rate,
            pitch: voice.pitch,
            volume_gain_db: voice.volume_gain_db,
        }
    }
}

/// TTS provider backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    Google,
    OpenAI,
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: VoiceParams,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance using Google Cloud Text-to-Speech
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_google(api_key: String, voice: VoiceParams, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Google API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            voice,
            model: String::new(),
            provider: TtsProvider::Google,
        })
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: VoiceParams, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            voice,
            model: "tts-1".to_string(),
            provider: TtsProvider::OpenAI,
        })
    }

    /// Build the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or its key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys, timeout: Duration) -> Result<Self> {
        let mut params = VoiceParams::from(voice);
        match voice.tts_provider.to_lowercase().as_str() {
            "google" => Self::new_google(keys.google.clone().unwrap_or_default(), params, timeout),
            "openai" => {
                // Google voice names ("en-US-Neural2-F") are meaningless to OpenAI
                if params.name.contains('-') {
                    params.name = "nova".to_string();
                }
                Self::new_openai(keys.openai.clone().unwrap_or_default(), params, timeout)
            }
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }

    /// Synthesize using Google Cloud Text-to-Speech
    async fn synthesize_google(&self, text: &str) -> Result<Vec<u8>> {
        let request = google_request(text, &self.voice);

        let response = self
            .client
            .post(GOOGLE_TTS_URL)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let result: GoogleSynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Tts(format!("unreadable Google TTS response: {e}")))?;

        decode_audio(&result.audio_content)
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice.name,
            speed: self.voice.speaking_rate,
        };

        let response = self
            .client
            .post(OPENAI_TTS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl Synthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(Error::Tts("refusing to synthesize empty text".to_string()));
        }

        tracing::debug!(chars = text.len(), provider = self.name(), "starting synthesis");

        let audio = match self.provider {
            TtsProvider::Google => self.synthesize_google(text).await?,
            TtsProvider::OpenAI => self.synthesize_openai(text).await?,
        };

        if audio.is_empty() {
            return Err(Error::Tts("provider returned no audio".to_string()));
        }

        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        match self.provider {
            TtsProvider::Google => "google-tts",
            TtsProvider::OpenAI => "openai-tts",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSynthesizeRequest<'a> {
    input: GoogleInput<'a>,
    voice: GoogleVoice<'a>,
    audio_config: GoogleAudioConfig,
}

#[derive(Serialize)]
struct GoogleInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVoice<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

fn google_request<'a>(text: &'a str, voice: &'a VoiceParams) -> GoogleSynthesizeRequest<'a> {
    GoogleSynthesizeRequest {
        input: GoogleInput { text },
        voice: GoogleVoice {
            language_code: &voice.language_code,
            name: &voice.name,
            ssml_gender: &voice.gender,
        },
        audio_config: GoogleAudioConfig {
            audio_encoding: "MP3",
            speaking_rate: voice.speaking_rate,
            pitch: voice.pitch,
            volume_gain_db: voice.volume_gain_db,
        },
    }
}
