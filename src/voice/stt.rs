//! Speech-to-text (STT) processing

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AudioBlob, Transcriber, Transcript, encode_audio};
use crate::config::{ApiKeys, VoiceConfig};
use crate::{Error, Result};

const GOOGLE_SPEECH_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Fixed recognition parameters sent with every request
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    /// Google encoding enum name (e.g. "WEBM_OPUS", "LINEAR16")
    pub encoding: String,
    pub sample_rate_hertz: u32,
    pub language_code: String,
}

impl From<&VoiceConfig> for RecognitionConfig {
    fn from(voice: &VoiceConfig) -> Self {
        Self {
            encoding: voice.encoding.clone(),
            sample_rate_hertz: voice.sample_rate_hertz,
            language_code: voice.language_code.clone(),
        }
    }
}

/// Request body for Google `speech:recognize`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRecognizeRequest<'a> {
    config: GoogleRecognitionConfig<'a>,
    audio: GoogleRecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleRecognitionConfig<'a> {
    encoding: &'a str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    enable_automatic_punctuation: bool,
}

#[derive(Serialize)]
struct GoogleRecognitionAudio {
    content: String,
}

/// Response from Google `speech:recognize`
///
/// `results` is omitted entirely when no speech was detected.
#[derive(Deserialize)]
struct GoogleRecognizeResponse {
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Deserialize)]
struct GoogleResult {
    #[serde(default)]
    alternatives: Vec<GoogleAlternative>,
}

#[derive(Deserialize)]
struct GoogleAlternative {
    #[serde(default)]
    transcript: String,
}

/// Response from OpenAI Whisper transcription API
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// STT provider backend
#[derive(Clone, Copy, Debug)]
enum SttProvider {
    Google,
    Whisper,
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
    recognition: RecognitionConfig,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create a new STT instance using Google Cloud Speech
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_google(
        api_key: String,
        model: String,
        recognition: RecognitionConfig,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Google API key required for speech recognition".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            recognition,
            provider: SttProvider::Google,
        })
    }

    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        let model = if model.is_empty() {
            "whisper-1".to_string()
        } else {
            model
        };

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            recognition: RecognitionConfig {
                encoding: String::new(),
                sample_rate_hertz: 0,
                language_code: String::new(),
            },
            provider: SttProvider::Whisper,
        })
    }

    /// Build the configured provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unknown or its key is missing
    pub fn from_config(voice: &VoiceConfig, keys: &ApiKeys, timeout: Duration) -> Result<Self> {
        match voice.stt_provider.to_lowercase().as_str() {
            "google" => Self::new_google(
                keys.google.clone().unwrap_or_default(),
                voice.stt_model.clone(),
                RecognitionConfig::from(voice),
                timeout,
            ),
            "whisper" | "openai" => Self::new_whisper(
                keys.openai.clone().unwrap_or_default(),
                voice.stt_model.clone(),
                timeout,
            ),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }

    /// Transcribe using Google Cloud Speech
    async fn transcribe_google(&self, audio: &AudioBlob) -> Result<Transcript> {
        tracing::debug!(audio_bytes = audio.bytes.len(), "starting Google transcription");

        let request = GoogleRecognizeRequest {
            config: GoogleRecognitionConfig {
                encoding: &self.recognition.encoding,
                sample_rate_hertz: self.recognition.sample_rate_hertz,
                language_code: &self.recognition.language_code,
                model: (!self.model.is_empty()).then_some(self.model.as_str()),
                enable_automatic_punctuation: true,
            },
            audio: GoogleRecognitionAudio {
                content: encode_audio(&audio.bytes),
            },
        };

        let response = self
            .client
            .post(GOOGLE_SPEECH_URL)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google Speech request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google Speech API error");
            return Err(Error::Stt(format!("Google Speech API error {status}: {body}")));
        }

        let result: GoogleRecognizeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Google Speech response");
            Error::Stt(format!("unreadable Google Speech response: {e}"))
        })?;

        let transcript = Transcript::from_text(&join_best_alternatives(&result));
        tracing::info!(heard = transcript.has_speech(), "transcription complete");
        Ok(transcript)
    }

    /// Transcribe using `OpenAI` Whisper
    async fn transcribe_whisper(&self, audio: &AudioBlob) -> Result<Transcript> {
        tracing::debug!(audio_bytes = audio.bytes.len(), "starting Whisper transcription");

        let mime = audio.content_type.as_deref().unwrap_or("audio/webm");
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.bytes.clone())
                    .file_name(format!("audio.{}", file_extension(mime)))
                    .mime_str(mime)
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post(WHISPER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            Error::Stt(format!("unreadable Whisper response: {e}"))
        })?;

        let transcript = Transcript::from_text(&result.text);
        tracing::info!(heard = transcript.has_speech(), "transcription complete");
        Ok(transcript)
    }
}

#[async_trait]
impl Transcriber for SpeechToText {
    async fn transcribe(&self, audio: &AudioBlob) -> Result<Transcript> {
        if audio.is_empty() {
            return Ok(Transcript::NoSpeech);
        }

        match self.provider {
            SttProvider::Google => self.transcribe_google(audio).await,
            SttProvider::Whisper => self.transcribe_whisper(audio).await,
        }
    }

    fn name(&self) -> &'static str {
        match self.provider {
            SttProvider::Google => "google-speech",
            SttProvider::Whisper => "whisper",
        }
    }
}

/// Join the top alternative of each sequential result
fn join_best_alternatives(response: &GoogleRecognizeResponse) -> String {
    response
        .results
        .iter()
        .filter_map(|r| r.alternatives.first())
        .map(|a| a.transcript.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// File extension Whisper uses to sniff the container format
fn file_extension(mime: &str) -> &'static str {
    match mime.split(';').next().unwrap_or_default().trim() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" => "ogg",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        _ => "webm",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_is_no_speech() {
        let response: GoogleRecognizeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(
            Transcript::from_text(&join_best_alternatives(&response)),
            Transcript::NoSpeech
        );
    }

    #[test]
    fn test_joins_sequential_results() {
        let response: GoogleRecognizeResponse = serde_json::from_str(
            r#"{"results":[
                {"alternatives":[{"transcript":"I had a long day","confidence":0.92},{"transcript":"I had a wrong day"}]},
                {"alternatives":[{"transcript":" at work "}]},
                {"alternatives":[]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(join_best_alternatives(&response), "I had a long day at work");
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request = GoogleRecognizeRequest {
            config: GoogleRecognitionConfig {
                encoding: "WEBM_OPUS",
                sample_rate_hertz: 48_000,
                language_code: "en-US",
                model: None,
                enable_automatic_punctuation: true,
            },
            audio: GoogleRecognitionAudio {
                content: encode_audio(b"abc"),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["config"]["sampleRateHertz"], 48_000);
        assert_eq!(json["config"]["languageCode"], "en-US");
        assert!(json["config"].get("model").is_none());
        assert_eq!(json["audio"]["content"], "YWJj");
    }

    #[test]
    fn test_file_extension_from_mime() {
        assert_eq!(file_extension("audio/webm;codecs=opus"), "webm");
        assert_eq!(file_extension("audio/wav"), "wav");
        assert_eq!(file_extension("application/octet-stream"), "webm");
    }

    #[test]
    fn test_missing_keys_rejected() {
        let voice = VoiceConfig::default();
        let result = SpeechToText::from_config(&voice, &ApiKeys::default(), Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Config(_))));

        let voice = VoiceConfig {
            stt_provider: "carrier-pigeon".to_string(),
            ..VoiceConfig::default()
        };
        let result = SpeechToText::from_config(&voice, &ApiKeys::default(), Duration::from_secs(5));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("carrier-pigeon")));
    }

    #[test]
    fn test_google_from_config() {
        let keys = ApiKeys {
            google: Some("key".to_string()),
            openai: None,
        };
        let stt = SpeechToText::from_config(&VoiceConfig::default(), &keys, Duration::from_secs(5)).unwrap();
        assert_eq!(stt.name(), "google-speech");
    }
}
