//! Shared test utilities: scripted providers and router setup

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use haven_gateway::api::ApiServerBuilder;
use haven_gateway::companion::prompts::JOURNAL_SYSTEM_PROMPT;
use haven_gateway::llm::{GenerationRequest, LanguageModel};
use haven_gateway::safety::{AlertSink, CrisisFilter, CrisisIncident, SafetyNet};
use haven_gateway::voice::{AudioBlob, Synthesizer, Transcriber, Transcript};
use haven_gateway::{Companion, Error, JournalAnalyzer, MemoryStore, RecordStore, Result};

/// Provider timeout used by every test pipeline
pub const TEST_TIMEOUT: Duration = Duration::from_millis(100);

/// Long enough to always trip [`TEST_TIMEOUT`]
const HANG: Duration = Duration::from_secs(30);

/// Reply the scripted model gives for prose requests
pub const STUB_REPLY: &str = "That's wonderful to hear! What made today so good?";

/// Scripted speech recognizer
pub enum StubTranscriber {
    /// Always hears this text
    Hears(String),
    /// Behaves like a real recognizer: empty audio means no speech
    Echo(String),
    Fails,
    Hangs,
}

impl StubTranscriber {
    pub fn hears(text: &str) -> Arc<Self> {
        Arc::new(Self::Hears(text.to_string()))
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, audio: &AudioBlob) -> Result<Transcript> {
        match self {
            Self::Hears(text) => Ok(Transcript::from_text(text)),
            Self::Echo(_) if audio.is_empty() => Ok(Transcript::NoSpeech),
            Self::Echo(text) => Ok(Transcript::from_text(text)),
            Self::Fails => Err(Error::Stt("recognizer unavailable".to_string())),
            Self::Hangs => {
                tokio::time::sleep(HANG).await;
                Ok(Transcript::NoSpeech)
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub-stt"
    }
}

/// How the scripted model answers one kind of request
#[derive(Clone)]
pub enum Answer {
    Text(String),
    Fails,
    Hangs,
}

impl Answer {
    pub fn text(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

/// Scripted language model; answers depend on the request kind
pub struct StubModel {
    pub classify: Answer,
    pub reply: Answer,
    pub journal: Answer,
    pub calls: AtomicUsize,
}

impl Default for StubModel {
    fn default() -> Self {
        Self {
            classify: Answer::text(r#"{"emotion": "happy"}"#),
            reply: Answer::text(STUB_REPLY),
            journal: Answer::text(
                r#"{"sentiment": "positive", "risk_level": "low", "recommendations": ["Keep a gratitude list"]}"#,
            ),
            calls: AtomicUsize::new(0),
        }
    }
}

impl StubModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let answer = if request.system.as_deref() == Some(JOURNAL_SYSTEM_PROMPT) {
            &self.journal
        } else if request.json {
            &self.classify
        } else {
            &self.reply
        };

        match answer {
            Answer::Text(raw) => Ok(raw.clone()),
            Answer::Fails => Err(Error::Llm("model overloaded".to_string())),
            Answer::Hangs => {
                tokio::time::sleep(HANG).await;
                Err(Error::Llm("unreachable".to_string()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "stub-llm"
    }
}

/// Scripted synthesizer producing a fake MP3 frame per request
#[derive(Default)]
pub struct StubSynthesizer {
    /// Texts that fail to synthesize
    pub refuses: Vec<String>,
    /// Fail everything
    pub broken: bool,
    pub spoken: std::sync::Mutex<Vec<String>>,
}

impl StubSynthesizer {
    pub fn refusing(text: &str) -> Arc<Self> {
        Arc::new(Self {
            refuses: vec![text.to_string()],
            ..Self::default()
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            broken: true,
            ..Self::default()
        })
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        if self.broken || self.refuses.iter().any(|r| r == text) {
            return Err(Error::Tts("voice unavailable".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        let mut audio = b"ID3".to_vec();
        audio.extend_from_slice(text.as_bytes());
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "stub-tts"
    }
}

/// Alert sink that counts deliveries
#[derive(Default)]
pub struct RecordingSink {
    pub incidents: std::sync::Mutex<Vec<CrisisIncident>>,
}

impl RecordingSink {
    pub fn count(&self) -> usize {
        self.incidents.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn notify(&self, incident: &CrisisIncident) -> Result<()> {
        self.incidents.lock().unwrap().push(incident.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Everything a test needs to drive and inspect the service
pub struct Harness {
    pub companion: Arc<Companion>,
    pub journal: Arc<JournalAnalyzer>,
    pub store: Arc<MemoryStore>,
    pub alerts: Arc<RecordingSink>,
    pub model: Arc<StubModel>,
    pub synthesizer: Arc<StubSynthesizer>,
}

impl Harness {
    pub fn new(transcriber: Arc<StubTranscriber>, model: StubModel, synthesizer: Arc<StubSynthesizer>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let alerts = Arc::new(RecordingSink::default());
        let model = Arc::new(model);
        let safety = SafetyNet::new(CrisisFilter::default(), alerts.clone(), store.clone());

        let companion = Companion::new(transcriber, model.clone(), synthesizer.clone(), safety.clone())
            .with_timeout(TEST_TIMEOUT);
        let journal = JournalAnalyzer::new(model.clone(), safety, store.clone(), TEST_TIMEOUT);

        Self {
            companion: Arc::new(companion),
            journal: Arc::new(journal),
            store,
            alerts,
            model,
            synthesizer,
        }
    }

    /// Harness whose recognizer always hears `text`
    pub fn hearing(text: &str) -> Self {
        Self::new(StubTranscriber::hears(text), StubModel::default(), Arc::new(StubSynthesizer::default()))
    }

    pub fn router(&self) -> axum::Router {
        self.router_with_limit(None)
    }

    pub fn router_with_limit(&self, rpm: Option<u32>) -> axum::Router {
        let store: Arc<dyn RecordStore> = self.store.clone();
        ApiServerBuilder::new(self.companion.clone(), self.journal.clone(), store, 0)
            .rate_limit_rpm(rpm)
            .build()
            .router()
    }
}

const BOUNDARY: &str = "haven-test-boundary";

/// Multipart request carrying `audio` in the named field
pub fn multipart_request(field: &str, audio: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"recording.webm\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: audio/webm\r\n\r\n");
    body.extend_from_slice(audio);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/chat_ai")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

/// JSON POST request
pub fn json_request(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Collect a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
