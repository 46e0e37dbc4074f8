//! Turn orchestration with fallback policy

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::parse::{clean_reply, parse_emotion};
use super::prompts::{self, CLASSIFY_SYSTEM_PROMPT, REPLY_SYSTEM_PROMPT};
use super::{FALLBACK_REPLY, NO_SPEECH_REPLY};
use crate::emotion::Emotion;
use crate::llm::{GenerationRequest, LanguageModel};
use crate::safety::{CRISIS_MESSAGE, IncidentSource, SafetyNet};
use crate::voice::{AudioBlob, Synthesizer, Transcriber, Transcript};
use crate::{Error, Result};

/// Default budget for each provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest a crisis reply waits on the emotion classifier
pub const DEFAULT_CRISIS_CLASSIFY_BUDGET: Duration = Duration::from_secs(2);

/// Pipeline stage backed by an external provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Transcription,
    Classification,
    Generation,
    Synthesis,
}

impl Stage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transcription => "transcription",
            Self::Classification => "classification",
            Self::Generation => "generation",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider error tagged with the stage it broke
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: Error,
}

/// Which policy produced the reply text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Generated by the language model
    Normal,
    /// Fixed crisis-safety message
    Crisis,
    /// Nothing was heard; the user is asked to repeat
    NoSpeech,
    /// A provider failed; fixed apology
    Fallback,
}

/// Outcome of one conversational turn
#[derive(Debug)]
pub struct Turn {
    /// `None` when transcription itself failed
    pub transcript: Option<Transcript>,
    pub emotion: Emotion,
    pub reply: String,
    pub kind: ReplyKind,
    /// Synthesized reply; `None` only when even the fallback could not be spoken
    pub audio: Option<Vec<u8>>,
    /// Failure that degraded this turn, if any
    pub failure: Option<StageFailure>,
}

impl Turn {
    /// Whether the reply came with audio
    #[must_use]
    pub const fn is_spoken(&self) -> bool {
        self.audio.is_some()
    }
}

/// Reply chosen before synthesis
struct Draft {
    transcript: Option<Transcript>,
    emotion: Emotion,
    reply: String,
    kind: ReplyKind,
    failure: Option<StageFailure>,
}

impl Draft {
    fn new(transcript: Option<Transcript>, emotion: Emotion, reply: impl Into<String>, kind: ReplyKind) -> Self {
        Self {
            transcript,
            emotion,
            reply: reply.into(),
            kind,
            failure: None,
        }
    }

    fn fallback(transcript: Option<Transcript>, emotion: Emotion, failure: StageFailure) -> Self {
        tracing::warn!(
            stage = %failure.stage,
            error = %failure.error,
            timed_out = failure.error.is_timeout(),
            "provider failure, using fallback reply"
        );
        Self {
            failure: Some(failure),
            ..Self::new(transcript, emotion, FALLBACK_REPLY, ReplyKind::Fallback)
        }
    }

    fn into_turn(self, audio: Option<Vec<u8>>) -> Turn {
        Turn {
            transcript: self.transcript,
            emotion: self.emotion,
            reply: self.reply,
            kind: self.kind,
            audio,
            failure: self.failure,
        }
    }
}

/// Runs conversational turns against the configured providers
pub struct Companion {
    transcriber: Arc<dyn Transcriber>,
    model: Arc<dyn LanguageModel>,
    synthesizer: Arc<dyn Synthesizer>,
    safety: SafetyNet,
    timeout: Duration,
    crisis_classify_budget: Duration,
    temperature: f32,
    max_output_tokens: u32,
}

impl Companion {
    /// Create a companion with default timeout and sampling
    #[must_use]
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        model: Arc<dyn LanguageModel>,
        synthesizer: Arc<dyn Synthesizer>,
        safety: SafetyNet,
    ) -> Self {
        Self {
            transcriber,
            model,
            synthesizer,
            safety,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            crisis_classify_budget: DEFAULT_CRISIS_CLASSIFY_BUDGET,
            temperature: 0.7,
            max_output_tokens: 256,
        }
    }

    /// Set the per-call provider timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap how long a crisis reply waits for the emotion classifier
    #[must_use]
    pub const fn with_crisis_classify_budget(mut self, budget: Duration) -> Self {
        self.crisis_classify_budget = budget;
        self
    }

    /// Set reply sampling parameters
    #[must_use]
    pub const fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Crisis screening shared with other handlers
    #[must_use]
    pub const fn safety(&self) -> &SafetyNet {
        &self.safety
    }

    /// Run a full turn from recorded audio
    pub async fn respond_to_audio(&self, audio: &AudioBlob) -> Turn {
        tracing::debug!(
            audio_bytes = audio.bytes.len(),
            provider = self.transcriber.name(),
            "starting voice turn"
        );

        match self
            .guard(Stage::Transcription, self.transcriber.transcribe(audio))
            .await
        {
            Ok(transcript) => self.respond(transcript).await,
            Err(failure) => {
                self.speak(Draft::fallback(None, Emotion::Neutral, failure))
                    .await
            }
        }
    }

    /// Run a turn from typed text, skipping transcription
    pub async fn respond_to_text(&self, text: &str) -> Turn {
        self.respond(Transcript::from_text(text)).await
    }

    async fn respond(&self, transcript: Transcript) -> Turn {
        let draft = self.draft(transcript).await;
        let turn = self.speak(draft).await;

        tracing::info!(
            kind = ?turn.kind,
            emotion = %turn.emotion,
            spoken = turn.is_spoken(),
            "turn complete"
        );
        turn
    }

    /// Choose the reply text for a transcript
    async fn draft(&self, transcript: Transcript) -> Draft {
        if !transcript.has_speech() {
            tracing::info!("no speech detected");
            return Draft::new(Some(transcript), Emotion::Neutral, NO_SPEECH_REPLY, ReplyKind::NoSpeech);
        }
        let text = transcript.as_str().to_string();

        let crisis = self.safety.screen(IncidentSource::Chat, &text).await;

        let budget = if crisis {
            self.timeout.min(self.crisis_classify_budget)
        } else {
            self.timeout
        };

        let emotion = match self.classify_within(&text, budget).await {
            Ok(emotion) => emotion,
            Err(failure) if crisis || failure.error.is_malformed() => {
                tracing::warn!(error = %failure, "emotion unavailable, assuming neutral");
                Emotion::Neutral
            }
            Err(failure) => return Draft::fallback(Some(transcript), Emotion::Neutral, failure),
        };

        if crisis {
            tracing::warn!(emotion = %emotion, "crisis language detected, overriding reply");
            return Draft::new(Some(transcript), emotion, CRISIS_MESSAGE, ReplyKind::Crisis);
        }

        match self.generate_reply(&text, emotion).await {
            Ok(reply) => Draft::new(Some(transcript), emotion, reply, ReplyKind::Normal),
            Err(failure) => Draft::fallback(Some(transcript), emotion, failure),
        }
    }

    /// Classify the dominant emotion of `text`
    ///
    /// # Errors
    ///
    /// Returns the failure if the model call fails or times out. Unparseable
    /// output is not an error; it classifies as neutral.
    pub async fn classify_emotion(&self, text: &str) -> std::result::Result<Emotion, StageFailure> {
        self.classify_within(text, self.timeout).await
    }

    async fn classify_within(&self, text: &str, budget: Duration) -> std::result::Result<Emotion, StageFailure> {
        let request = GenerationRequest::json(prompts::classify_prompt(text))
            .with_system(CLASSIFY_SYSTEM_PROMPT)
            .with_sampling(0.0, 32);

        let raw = Self::guard_within(Stage::Classification, budget, self.model.generate(&request)).await?;
        Ok(parse_emotion(&raw))
    }

    /// Generate a short empathetic reply
    ///
    /// # Errors
    ///
    /// Returns the failure if the model call fails, times out, or returns
    /// nothing speakable
    pub async fn generate_reply(
        &self,
        text: &str,
        emotion: Emotion,
    ) -> std::result::Result<String, StageFailure> {
        let request = GenerationRequest::text(prompts::reply_prompt(text, emotion))
            .with_system(REPLY_SYSTEM_PROMPT)
            .with_sampling(self.temperature, self.max_output_tokens);

        let raw = self
            .guard(Stage::Generation, self.model.generate(&request))
            .await?;
        clean_reply(&raw).map_err(|error| StageFailure {
            stage: Stage::Generation,
            error,
        })
    }

    /// Synthesize the draft, degrading to the fallback reply if needed
    async fn speak(&self, draft: Draft) -> Turn {
        let failure = match self
            .guard(Stage::Synthesis, self.synthesizer.synthesize(&draft.reply))
            .await
        {
            Ok(audio) => return draft.into_turn(Some(audio)),
            Err(failure) => failure,
        };

        // Crisis text is never swapped out, and the fallback has nothing left to fall back to
        if matches!(draft.kind, ReplyKind::Crisis | ReplyKind::Fallback) {
            tracing::error!(kind = ?draft.kind, error = %failure, "reply could not be synthesized");
            let mut turn = draft.into_turn(None);
            turn.failure = Some(failure);
            return turn;
        }

        let fallback = Draft::fallback(draft.transcript, draft.emotion, failure);
        match self
            .guard(Stage::Synthesis, self.synthesizer.synthesize(FALLBACK_REPLY))
            .await
        {
            Ok(audio) => fallback.into_turn(Some(audio)),
            Err(second) => {
                tracing::error!(error = %second, "fallback reply could not be synthesized");
                let mut turn = fallback.into_turn(None);
                turn.failure = Some(second);
                turn
            }
        }
    }

    /// Bound a provider call by the timeout and tag failures with `stage`
    async fn guard<T>(
        &self,
        stage: Stage,
        call: impl Future<Output = Result<T>>,
    ) -> std::result::Result<T, StageFailure> {
        Self::guard_within(stage, self.timeout, call).await
    }

    async fn guard_within<T>(
        stage: Stage,
        budget: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> std::result::Result<T, StageFailure> {
        match tokio::time::timeout(budget, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(StageFailure { stage, error }),
            Err(_) => Err(StageFailure {
                stage,
                error: Error::Timeout {
                    stage: stage.as_str(),
                    secs: budget.as_secs(),
                },
            }),
        }
    }
}
