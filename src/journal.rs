//! Journal entry analysis
//!
//! Entries are screened for crisis language before anything else. A match
//! short-circuits to a high-risk result with hotline resources and the
//! model is never consulted. Otherwise the model is asked for a JSON
//! verdict; when it fails or answers nonsense, the self-reported mood
//! decides.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::companion::prompts::{self, JOURNAL_SYSTEM_PROMPT};
use crate::companion::{extract_json, marker_list, marker_value};
use crate::emotion::Emotion;
use crate::llm::{GenerationRequest, LanguageModel};
use crate::safety::{CRISIS_RESOURCES, IncidentSource, SafetyNet};
use crate::store::{JournalEntry, RecordStore};
use crate::{Error, Result};

/// Most recommendations returned for one entry
const MAX_RECOMMENDATIONS: usize = 3;

/// Overall tone of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!("unknown sentiment: {other}")),
        }
    }
}

/// Estimated risk of self-harm
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "none" => Ok(Self::Low),
            "moderate" | "medium" => Ok(Self::Moderate),
            "high" | "severe" => Ok(Self::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// A journal entry as submitted by the client
#[derive(Debug, Clone, Deserialize)]
pub struct JournalSubmission {
    pub content: String,
    pub mood: String,
    /// Self-reported intensity; clamped to 1..=10
    pub intensity: i64,
    /// Defaults to the time of receipt
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl JournalSubmission {
    /// Intensity clamped to the 1..=10 scale
    #[must_use]
    pub fn clamped_intensity(&self) -> u8 {
        u8::try_from(self.intensity.clamp(1, 10)).unwrap_or(1)
    }
}

/// Result of analyzing one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalAnalysis {
    pub sentiment: Sentiment,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crisis_resources: Option<Vec<String>>,
}

impl JournalAnalysis {
    /// Attach hotline resources when risk is high
    fn with_resources(mut self) -> Self {
        if self.risk_level == RiskLevel::High {
            self.crisis_resources = Some(CRISIS_RESOURCES.iter().map(|r| (*r).to_string()).collect());
        }
        self
    }
}

#[derive(Deserialize)]
struct AnalysisJson {
    sentiment: String,
    risk_level: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Parse model output into an analysis
///
/// Accepts a JSON object (optionally fenced or wrapped in prose) or
/// `Sentiment:` / `Risk level:` / `Recommendations:` marker lines. Returns
/// `None` when sentiment or risk cannot be read.
#[must_use]
pub fn parse_analysis(raw: &str) -> Option<JournalAnalysis> {
    let (sentiment, risk_level, recommendations): (Sentiment, RiskLevel, Vec<String>) = match extract_json::<AnalysisJson>(raw) {
        Some(json) => (
            json.sentiment.parse().ok()?,
            json.risk_level.parse().ok()?,
            json.recommendations,
        ),
        None => (
            first_word(marker_value(raw, &["sentiment"])?).parse().ok()?,
            first_word(marker_value(raw, &["risk_level", "risk level", "risk"])?)
                .parse()
                .ok()?,
            marker_list(raw, &["recommendations", "suggestions"]),
        ),
    };

    let recommendations = recommendations
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .take(MAX_RECOMMENDATIONS)
        .collect();

    Some(JournalAnalysis {
        sentiment,
        risk_level,
        recommendations,
        crisis_resources: None,
    })
}

fn first_word(value: &str) -> &str {
    value
        .split(|c: char| !c.is_alphabetic() && c != '_')
        .find(|w| !w.is_empty())
        .unwrap_or_default()
}

/// Analysis derived from the self-reported mood alone
#[must_use]
pub fn default_analysis(mood: &str, intensity: u8) -> JournalAnalysis {
    let emotion = Emotion::from_free_text(mood);
    let sentiment = match emotion {
        Emotion::Happy | Emotion::Excited | Emotion::Calm => Sentiment::Positive,
        Emotion::Neutral => Sentiment::Neutral,
        Emotion::Confused => Sentiment::Mixed,
        Emotion::Sad | Emotion::Anxious | Emotion::Stressed | Emotion::Angry => Sentiment::Negative,
    };
    let risk_level = if sentiment == Sentiment::Negative && intensity >= 8 {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let recommendations: &[&str] = match sentiment {
        Sentiment::Positive => &[
            "Note what contributed to this feeling so you can return to it",
            "Share the good moment with someone you trust",
        ],
        Sentiment::Negative => &[
            "Try a few minutes of slow breathing",
            "Reach out to a friend or someone you trust",
            "Be gentle with yourself today",
        ],
        Sentiment::Neutral | Sentiment::Mixed => &[
            "Keep journaling to notice patterns over time",
            "Take a short walk or stretch break",
        ],
    };

    JournalAnalysis {
        sentiment,
        risk_level,
        recommendations: recommendations.iter().map(|r| (*r).to_string()).collect(),
        crisis_resources: None,
    }
}

/// Analyzes and records journal entries
pub struct JournalAnalyzer {
    model: Arc<dyn LanguageModel>,
    safety: SafetyNet,
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl JournalAnalyzer {
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        safety: SafetyNet,
        store: Arc<dyn RecordStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            safety,
            store,
            timeout,
        }
    }

    /// Analyze a submission and append it to the store
    ///
    /// Model failures degrade to [`default_analysis`].
    ///
    /// # Errors
    ///
    /// Returns error only if the store rejects the entry
    pub async fn analyze(&self, submission: JournalSubmission) -> Result<JournalAnalysis> {
        let intensity = submission.clamped_intensity();

        let analysis = if self
            .safety
            .screen(IncidentSource::Journal, &submission.content)
            .await
        {
            tracing::warn!("crisis language in journal entry");
            JournalAnalysis {
                sentiment: Sentiment::Negative,
                risk_level: RiskLevel::High,
                recommendations: vec![
                    "Please reach out to someone right now; you don't have to carry this alone".to_string(),
                ],
                crisis_resources: None,
            }
        } else {
            match self.ask_model(&submission, intensity).await {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!(error = %e, "journal analysis unavailable, using mood defaults");
                    default_analysis(&submission.mood, intensity)
                }
            }
        };
        let analysis = analysis.with_resources();

        self.store
            .append_journal(JournalEntry {
                content: submission.content,
                mood: submission.mood,
                intensity,
                timestamp: submission.timestamp.unwrap_or_else(Utc::now),
                sentiment: analysis.sentiment,
                risk_level: analysis.risk_level,
            })
            .await?;

        tracing::info!(
            sentiment = %analysis.sentiment,
            risk = %analysis.risk_level,
            "journal entry analyzed"
        );
        Ok(analysis)
    }

    async fn ask_model(&self, submission: &JournalSubmission, intensity: u8) -> Result<JournalAnalysis> {
        let request = GenerationRequest::json(prompts::journal_prompt(
            &submission.content,
            &submission.mood,
            intensity,
        ))
        .with_system(JOURNAL_SYSTEM_PROMPT)
        .with_sampling(0.2, 512);

        let raw = tokio::time::timeout(self.timeout, self.model.generate(&request))
            .await
            .map_err(|_| Error::Timeout {
                stage: "journal analysis",
                secs: self.timeout.as_secs(),
            })??;

        parse_analysis(&raw)
            .ok_or_else(|| Error::Malformed("journal analysis missing sentiment or risk".to_string()))
    }
}
