//! Crisis keyword detection and operator alerting
//!
//! Detection is a case-insensitive substring match against a fixed keyword
//! list. Paraphrases ("I don't want to be here anymore") are not caught.

mod alert;

pub use alert::{AlertSink, LogAlertSink, WebhookAlertSink};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::RecordStore;

/// Keywords that trigger the crisis override
pub const CRISIS_KEYWORDS: &[&str] = &[
    "suicide",
    "kill myself",
    "end it all",
    "give up",
    "self-harm",
    "no point",
    "worthless",
    "can't go on",
];

/// Reply that replaces generated text whenever a crisis keyword is present
pub const CRISIS_MESSAGE: &str = "I'm really concerned about what you just shared, and I'm glad you told me. \
You don't have to go through this alone. Please call or text 988 to reach the Suicide and Crisis Lifeline, \
available 24 hours a day. If you are in immediate danger, call 911.";

/// Resources attached to high-risk journal analyses
pub const CRISIS_RESOURCES: &[&str] = &[
    "988 Suicide & Crisis Lifeline: call or text 988 (US)",
    "Crisis Text Line: text HOME to 741741",
    "Emergency services: 911",
];

/// Where a crisis incident was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSource {
    Chat,
    Journal,
}

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

/// A detected crisis, forwarded to the alert sink and kept for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisIncident {
    pub source: IncidentSource,
    pub severity: Severity,
    /// Keyword that matched
    pub keyword: String,
    /// Operator-facing summary; never contains the user's words
    pub message: String,
    pub detected_at: DateTime<Utc>,
}

impl CrisisIncident {
    /// Build an incident for a keyword match
    #[must_use]
    pub fn new(source: IncidentSource, keyword: &str) -> Self {
        let origin = match source {
            IncidentSource::Chat => "voice companion",
            IncidentSource::Journal => "journal entry",
        };
        Self {
            source,
            severity: Severity::High,
            keyword: keyword.to_string(),
            message: format!("Crisis language detected in {origin}"),
            detected_at: Utc::now(),
        }
    }
}

/// Case-insensitive crisis keyword matcher
#[derive(Debug, Clone)]
pub struct CrisisFilter {
    keywords: Vec<String>,
}

impl Default for CrisisFilter {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl CrisisFilter {
    /// Create a filter from the built-in list plus extra keywords
    ///
    /// Extra keywords are trimmed and lower-cased; blanks are dropped.
    #[must_use]
    pub fn new(extra: &[String]) -> Self {
        let mut keywords: Vec<String> = CRISIS_KEYWORDS.iter().map(|k| (*k).to_string()).collect();
        for keyword in extra {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        Self { keywords }
    }

    /// Return the first keyword contained in `text`
    #[must_use]
    pub fn matched(&self, text: &str) -> Option<&str> {
        let lowered = normalize(text);
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Whether `text` contains any crisis keyword
    #[must_use]
    pub fn detect(&self, text: &str) -> bool {
        self.matched(text).is_some()
    }

    /// Active keyword list
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Screens text and reports matches to the alert sink and record store
#[derive(Clone)]
pub struct SafetyNet {
    filter: CrisisFilter,
    alerts: Arc<dyn AlertSink>,
    store: Arc<dyn RecordStore>,
}

impl SafetyNet {
    /// Create a safety net
    #[must_use]
    pub fn new(filter: CrisisFilter, alerts: Arc<dyn AlertSink>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            filter,
            alerts,
            store,
        }
    }

    /// Keyword filter in use
    #[must_use]
    pub const fn filter(&self) -> &CrisisFilter {
        &self.filter
    }

    /// Check `text` for crisis language
    ///
    /// On a match the incident is delivered to the alert sink and stored.
    /// Delivery failures are logged and never change the verdict.
    pub async fn screen(&self, source: IncidentSource, text: &str) -> bool {
        let Some(keyword) = self.filter.matched(text) else {
            return false;
        };

        let incident = CrisisIncident::new(source, keyword);

        if let Err(e) = self.alerts.notify(&incident).await {
            tracing::error!(sink = self.alerts.name(), error = %e, "failed to deliver crisis alert");
        }
        if let Err(e) = self.store.append_incident(incident).await {
            tracing::error!(error = %e, "failed to record crisis incident");
        }

        true
    }
}

/// Lower-case and fold typographic apostrophes so "can’t" matches "can't"
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}
