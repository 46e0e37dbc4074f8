//! Stored record types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::journal::{RiskLevel, Sentiment};

/// One finished game round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Game identifier (e.g. "reaction", "memory", "mood_matcher")
    pub game_type: String,
    pub score: i64,
    /// Mean reaction time in milliseconds
    pub reaction_time_ms: f64,
    /// Emotions the player matched during the round
    #[serde(default)]
    pub emotions_recognized: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// One journal entry with its derived analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub content: String,
    /// Self-reported mood label (free text, e.g. "Calm")
    pub mood: String,
    /// Self-reported intensity, 1 to 10
    pub intensity: u8,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Sentiment,
    pub risk_level: RiskLevel,
}

/// Half-open time window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Window covering the trailing `days` up to and including `now`
    #[must_use]
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            // include records stamped exactly `now`
            end: now + Duration::milliseconds(1),
        }
    }

    /// Window covering all representable time
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// Whether `at` falls inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}
