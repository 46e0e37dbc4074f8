//! Closed emotion label set

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Emotion detected in a user's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Anxious,
    Calm,
    Stressed,
    Excited,
    #[default]
    Neutral,
    Confused,
    Angry,
}

impl Emotion {
    /// Every label, in prompt order
    pub const ALL: [Self; 9] = [
        Self::Happy,
        Self::Sad,
        Self::Anxious,
        Self::Calm,
        Self::Stressed,
        Self::Excited,
        Self::Neutral,
        Self::Confused,
        Self::Angry,
    ];

    /// Lowercase label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Anxious => "anxious",
            Self::Calm => "calm",
            Self::Stressed => "stressed",
            Self::Excited => "excited",
            Self::Neutral => "neutral",
            Self::Confused => "confused",
            Self::Angry => "angry",
        }
    }

    /// Comma-separated label list for prompts
    #[must_use]
    pub fn label_list() -> String {
        Self::ALL.iter().map(Self::as_str).collect::<Vec<_>>().join(", ")
    }

    /// Find the earliest label mentioned anywhere in free text
    ///
    /// Falls back to [`Emotion::Neutral`] when nothing matches.
    #[must_use]
    pub fn from_free_text(text: &str) -> Self {
        text.to_lowercase()
            .split(|c: char| !c.is_ascii_alphabetic())
            .find_map(|word| word.parse().ok())
            .unwrap_or_default()
    }

    /// Whether this emotion warrants a grounding suggestion in the reply
    #[must_use]
    pub const fn is_distressed(&self) -> bool {
        matches!(
            self,
            Self::Sad | Self::Anxious | Self::Stressed | Self::Angry | Self::Confused
        )
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == label)
            .ok_or_else(|| format!("unknown emotion: {s}"))
    }
}
