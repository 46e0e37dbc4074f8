//! Mini-game scoring feedback

use serde::Serialize;

use crate::Result;
use crate::store::{GameResult, RecordStore};

/// Reaction time above which focus tips are suggested (ms)
const SLOW_REACTION_MS: f64 = 600.0;

/// Reaction time below which the player is considered sharp (ms)
const FAST_REACTION_MS: f64 = 300.0;

/// Feedback returned for one game round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameFeedback {
    /// Score scaled onto 0..=100
    pub mood_score: i64,
    /// Share of recorded rounds of this game scoring at or below this one
    pub percentile: f64,
    pub analysis: String,
    pub recommendations: Vec<String>,
}

/// Scale a raw score onto 0..=100
#[must_use]
pub fn mood_score(score: i64) -> i64 {
    score.saturating_mul(10).clamp(0, 100)
}

/// Percentage of `history` at or below `score`
///
/// `history` should already include the round being ranked. An empty
/// history ranks at 100.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentile(history: &[i64], score: i64) -> f64 {
    if history.is_empty() {
        return 100.0;
    }
    let at_or_below = history.iter().filter(|s| **s <= score).count();
    let pct = at_or_below as f64 * 100.0 / history.len() as f64;
    (pct * 10.0).round() / 10.0
}

/// Fixed tips keyed on reaction time and score
#[must_use]
pub fn recommendations(result: &GameResult) -> Vec<String> {
    let mut tips = Vec::new();

    if result.reaction_time_ms > SLOW_REACTION_MS {
        tips.push("Take a few slow breaths before the next round to settle your focus".to_string());
    } else if result.reaction_time_ms > 0.0 && result.reaction_time_ms < FAST_REACTION_MS {
        tips.push("Your reactions are sharp today; keep that momentum going".to_string());
    }

    if mood_score(result.score) < 50 {
        tips.push("Short breaks between rounds can help you reset".to_string());
    } else {
        tips.push("Try a harder level when you feel ready".to_string());
    }

    if !result.emotions_recognized.is_empty() {
        tips.push("Notice which of those emotions you have felt yourself this week".to_string());
    }

    tips
}

fn analysis(mood_score: i64, percentile: f64) -> String {
    let engagement = match mood_score {
        80.. => "Strong engagement",
        50..80 => "Good engagement",
        _ => "Light engagement",
    };
    format!("{engagement}; this round ranks at the {percentile:.0}th percentile of your results")
}

/// Record a round and produce feedback
///
/// # Errors
///
/// Returns error if the store cannot be written or read
pub async fn analyze_game(store: &dyn RecordStore, result: GameResult) -> Result<GameFeedback> {
    let score = mood_score(result.score);
    let recommendations = recommendations(&result);
    let game_type = result.game_type.clone();
    let raw_score = result.score;

    store.append_game(result).await?;
    let history = store.scores_for(&game_type).await?;
    let percentile = percentile(&history, raw_score);

    tracing::debug!(game_type = %game_type, mood_score = score, percentile, "game analyzed");

    Ok(GameFeedback {
        mood_score: score,
        percentile,
        analysis: analysis(score, percentile),
        recommendations,
    })
}
