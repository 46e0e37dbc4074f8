//! Dashboard aggregation over a trailing window

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::Result;
use crate::journal::{RiskLevel, Sentiment};
use crate::safety::{CrisisIncident, Severity};
use crate::store::{GameResult, JournalEntry, RecordStore, TimeRange};

/// Shift in mean daily mood score between window halves that counts as a trend
const TREND_THRESHOLD: f64 = 5.0;

/// Everything the dashboard page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub mood_trends: Vec<MoodPoint>,
    pub game_performance: Vec<GamePoint>,
    pub insights: Insights,
    /// Days with at least one journal entry, oldest first
    pub dates: Vec<String>,
    /// Mean mood score for each entry of `dates`
    #[serde(rename = "moodScores")]
    pub mood_scores: Vec<i64>,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub mood: String,
    pub intensity: u8,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamePoint {
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub game_type: String,
    pub score: i64,
    pub reaction_time_ms: f64,
}

/// Trend of mood scores across the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

/// Summary statistics; every mean is 0 for an empty window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub window_days: i64,
    pub average_mood_intensity: f64,
    pub average_score: f64,
    pub average_reaction_time_ms: f64,
    pub total_journal_entries: usize,
    pub total_games: usize,
    pub most_common_mood: Option<String>,
    pub high_risk_entries: usize,
    pub trend: Trend,
}

/// Operator-facing notice derived from a crisis incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
}

impl From<&CrisisIncident> for Alert {
    fn from(incident: &CrisisIncident) -> Self {
        Self {
            timestamp: incident.detected_at,
            message: incident.message.clone(),
            severity: incident.severity,
        }
    }
}

/// Mood score of one journal entry on 0..=100
///
/// Positive entries score above 50 and negative entries below, scaled by
/// the reported intensity.
#[must_use]
pub fn entry_mood_score(entry: &JournalEntry) -> i64 {
    let swing = 5 * i64::from(entry.intensity.min(10));
    match entry.sentiment {
        Sentiment::Positive => 50 + swing,
        Sentiment::Negative => 50 - swing,
        Sentiment::Neutral | Sentiment::Mixed => 50,
    }
}

/// Aggregate records already filtered to the window
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build(
    games: &[GameResult],
    journals: &[JournalEntry],
    incidents: &[CrisisIncident],
    window_days: i64,
) -> DashboardData {
    let mood_trends = journals
        .iter()
        .map(|e| MoodPoint {
            date: day(e.timestamp),
            timestamp: e.timestamp,
            mood: e.mood.clone(),
            intensity: e.intensity,
            sentiment: e.sentiment,
        })
        .collect();

    let game_performance = games
        .iter()
        .map(|g| GamePoint {
            date: day(g.timestamp),
            timestamp: g.timestamp,
            game_type: g.game_type.clone(),
            score: g.score,
            reaction_time_ms: g.reaction_time_ms,
        })
        .collect();

    let mut by_day: BTreeMap<NaiveDate, Vec<i64>> = BTreeMap::new();
    for entry in journals {
        by_day
            .entry(entry.timestamp.date_naive())
            .or_default()
            .push(entry_mood_score(entry));
    }
    let daily: Vec<(NaiveDate, f64)> = by_day
        .into_iter()
        .map(|(date, scores)| (date, mean(scores.iter().map(|s| *s as f64))))
        .collect();

    #[allow(clippy::cast_possible_truncation)]
    let mood_scores = daily.iter().map(|(_, avg)| avg.round() as i64).collect();
    let dates = daily.iter().map(|(d, _)| d.format("%Y-%m-%d").to_string()).collect();

    let insights = Insights {
        window_days,
        average_mood_intensity: mean(journals.iter().map(|e| f64::from(e.intensity))),
        average_score: mean(games.iter().map(|g| g.score as f64)),
        average_reaction_time_ms: mean(games.iter().map(|g| g.reaction_time_ms)),
        total_journal_entries: journals.len(),
        total_games: games.len(),
        most_common_mood: most_common_mood(journals),
        high_risk_entries: journals
            .iter()
            .filter(|e| e.risk_level == RiskLevel::High)
            .count(),
        trend: trend(&daily),
    };

    DashboardData {
        mood_trends,
        game_performance,
        insights,
        dates,
        mood_scores,
        alerts: incidents.iter().map(Alert::from).collect(),
    }
}

/// Load the trailing `window_days` ending at `now` and aggregate it
///
/// # Errors
///
/// Returns error if the store cannot be read
pub async fn load(store: &dyn RecordStore, now: DateTime<Utc>, window_days: i64) -> Result<DashboardData> {
    let range = TimeRange::trailing_days(now, window_days);

    let games = store.games_in(range).await?;
    let journals = store.journals_in(range).await?;
    let incidents = store.incidents_in(range).await?;

    Ok(build(&games, &journals, &incidents, window_days))
}

fn day(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Most frequent mood label, case-folded; ties go to the label seen first
fn most_common_mood(journals: &[JournalEntry]) -> Option<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, entry) in journals.iter().enumerate() {
        let label = entry.mood.trim().to_lowercase();
        if label.is_empty() {
            continue;
        }
        counts.entry(label).or_insert((0, idx)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (a, first_a)), (_, (b, first_b))| a.cmp(b).then(first_b.cmp(first_a)))
        .map(|(label, _)| label)
}

/// Compare the mean of the later half of days against the earlier half
fn trend(daily: &[(NaiveDate, f64)]) -> Trend {
    if daily.len() < 2 {
        return Trend::Stable;
    }
    let (early, late) = daily.split_at(daily.len() / 2);
    let delta = mean(late.iter().map(|(_, s)| *s)) - mean(early.iter().map(|(_, s)| *s));
    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
