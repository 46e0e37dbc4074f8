//! In-memory record store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{GameResult, JournalEntry, RecordStore, TimeRange};
use crate::Result;
use crate::safety::CrisisIncident;

/// Process-lifetime store; appends are serialized by per-list locks
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: RwLock<Vec<GameResult>>,
    journals: RwLock<Vec<JournalEntry>>,
    incidents: RwLock<Vec<CrisisIncident>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn append_game(&self, result: GameResult) -> Result<()> {
        self.games.write().await.push(result);
        Ok(())
    }

    async fn append_journal(&self, entry: JournalEntry) -> Result<()> {
        self.journals.write().await.push(entry);
        Ok(())
    }

    async fn append_incident(&self, incident: CrisisIncident) -> Result<()> {
        self.incidents.write().await.push(incident);
        Ok(())
    }

    async fn games_in(&self, range: TimeRange) -> Result<Vec<GameResult>> {
        let mut games: Vec<GameResult> = self
            .games
            .read()
            .await
            .iter()
            .filter(|g| range.contains(g.timestamp))
            .cloned()
            .collect();
        games.sort_by_key(|g| g.timestamp);
        Ok(games)
    }

    async fn journals_in(&self, range: TimeRange) -> Result<Vec<JournalEntry>> {
        let mut entries: Vec<JournalEntry> = self
            .journals
            .read()
            .await
            .iter()
            .filter(|e| range.contains(e.timestamp))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    async fn incidents_in(&self, range: TimeRange) -> Result<Vec<CrisisIncident>> {
        let mut incidents: Vec<CrisisIncident> = self
            .incidents
            .read()
            .await
            .iter()
            .filter(|i| range.contains(i.detected_at))
            .cloned()
            .collect();
        incidents.sort_by_key(|i| i.detected_at);
        Ok(incidents)
    }

    async fn scores_for(&self, game_type: &str) -> Result<Vec<i64>> {
        Ok(self
            .games
            .read()
            .await
            .iter()
            .filter(|g| g.game_type == game_type)
            .map(|g| g.score)
            .collect())
    }
}
