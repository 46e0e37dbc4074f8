//! Record storage for games, journal entries, and crisis incidents
//!
//! The default backend is process-lifetime memory; everything is lost on
//! restart. Handlers only see the [`RecordStore`] trait.

mod memory;
mod records;

pub use memory::MemoryStore;
pub use records::{GameResult, JournalEntry, TimeRange};

use async_trait::async_trait;

use crate::Result;
use crate::safety::CrisisIncident;

/// Append-only record storage with time-range queries
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append a game result
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the write
    async fn append_game(&self, result: GameResult) -> Result<()>;

    /// Append a journal entry
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the write
    async fn append_journal(&self, entry: JournalEntry) -> Result<()>;

    /// Append a crisis incident
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the write
    async fn append_incident(&self, incident: CrisisIncident) -> Result<()>;

    /// Game results inside `range`, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read
    async fn games_in(&self, range: TimeRange) -> Result<Vec<GameResult>>;

    /// Journal entries inside `range`, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read
    async fn journals_in(&self, range: TimeRange) -> Result<Vec<JournalEntry>>;

    /// Crisis incidents inside `range`, oldest first
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read
    async fn incidents_in(&self, range: TimeRange) -> Result<Vec<CrisisIncident>>;

    /// Every recorded score for one game type
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read
    async fn scores_for(&self, game_type: &str) -> Result<Vec<i64>>;
}
