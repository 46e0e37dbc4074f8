//! Haven Gateway - voice companion backend
//!
//! This library provides the core functionality for the Haven gateway:
//! - Voice turns (speech recognition, empathetic replies, speech synthesis)
//! - Crisis keyword screening with operator alerts
//! - Journal and mini-game analysis
//! - Wellbeing dashboard aggregation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    HTTP API                          │
//! │  chat_ai │ analyze_game │ analyze_journal │ dashboard│
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Haven Gateway                        │
//! │  Companion │ SafetyNet │ JournalAnalyzer │ Store     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Cloud providers                      │
//! │  Speech-to-Text  │  Gemini  │  Text-to-Speech        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod companion;
pub mod config;
pub mod dashboard;
pub mod emotion;
pub mod error;
pub mod games;
pub mod gateway;
pub mod journal;
pub mod llm;
pub mod safety;
pub mod store;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use companion::{Companion, ReplyKind, Stage, StageFailure, Turn};
pub use config::Config;
pub use emotion::Emotion;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use journal::{JournalAnalysis, JournalAnalyzer, JournalSubmission, RiskLevel, Sentiment};
pub use safety::{AlertSink, CrisisFilter, CrisisIncident, SafetyNet};
pub use store::{GameResult, JournalEntry, MemoryStore, RecordStore, TimeRange};
