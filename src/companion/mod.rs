//! Conversational turn pipeline
//!
//! ```text
//! audio ─▶ transcribe ─▶ crisis screen ─▶ classify emotion ─▶ generate reply ─▶ synthesize
//!                             │                                                    ▲
//!                             └──────────── crisis message ────────────────────────┘
//! ```
//!
//! Provider failures never reach the client: the turn degrades to a fixed
//! fallback reply, which is still spoken.

mod parse;
mod pipeline;
pub mod prompts;

pub use parse::{clean_reply, extract_json, first_sentences, marker_list, marker_value, parse_emotion};
pub use pipeline::{Companion, ReplyKind, Stage, StageFailure, Turn};

/// Reply used whenever a provider fails or returns unusable output
pub const FALLBACK_REPLY: &str = "I'm here to listen. How are you feeling today?";

/// Reply used when the audio contained no recognizable speech
pub const NO_SPEECH_REPLY: &str = "I couldn't quite hear you. Could you say that again?";
