//! Game result endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::games::{self, GameFeedback};
use crate::store::GameResult;

/// Game type assumed when the client omits one
const DEFAULT_GAME_TYPE: &str = "reaction";

/// Build games router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/analyze_game", post(analyze_game))
        .with_state(state)
}

/// Accepts both the compact `{score, reactionTime, timestamp}` shape and the
/// full snake_case shape
#[derive(Debug, Deserialize)]
pub struct GameRequest {
    #[serde(default, alias = "gameType")]
    pub game_type: Option<String>,
    pub score: i64,
    /// Milliseconds
    #[serde(default, alias = "reactionTime", alias = "reaction_time_ms")]
    pub reaction_time: f64,
    #[serde(default, alias = "emotionsRecognized")]
    pub emotions_recognized: Vec<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl GameRequest {
    fn into_result(self) -> Result<GameResult, ApiError> {
        if !self.reaction_time.is_finite() || self.reaction_time < 0.0 {
            return Err(ApiError::BadRequest("reactionTime must be a non-negative number".to_string()));
        }

        let game_type = self
            .game_type
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_GAME_TYPE.to_string());

        Ok(GameResult {
            game_type,
            score: self.score,
            reaction_time_ms: self.reaction_time,
            emotions_recognized: self.emotions_recognized,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

async fn analyze_game(
    State(state): State<Arc<ApiState>>,
    request: Result<Json<GameRequest>, JsonRejection>,
) -> Result<Json<GameFeedback>, ApiError> {
    let Json(request) = request?;
    let result = request.into_result()?;
    let feedback = games::analyze_game(state.store.as_ref(), result).await?;
    Ok(Json(feedback))
}
