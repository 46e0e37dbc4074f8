//! Journal analysis endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use super::{ApiError, ApiState};
use crate::journal::{JournalAnalysis, JournalSubmission};

/// Build journal router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/analyze_journal", post(analyze_journal))
        .with_state(state)
}

async fn analyze_journal(
    State(state): State<Arc<ApiState>>,
    submission: Result<Json<JournalSubmission>, JsonRejection>,
) -> Result<Json<JournalAnalysis>, ApiError> {
    let Json(submission) = submission?;
    if submission.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }

    let analysis = state.journal.analyze(submission).await?;
    Ok(Json(analysis))
}
