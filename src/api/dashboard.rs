//! Dashboard endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::dashboard::{self, DashboardData};

/// Longest window a client may request
const MAX_WINDOW_DAYS: i64 = 365;

/// Build dashboard router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/dashboard_data", get(dashboard_data))
        .with_state(state)
}

/// Optional window override
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub days: Option<i64>,
}

async fn dashboard_data(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardData>, ApiError> {
    let Query(query) = query?;
    let days = query
        .days
        .unwrap_or(state.dashboard_window_days)
        .clamp(1, MAX_WINDOW_DAYS);

    let data = dashboard::load(state.store.as_ref(), Utc::now(), days).await?;
    Ok(Json(data))
}
