//! HTTP API server for haven gateway

pub mod chat;
pub mod dashboard;
pub mod games;
pub mod health;
pub mod journal;
pub mod rate_limit;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::companion::Companion;
use crate::journal::JournalAnalyzer;
use crate::store::RecordStore;

/// Default dashboard window
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub companion: Arc<Companion>,
    pub journal: Arc<JournalAnalyzer>,
    pub store: Arc<dyn RecordStore>,
    pub dashboard_window_days: i64,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    companion: Arc<Companion>,
    journal: Arc<JournalAnalyzer>,
    store: Arc<dyn RecordStore>,
    port: u16,
    cors_origins: Vec<String>,
    rate_limit_rpm: Option<u32>,
    dashboard_window_days: i64,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(
        companion: Arc<Companion>,
        journal: Arc<JournalAnalyzer>,
        store: Arc<dyn RecordStore>,
        port: u16,
    ) -> Self {
        Self {
            companion,
            journal,
            store,
            port,
            cors_origins: Vec::new(),
            rate_limit_rpm: None,
            dashboard_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    /// Allowed CORS origins; empty allows any
    #[must_use]
    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Global requests-per-minute cap
    #[must_use]
    pub const fn rate_limit_rpm(mut self, rpm: Option<u32>) -> Self {
        self.rate_limit_rpm = rpm;
        self
    }

    #[must_use]
    pub const fn dashboard_window_days(mut self, days: i64) -> Self {
        self.dashboard_window_days = days;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let state = Arc::new(ApiState {
            companion: self.companion,
            journal: self.journal,
            store: self.store,
            dashboard_window_days: self.dashboard_window_days,
            rate_limiter: self.rate_limit_rpm.map(rate_limit::create_limiter),
        });

        ApiServer {
            state,
            port: self.port,
            cors_origins: self.cors_origins,
        }
    }
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    cors_origins: Vec<String>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(chat::router(self.state.clone()))
            .merge(games::router(self.state.clone()))
            .merge(journal::router(self.state.clone()))
            .merge(dashboard::router(self.state.clone()))
            .merge(health::router());

        let router = router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            rate_limit::rate_limit_middleware,
        ));

        router.layer(self.cors()).layer(TraceLayer::new_for_http())
    }

    fn cors(&self) -> CorsLayer {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        if origins.is_empty() {
            cors.allow_origin(Any)
        } else {
            cors.allow_origin(AllowOrigin::list(origins))
        }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        if self.state.rate_limiter.is_some() {
            tracing::info!("rate limiting active");
        }

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
            tracing::error!(%addr, error = %e, "failed to bind API server");
        })?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router()).await?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Errors surfaced to HTTP clients as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    RateLimited,
    Internal(String),
}

impl From<crate::Error> for ApiError {
    fn from(e: crate::Error) -> Self {
        tracing::error!(error = %e, "request failed");
        Self::Internal("internal error".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Error body shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "too many requests".to_string()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
