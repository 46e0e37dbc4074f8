//! Crisis alert delivery

use std::time::Duration;

use async_trait::async_trait;

use super::CrisisIncident;
use crate::{Error, Result};

/// Receives crisis incidents for a human operator
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver an incident
    ///
    /// # Errors
    ///
    /// Returns error if delivery fails; callers log and continue
    async fn notify(&self, incident: &CrisisIncident) -> Result<()>;

    /// Sink name for logging
    fn name(&self) -> &'static str;
}

/// Writes incidents to the structured log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, incident: &CrisisIncident) -> Result<()> {
        tracing::warn!(
            source = ?incident.source,
            severity = ?incident.severity,
            keyword = %incident.keyword,
            detected_at = %incident.detected_at,
            "crisis incident"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Posts incidents as JSON to an operator webhook
pub struct WebhookAlertSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookAlertSink {
    /// Create a webhook sink
    ///
    /// # Errors
    ///
    /// Returns error if the URL is empty or the HTTP client cannot be built
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::Config("alert webhook URL is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn notify(&self, incident: &CrisisIncident) -> Result<()> {
        // Log locally as well so incidents survive webhook outages
        LogAlertSink.notify(incident).await?;

        let response = self
            .client
            .post(&self.url)
            .json(incident)
            .send()
            .await
            .map_err(|e| Error::Alert(format!("webhook request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Alert(format!("webhook error {status}: {body}")));
        }

        tracing::debug!(url = %self.url, "crisis alert delivered");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
