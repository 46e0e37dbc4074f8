//! Gateway - wires providers, safety, and storage into the HTTP server

use std::sync::Arc;

use crate::api::{ApiServer, ApiServerBuilder};
use crate::companion::Companion;
use crate::journal::JournalAnalyzer;
use crate::llm::{GeminiClient, LanguageModel};
use crate::safety::{AlertSink, CrisisFilter, LogAlertSink, SafetyNet, WebhookAlertSink};
use crate::store::{MemoryStore, RecordStore};
use crate::voice::{SpeechToText, Synthesizer, TextToSpeech, Transcriber};
use crate::{Config, Error, Result};

/// The Haven gateway service
pub struct Gateway {
    config: Config,
    server: ApiServer,
}

impl Gateway {
    /// Build every adapter from configuration
    ///
    /// # Errors
    ///
    /// Returns error if a required API key is missing or an HTTP client
    /// cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let timeout = config.provider_timeout;
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

        let alerts: Arc<dyn AlertSink> = match &config.safety.alert_webhook_url {
            Some(url) => Arc::new(WebhookAlertSink::new(url.clone(), timeout)?),
            None => Arc::new(LogAlertSink),
        };
        let alert_sink = alerts.name();
        let filter = CrisisFilter::new(&config.safety.extra_keywords);
        let safety = SafetyNet::new(filter, alerts, store.clone());

        let google_key = config
            .api_keys
            .google
            .clone()
            .ok_or_else(|| Error::Config("GOOGLE_API_KEY is required for the language model".to_string()))?;
        let model: Arc<dyn LanguageModel> =
            Arc::new(GeminiClient::new(google_key, config.llm.model.clone(), timeout)?);
        let transcriber: Arc<dyn Transcriber> =
            Arc::new(SpeechToText::from_config(&config.voice, &config.api_keys, timeout)?);
        let synthesizer: Arc<dyn Synthesizer> =
            Arc::new(TextToSpeech::from_config(&config.voice, &config.api_keys, timeout)?);

        tracing::info!(
            stt = transcriber.name(),
            llm = model.name(),
            tts = synthesizer.name(),
            alerts = alert_sink,
            "providers configured"
        );

        let companion = Companion::new(transcriber, model.clone(), synthesizer, safety.clone())
            .with_timeout(timeout)
            .with_sampling(config.llm.temperature, config.llm.max_output_tokens);
        let journal = JournalAnalyzer::new(model, safety, store.clone(), timeout);

        let server = ApiServerBuilder::new(
            Arc::new(companion),
            Arc::new(journal),
            store,
            config.api_server.port,
        )
        .cors_origins(config.api_server.cors_origins.clone())
        .rate_limit_rpm(config.api_server.rate_limit_rpm)
        .dashboard_window_days(config.dashboard_window_days)
        .build();

        Ok(Self { config, server })
    }

    /// Serve until the server fails or Ctrl-C is received
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            port = self.config.api_server.port,
            timeout_secs = self.config.provider_timeout.as_secs(),
            window_days = self.config.dashboard_window_days,
            "haven gateway starting"
        );

        tokio::select! {
            result = self.server.run() => result?,
            _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
        }

        tracing::info!("gateway stopped");
        Ok(())
    }
}
