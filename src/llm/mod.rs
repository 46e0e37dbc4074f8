//! Generative language adapters

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::Result;

/// One prompt sent to a language model
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System instruction, if the provider supports one
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Ask the provider for a JSON document instead of prose
    pub json: bool,
}

impl GenerationRequest {
    /// Prose request with default sampling
    #[must_use]
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.7,
            max_output_tokens: 256,
            json: false,
        }
    }

    /// Deterministic JSON request
    #[must_use]
    pub fn json(prompt: impl Into<String>) -> Self {
        Self {
            temperature: 0.0,
            json: true,
            ..Self::text(prompt)
        }
    }

    /// Set the system instruction
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Override sampling parameters
    #[must_use]
    pub const fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// Text generation provider
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate text for a request
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Llm`] on provider failure and
    /// [`crate::Error::Malformed`] when the response carries no text
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
