//! LLM client abstraction layer.
//!
//! This module provides:
//! - [`LlmClient`] trait for swappable LLM providers
//! - [`ProviderRegistry`] for creating a client from configuration
//! - Concrete implementations: OpenAI chat completions, Gemini
//!
//! No retry policy lives here; a failed completion is reported to the
//! session as is.

mod types;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Error;
use crate::Result;

pub use types::*;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use super::message::Message;

/// One completion request: the full prompt plus sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// LLM client trait - swappable provider abstraction.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the request and return the completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

#[async_trait]
impl LlmClient for Box<dyn LlmClient> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request).await
    }

    fn default_model(&self) -> &str {
        (**self).default_model()
    }
}

/// Provider registry - creates LLM clients from configuration.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create an LLM client from configuration.
    ///
    /// Supported providers:
    /// - `"openai"`: OpenAI chat completions API
    /// - `"gemini"`: Gemini generateContent API
    pub fn create(config: &Config) -> Result<Box<dyn LlmClient>> {
        match config.provider.as_str() {
            "openai" => Ok(Box::new(OpenAiClient::new(&config.openai_api_key, &config.model))),
            "gemini" => Ok(Box::new(GeminiClient::new(&config.gemini_api_key, &config.model))),
            other => Err(Error::Config(format!(
                "Unknown provider: {other} (expected one of: {})",
                Self::available().join(", ")
            ))),
        }
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["openai", "gemini"]
    }
}

/// Fake LLM client for testing: plays back scripted replies and records
/// every request it receives.
#[cfg(test)]
pub struct FakeLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<std::result::Result<String, String>>>,
    requests: std::sync::Arc<std::sync::Mutex<Vec<CompletionRequest>>>,
}

#[cfg(test)]
impl FakeLlmClient {
    /// Create with predefined text responses.
    pub fn new(responses: Vec<&str>) -> Self {
        Self::scripted(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Create with responses where `Err` entries fail the call.
    pub fn scripted(responses: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            requests: Default::default(),
        }
    }

    /// Handle to the recorded requests.
    pub fn requests(&self) -> std::sync::Arc<std::sync::Mutex<Vec<CompletionRequest>>> {
        self.requests.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(Error::Llm(e)),
            None => Err(Error::Llm("No more fake responses".to_string())),
        }
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "fake-model".to_string(),
            messages: vec![Message::user("hi")],
            temperature: 0.1,
            max_output_tokens: 10,
        }
    }

    #[tokio::test]
    async fn test_fake_llm_client() {
        let client = FakeLlmClient::new(vec!["Hello!", "World!"]);

        assert_eq!(client.complete(&request()).await.unwrap(), "Hello!");
        assert_eq!(client.complete(&request()).await.unwrap(), "World!");
        assert!(client.complete(&request()).await.is_err());
        assert_eq!(client.requests().lock().unwrap().len(), 3);
    }

    #[test]
    fn test_registry_creates_configured_provider() {
        let mut config = Config::default();
        config.model = "gemini-2.0-flash".to_string();
        config.provider = "gemini".to_string();
        let client = ProviderRegistry::create(&config).unwrap();
        assert_eq!(client.default_model(), "gemini-2.0-flash");

        config.provider = "other".to_string();
        assert!(ProviderRegistry::create(&config).is_err());
    }
}
