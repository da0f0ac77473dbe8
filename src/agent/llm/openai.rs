//! OpenAI chat completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::{ChatCompletionResponse, CompletionRequest, LlmClient};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI API client using bearer authentication.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl OpenAiClient {
    /// Create a new OpenAI client with API key.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: OPENAI_API_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens
        })
    }

    fn parse_response(response: ChatCompletionResponse) -> Result<String> {
        if let Some(usage) = &response.usage {
            debug!(total_tokens = usage.total_tokens, "OpenAI usage");
        }

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("No choices in response".to_string()))?;
        debug!(finish_reason = ?choice.finish_reason, "OpenAI completion finished");

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(Error::Llm(format!("OpenAI API error ({status}): {error_text}")));
        }

        let body: ChatCompletionResponse = response.json().await?;
        Self::parse_response(body)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
