//! Gemini LLM client implementation (API key authentication).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::super::message::{Message, Role};
use super::{CompletionRequest, GeminiResponse, LlmClient, Usage};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client with API key.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }

    /// The key travels in a header so it never shows up in URLs.
    fn build_url(model: &str) -> String {
        format!("{}/{}:generateContent", GEMINI_API_URL, model)
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                json!({
                    "role": role,
                    "parts": [{"text": m.content}]
                })
            })
            .collect()
    }

    fn system_instruction(messages: &[Message]) -> Option<String> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        }
    }

    fn build_body(request: &CompletionRequest) -> Value {
        let mut body = json!({
            "contents": Self::convert_messages(&request.messages),
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens
            }
        });

        if let Some(system) = Self::system_instruction(&request.messages) {
            body["systemInstruction"] = json!({
                "parts": [{"text": system}]
            });
        }

        body
    }

    fn parse_response(response: &GeminiResponse) -> Result<String> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| Error::Llm("No candidates in response".to_string()))?;

        if let Some(usage) = response.usage_metadata.as_ref().map(Usage::from) {
            debug!(total_tokens = usage.total_tokens, finish_reason = ?candidate.finish_reason, "Gemini usage");
        }

        let text: String = candidate
            .content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        Ok(text)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(Self::build_url(&request.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::build_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(Error::Llm(format!("Gemini API error: {error_text}")));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        Self::parse_response(&gemini_response)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
