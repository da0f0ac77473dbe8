//! Transport for tool server calls: request envelope, per-attempt errors,
//! and the reqwest-backed HTTP session.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::policy::RetryPolicy;
use crate::error::Error;
use crate::tools::Arguments;
use crate::Result;

/// Method name of the tool invocation request
pub const TOOLS_CALL: &str = "tools/call";

/// Request envelope: `{"method": "tools/call", "params": {"name", "arguments"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    pub params: ToolCallParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Arguments,
}

impl RpcRequest {
    pub fn tools_call(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            method: TOOLS_CALL.to_string(),
            params: ToolCallParams {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Why a single attempt failed. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// An open connection to the tool server, scoped to one logical call.
#[async_trait]
pub trait RpcSession: Send + Sync {
    /// Submit one request and return the parsed 2xx JSON body.
    async fn send(&self, request: &RpcRequest) -> std::result::Result<Value, AttemptError>;
}

/// Opens sessions. The client opens one per call and drops it before
/// returning.
pub trait Connector: Send + Sync {
    fn connect(&self, policy: &RetryPolicy) -> Result<Box<dyn RpcSession>>;
}

/// HTTP connector posting JSON to `<base_url><path>`
#[derive(Debug, Clone)]
pub struct HttpConnector {
    url: String,
}

impl HttpConnector {
    pub fn new(base_url: &str, path: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };
        Self { url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for HttpConnector {
    fn connect(&self, policy: &RetryPolicy) -> Result<Box<dyn RpcSession>> {
        let client = reqwest::Client::builder()
            .timeout(policy.timeout())
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        debug!(url = %self.url, "Opened tool server session");
        Ok(Box::new(HttpSession {
            client,
            url: self.url.clone(),
        }))
    }
}

/// One reqwest client; its connection pool lives as long as the session.
struct HttpSession {
    client: reqwest::Client,
    url: String,
}

#[async_trait]
impl RpcSession for HttpSession {
    async fn send(&self, request: &RpcRequest) -> std::result::Result<Value, AttemptError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| if e.is_timeout() { classify(e) } else { AttemptError::Decode(e.to_string()) })
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        debug!(url = %self.url, "Closed tool server session");
    }
}

fn classify(e: reqwest::Error) -> AttemptError {
    if e.is_timeout() {
        AttemptError::Network(format!("request timed out: {e}"))
    } else {
        AttemptError::Network(e.to_string())
    }
}
