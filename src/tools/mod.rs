//! Tools module - data-retrieval capabilities the model can request
//!
//! The model asks for a tool by embedding a directive in its reply. The
//! [`ToolCallParser`] pulls those directives out, the [`ToolDispatcher`]
//! routes each one to a registered [`Tool`], and every call comes back as a
//! [`ToolResult`] envelope.

pub mod argo;
mod dispatcher;
mod parser;
mod registry;
pub mod remote;
pub mod simulation;

pub use dispatcher::ToolDispatcher;
pub use parser::{Segment, ToolCallParser, DIRECTIVE_MARKER};
pub use registry::{ToolDefinition, ToolRegistry};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::Result;

/// Tool arguments as sent by the model: a JSON object.
pub type Arguments = Map<String, Value>;

/// A tool invocation extracted from model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Arguments,
    pub call_id: String,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments, call_id: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            call_id: call_id.into(),
        }
    }
}

/// Response body returned by a tool handler or the remote tool server.
///
/// Missing fields take the server's defaults: `success` is assumed true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    #[serde(default = "default_success")]
    pub success: bool,

    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

fn default_success() -> bool {
    true
}

impl ToolEnvelope {
    /// Successful envelope carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: None,
        }
    }

    /// Failed envelope carrying an application-level error.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Outcome of one tool call. Exactly one of `data`/`error` is meaningful,
/// selected by `success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ToolResult {
    /// Failed result for `call_id`.
    pub fn failure(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Attach a handler envelope to `call_id`.
    pub fn from_envelope(call_id: impl Into<String>, envelope: ToolEnvelope) -> Self {
        if envelope.success {
            Self {
                call_id: call_id.into(),
                success: true,
                data: envelope.data,
                error: None,
                metadata: envelope.metadata,
            }
        } else {
            let error = envelope
                .error
                .unwrap_or_else(|| "Tool reported failure without an error message".to_string());
            Self {
                call_id: call_id.into(),
                success: false,
                data: None,
                error: Some(error),
                metadata: envelope.metadata,
            }
        }
    }

    /// Compact form handed back to the model: data and metadata for
    /// successes, only the error for failures.
    pub fn summary(&self) -> Value {
        if self.success {
            serde_json::json!({
                "call_id": self.call_id,
                "success": true,
                "data": self.data,
                "metadata": self.metadata,
            })
        } else {
            serde_json::json!({
                "call_id": self.call_id,
                "success": false,
                "error": self.error,
            })
        }
    }
}

/// Tool trait - one named capability the dispatcher can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in directives
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for arguments. `required` and per-property `default`
    /// entries are enforced by the dispatcher.
    fn parameters(&self) -> Value;

    /// Invoke the tool with already-validated arguments
    async fn invoke(&self, arguments: &Arguments) -> Result<ToolEnvelope>;

    /// Invoke, giving up with [`Error::Cancelled`] once `cancel` fires.
    ///
    /// The default races [`Tool::invoke`] against the token. Tools that can
    /// stop their own work earlier override this.
    async fn invoke_cancellable(
        &self,
        arguments: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.invoke(arguments) => result,
        }
    }

    /// Convert to a tool definition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_defaults_to_success() {
        let envelope: ToolEnvelope = serde_json::from_value(json!({"data": [1, 2]})).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(json!([1, 2])));
    }

    #[test]
    fn test_failed_envelope_drops_data() {
        let envelope = ToolEnvelope {
            success: false,
            data: Some(json!({"partial": true})),
            error: None,
            metadata: None,
        };
        let result = ToolResult::from_envelope("c1", envelope);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert!(result.error.is_some());
    }

    #[test]
    fn test_summary_of_failure_has_only_error() {
        let summary = ToolResult::failure("c2", "Unknown tool: x").summary();
        assert_eq!(summary, json!({"call_id": "c2", "success": false, "error": "Unknown tool: x"}));
    }
}
