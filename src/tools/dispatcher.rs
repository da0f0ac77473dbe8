//! Tool dispatcher - routes parsed calls to registered tools

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ToolCall, ToolRegistry, ToolResult};
use crate::error::Error;

/// Executes tool calls against a registry. Every call yields exactly one
/// [`ToolResult`]; handler failures are turned into failed results and never
/// propagate.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: ToolRegistry,
    parallel: bool,
}

impl ToolDispatcher {
    /// Sequential dispatcher over `registry`
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            parallel: false,
        }
    }

    /// Run the calls of a batch concurrently. Results keep call order and a
    /// failing call does not affect the others.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute one call
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        self.dispatch_cancellable(call, &CancellationToken::new())
            .await
    }

    /// Execute one call; a fired `cancel` yields a failed result carrying
    /// [`Error::Cancelled`].
    pub async fn dispatch_cancellable(&self, call: &ToolCall, cancel: &CancellationToken) -> ToolResult {
        let Some(tool) = self.registry.get(&call.tool_name) else {
            warn!(call_id = %call.call_id, "Unknown tool requested: {}", call.tool_name);
            return ToolResult::failure(&call.call_id, Error::UnknownTool(call.tool_name.clone()).to_string());
        };

        let definition = tool.to_definition();
        if let Err(e) = definition.validate(&call.arguments) {
            warn!(call_id = %call.call_id, "Rejected tool call: {}", e);
            return ToolResult::failure(&call.call_id, e.to_string());
        }
        let arguments = definition.with_defaults(&call.arguments);

        debug!(call_id = %call.call_id, tool = %call.tool_name, "Dispatching tool call");

        match tool.invoke_cancellable(&arguments, cancel).await {
            Ok(envelope) => {
                let result = ToolResult::from_envelope(&call.call_id, envelope);
                if result.success {
                    debug!(call_id = %call.call_id, "Tool {} succeeded", call.tool_name);
                } else {
                    warn!(call_id = %call.call_id, "Tool {} reported an error: {:?}", call.tool_name, result.error);
                }
                result
            }
            Err(e) => {
                warn!(call_id = %call.call_id, "Tool {} failed: {}", call.tool_name, e);
                ToolResult::failure(&call.call_id, e.to_string())
            }
        }
    }

    /// Execute a batch, one result per call, in call order
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        self.dispatch_all_cancellable(calls, &CancellationToken::new())
            .await
    }

    /// Execute a batch under `cancel`. Every call still gets a result; the
    /// ones cut short report `Operation cancelled`.
    pub async fn dispatch_all_cancellable(
        &self,
        calls: &[ToolCall],
        cancel: &CancellationToken,
    ) -> Vec<ToolResult> {
        info!(count = calls.len(), parallel = self.parallel, "Executing tool calls");

        if self.parallel {
            return join_all(calls.iter().map(|call| self.dispatch_cancellable(call, cancel))).await;
        }

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.dispatch_cancellable(call, cancel).await);
        }
        results
    }
}
