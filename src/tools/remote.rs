//! Remote ARGO tools - forward each call to the tool server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::argo::ArgoTool;
use super::{Arguments, Tool, ToolEnvelope};
use crate::rpc::RpcClient;
use crate::Result;

/// ARGO tool answered by the remote tool server
pub struct RemoteArgoTool {
    tool: ArgoTool,
    client: Arc<RpcClient>,
}

impl RemoteArgoTool {
    pub fn new(tool: ArgoTool, client: Arc<RpcClient>) -> Self {
        Self { tool, client }
    }
}

/// All four remote tools sharing one client
pub fn tools(client: Arc<RpcClient>) -> Vec<Arc<dyn Tool>> {
    ArgoTool::ALL
        .into_iter()
        .map(|t| Arc::new(RemoteArgoTool::new(t, client.clone())) as Arc<dyn Tool>)
        .collect()
}

#[async_trait]
impl Tool for RemoteArgoTool {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn parameters(&self) -> Value {
        self.tool.parameters()
    }

    async fn invoke(&self, arguments: &Arguments) -> Result<ToolEnvelope> {
        self.invoke_cancellable(arguments, &CancellationToken::new())
            .await
    }

    async fn invoke_cancellable(
        &self,
        arguments: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        let mut envelope = self
            .client
            .call_tool_cancellable(self.tool.name(), arguments, cancel)
            .await?;
        if envelope.metadata.is_none() {
            envelope.metadata = Some(Default::default());
        }
        Ok(envelope)
    }
}
