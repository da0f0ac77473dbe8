//! Agent session - owns one conversation and runs its turns.
//!
//! A turn has up to three phases: a draft completion, execution of any tool
//! directives found in the draft, and a synthesis completion over the tool
//! results. Only the user message and the final answer are kept in history.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{Config, ToolMode};
use crate::error::Error;
use crate::rpc::RpcClient;
use crate::tools::{ToolCall, ToolCallParser, ToolDispatcher, ToolRegistry, ToolResult};
use crate::Result;

use super::llm::{CompletionRequest, LlmClient};
use super::message::Message;
use super::prompt;

/// Model settings used for every completion in a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: String,
    pub temperature: f32,
    pub draft_max_tokens: u32,
    pub synthesis_max_tokens: u32,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            draft_max_tokens: config.draft_max_tokens,
            synthesis_max_tokens: config.synthesis_max_tokens,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What happened during one turn. Intermediate data is reported here but
/// never stored in history.
#[derive(Debug, Clone)]
pub struct Turn {
    pub answer: String,
    pub calls: Vec<ToolCall>,
    pub results: Vec<ToolResult>,
}

impl Turn {
    pub fn used_tools(&self) -> bool {
        !self.calls.is_empty()
    }
}

/// One logical conversation. Turns take `&mut self`, so a session is
/// driven by one caller at a time; separate sessions share nothing but the
/// read-only tool registry.
pub struct AgentSession<C: LlmClient> {
    id: Uuid,
    client: C,
    dispatcher: ToolDispatcher,
    system_prompt: String,
    settings: SessionSettings,
    history: Vec<Message>,
}

impl<C: LlmClient> AgentSession<C> {
    /// Create a session
    pub fn new(
        client: C,
        dispatcher: ToolDispatcher,
        system_prompt: impl Into<String>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            dispatcher,
            system_prompt: system_prompt.into(),
            settings,
            history: Vec::new(),
        }
    }

    /// Create a session with the tool registry selected by `config.tool_mode`
    pub fn from_config(client: C, config: &Config) -> Result<Self> {
        let registry = match config.tool_mode {
            ToolMode::Simulation => ToolRegistry::simulation(),
            ToolMode::Remote => ToolRegistry::remote(Arc::new(RpcClient::from_config(&config.mcp)?)),
        };
        info!(mode = ?config.tool_mode, tools = ?registry.tool_names(), "Tool registry ready");
        let system_prompt = prompt::system_prompt(&registry.definitions());
        let dispatcher = ToolDispatcher::new(registry).parallel(config.parallel_tools);

        Ok(Self::new(
            client,
            dispatcher,
            system_prompt,
            SessionSettings::from_config(config),
        ))
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Answer a query. Failures come back as a diagnostic message, never as
    /// an error, and the session stays usable.
    pub async fn process_query(&mut self, query: &str) -> String {
        match self.run_turn(query).await {
            Ok(turn) => turn.answer,
            Err(e) => {
                error!(session = %self.id, "Error processing query: {}", e);
                format!("I encountered an error while processing your query: {e}")
            }
        }
    }

    /// Run one turn and report its intermediate steps.
    ///
    /// On error the user message stays in history and no assistant message
    /// is added.
    pub async fn run_turn(&mut self, query: &str) -> Result<Turn> {
        self.run_turn_cancellable(query, &CancellationToken::new())
            .await
    }

    /// Run one turn under `cancel`.
    ///
    /// Tool calls in flight when the token fires come back as cancelled
    /// failures, and the turn ends with [`Error::Cancelled`] instead of a
    /// synthesis call.
    pub async fn run_turn_cancellable(&mut self, query: &str, cancel: &CancellationToken) -> Result<Turn> {
        info!(session = %self.id, "Processing query: {}", query);
        self.history.push(Message::user(query));

        let draft = self
            .complete(Vec::new(), self.settings.draft_max_tokens)
            .await?;

        let calls = ToolCallParser::parse(&draft);
        if calls.is_empty() {
            if ToolCallParser::contains_directive(&draft) {
                warn!(session = %self.id, "Draft has tool markers but no usable directive");
            }
            debug!(session = %self.id, "Draft has no tool calls, returning it directly");
            self.history.push(Message::assistant(draft.clone()));
            return Ok(Turn {
                answer: draft,
                calls,
                results: Vec::new(),
            });
        }

        let results = self.dispatcher.dispatch_all_cancellable(&calls, cancel).await;
        let failed = results.iter().filter(|r| !r.success).count();
        info!(session = %self.id, calls = calls.len(), failed, "Tool phase finished");

        if cancel.is_cancelled() {
            warn!(session = %self.id, "Turn cancelled during the tool phase");
            return Err(Error::Cancelled);
        }

        let synthesis = prompt::synthesis_prompt(&results)?;
        let answer = self
            .complete(vec![Message::user(synthesis)], self.settings.synthesis_max_tokens)
            .await?;

        info!(session = %self.id, "Turn completed with response: {} chars", answer.len());
        self.history.push(Message::assistant(answer.clone()));

        Ok(Turn {
            answer,
            calls,
            results,
        })
    }

    async fn complete(&self, extra: Vec<Message>, max_output_tokens: u32) -> Result<String> {
        let mut messages = Vec::with_capacity(self.history.len() + extra.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(self.history.iter().cloned());
        messages.extend(extra);

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_output_tokens,
        };
        self.client.complete(&request).await
    }
}
