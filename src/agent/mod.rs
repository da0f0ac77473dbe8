//! Agent module - conversation handling.
//!
//! This module contains:
//! - Message types
//! - LLM client trait and implementations
//! - Prompt text for the draft and synthesis calls
//! - [`AgentSession`], the per-conversation entry point

mod message;
pub mod prompt;
mod session;

pub mod llm;

pub use llm::{CompletionRequest, GeminiClient, LlmClient, OpenAiClient, ProviderRegistry};
pub use message::{Message, Role};
pub use session::{AgentSession, SessionSettings, Turn};
