//! argo-agent - tool-calling agent for ARGO oceanographic data
//!
//! This library parses tool directives out of model output, dispatches them
//! to local or remote tool handlers with bounded retries, and feeds the
//! results back to the model for a final answer.

pub mod agent;
pub mod config;
pub mod error;
pub mod rpc;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
