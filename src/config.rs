//! Configuration management
//!
//! Settings live in `~/.argo-agent/config.json`. Environment variables
//! override the file, so a deployment can run with no file at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::ProviderRegistry;
use crate::error::Error;
use crate::rpc::RetryPolicy;
use crate::Result;

/// Where tool calls are answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Forward calls to the tool server over HTTP
    Remote,
    /// Answer calls from built-in sample data
    Simulation,
}

impl std::str::FromStr for ToolMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "remote" => Ok(ToolMode::Remote),
            "simulation" | "simulate" => Ok(ToolMode::Simulation),
            other => Err(Error::Config(format!("Unknown tool mode: {other}"))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider to use ("openai" or "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default)]
    pub gemini_api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_tool_mode")]
    pub tool_mode: ToolMode,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap for the draft call
    #[serde(default = "default_draft_max_tokens")]
    pub draft_max_tokens: u32,

    /// Output token cap for the synthesis call
    #[serde(default = "default_synthesis_max_tokens")]
    pub synthesis_max_tokens: u32,

    /// Dispatch a batch of tool calls concurrently instead of one by one
    #[serde(default)]
    pub parallel_tools: bool,

    /// Tool server configuration (used when tool_mode is "remote")
    #[serde(default)]
    pub mcp: McpConfig,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Tool server connection and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per call, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each further retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl McpConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            endpoint_path: default_endpoint_path(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_tool_mode() -> ToolMode {
    ToolMode::Simulation
}

fn default_temperature() -> f32 {
    0.1
}

fn default_draft_max_tokens() -> u32 {
    1500
}

fn default_synthesis_max_tokens() -> u32 {
    2000
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_server_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_endpoint_path() -> String {
    "/mcp".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            openai_api_key: String::new(),
            gemini_api_key: String::new(),
            model: default_model(),
            tool_mode: default_tool_mode(),
            temperature: default_temperature(),
            draft_max_tokens: default_draft_max_tokens(),
            synthesis_max_tokens: default_synthesis_max_tokens(),
            parallel_tools: false,
            mcp: McpConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// API key for the selected provider
    pub fn api_key(&self) -> &str {
        match self.provider.as_str() {
            "gemini" => &self.gemini_api_key,
            _ => &self.openai_api_key,
        }
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = v;
        }
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = v;
        }
        if let Some(v) = lookup("ARGO_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            self.model = v;
        }
        if let Some(v) = lookup("ARGO_TOOL_MODE") {
            self.tool_mode = v.parse()?;
        }
        if let Some(v) = lookup("MCP_SERVER_URL") {
            self.mcp.server_url = v;
        }
        if let Some(v) = lookup("MCP_TIMEOUT") {
            self.mcp.timeout_secs = parse_number("MCP_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("MCP_MAX_RETRIES") {
            self.mcp.max_retries = parse_number("MCP_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        let providers = ProviderRegistry::available();
        if !providers.contains(&self.provider.as_str()) {
            return Err(Error::Config(format!(
                "Unknown provider: {} (expected one of: {})",
                self.provider,
                providers.join(", ")
            )));
        }

        if self.api_key().is_empty() {
            return Err(Error::Config(format!(
                "No API key set for provider '{}'",
                self.provider
            )));
        }

        if self.mcp.max_retries == 0 {
            return Err(Error::Config("mcp.max_retries must be at least 1".to_string()));
        }

        if self.tool_mode == ToolMode::Remote && self.mcp.server_url.trim().is_empty() {
            return Err(Error::Config("mcp.server_url is required in remote mode".to_string()));
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'")))
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".argo-agent")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from a file
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'argo-agent init' first.",
            path
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise defaults. Environment overrides are
/// applied separately with [`Config::apply_env`].
pub fn load_file_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_from(path)
    } else {
        Ok(Config::default())
    }
}

/// Save configuration to a file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Save configuration to the default file
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}
