//! Error types for argo-agent

use thiserror::Error;

/// Result type alias for argo-agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in argo-agent
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Failed to parse tool call: {0}")]
    Parse(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    #[error("Transport error: {0}")]
    Transport(String),

    /// Every attempt failed; carries the last observed failure.
    #[error("Tool server call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored without its URL, which may carry credentials.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the failure came from an external cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.without_url())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_carries_last_error() {
        let err = Error::RetriesExhausted {
            attempts: 3,
            last_error: "HTTP 503: busy".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tool server call failed after 3 attempts: HTTP 503: busy"
        );
        assert!(!err.is_cancelled());
        assert!(Error::Cancelled.is_cancelled());
    }

    #[tokio::test]
    async fn test_http_error_hides_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/v1/models?key=secret-key")
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("secret-key"));

        let err = Error::from(err);
        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("secret-key"));
    }
}
