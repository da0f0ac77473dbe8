//! Resilient client for the remote tool server.
//!
//! [`RpcClient::call_tool`] wraps one invocation in a `tools/call` envelope
//! and retries it under a [`RetryPolicy`]: non-2xx statuses, transport
//! errors, undecodable bodies and per-attempt timeouts all count as failed
//! attempts. Waits between attempts double each time and go through an
//! injectable [`Sleeper`].

mod clock;
mod policy;
mod transport;

pub use clock::{RecordingSleeper, Sleeper, TokioSleeper};
pub use policy::RetryPolicy;
pub use transport::{
    AttemptError, Connector, HttpConnector, RpcRequest, RpcSession, ToolCallParams, TOOLS_CALL,
};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::McpConfig;
use crate::error::Error;
use crate::tools::{Arguments, ToolEnvelope};
use crate::Result;

/// Tool server client with bounded retries and exponential backoff
pub struct RpcClient {
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RpcClient {
    /// Create a client over any connector
    pub fn new(connector: impl Connector + 'static, policy: RetryPolicy) -> Self {
        Self {
            connector: Arc::new(connector),
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Create an HTTP client from the tool server configuration
    pub fn from_config(config: &McpConfig) -> Result<Self> {
        let connector = HttpConnector::new(&config.server_url, &config.endpoint_path);
        Ok(Self::new(connector, config.retry_policy()?))
    }

    /// Replace the backoff sleeper
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `name` on the tool server.
    pub async fn call_tool(&self, name: &str, arguments: &Arguments) -> Result<ToolEnvelope> {
        self.call_tool_cancellable(name, arguments, &CancellationToken::new())
            .await
    }

    /// Invoke `name`, abandoning the call as soon as `cancel` fires.
    ///
    /// Returns [`Error::Cancelled`] on cancellation and
    /// [`Error::RetriesExhausted`] once every attempt has failed.
    pub async fn call_tool_cancellable(
        &self,
        name: &str,
        arguments: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<ToolEnvelope> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = RpcRequest::tools_call(name, arguments.clone());
        let session = self.connector.connect(&self.policy)?;
        let max_attempts = self.policy.max_attempts();
        let mut last_error: Option<AttemptError> = None;

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.policy.delay_for(attempt - 1);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!(tool = name, "Tool call cancelled during backoff");
                        return Err(Error::Cancelled);
                    }
                    _ = self.sleeper.sleep(delay) => {}
                }
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(tool = name, attempt = attempt + 1, "Tool call cancelled in flight");
                    return Err(Error::Cancelled);
                }
                outcome = self.attempt(session.as_ref(), &request) => outcome,
            };

            match outcome {
                Ok(envelope) => {
                    debug!(tool = name, attempt = attempt + 1, "Tool call succeeded");
                    return Ok(envelope);
                }
                Err(e) => {
                    if attempt + 1 < max_attempts {
                        warn!(
                            tool = name,
                            attempt = attempt + 1,
                            delay_ms = self.policy.delay_for(attempt).as_millis() as u64,
                            "Tool call failed, retrying: {}", e
                        );
                    } else {
                        warn!(tool = name, attempt = attempt + 1, "Tool call failed: {}", e);
                    }
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        error!(tool = name, attempts = max_attempts, "Tool call exhausted retries: {}", last_error);

        Err(Error::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    async fn attempt(
        &self,
        session: &dyn RpcSession,
        request: &RpcRequest,
    ) -> std::result::Result<ToolEnvelope, AttemptError> {
        let timeout = self.policy.timeout();
        let body = tokio::time::timeout(timeout, session.send(request))
            .await
            .map_err(|_| AttemptError::Timeout(timeout))??;

        serde_json::from_value(body).map_err(|e| AttemptError::Decode(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::testing::{ScriptedConnector, Step};
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_secs(1), Duration::from_millis(50)).unwrap()
    }

    fn ok_body() -> Step {
        Step::Reply(Ok(json!({"success": true, "data": {"rows": 3}})))
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let mut steps = ScriptedConnector::failing(2);
        steps.push(ok_body());
        let connector = ScriptedConnector::new(steps);
        let counters = connector.counters.clone();
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = RpcClient::new(connector, policy(3)).with_sleeper(sleeper.clone());

        let envelope = client.call_tool("queryARGO", &Arguments::new()).await.unwrap();

        assert!(envelope.success);
        assert_eq!(envelope.data, Some(json!({"rows": 3})));
        assert!(envelope.error.is_none());
        assert_eq!(counters.sends(), 3);
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let connector = ScriptedConnector::new(ScriptedConnector::failing(5));
        let counters = connector.counters.clone();
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = RpcClient::new(connector, policy(3)).with_sleeper(sleeper.clone());

        let err = client.call_tool("queryARGO", &Arguments::new()).await.unwrap_err();

        match err {
            Error::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "HTTP 503: unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(counters.sends(), 3);
        assert_eq!(sleeper.total(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_session_released_on_success_and_failure() {
        let mut steps = vec![ok_body()];
        steps.extend(ScriptedConnector::failing(1));
        let connector = ScriptedConnector::new(steps);
        let counters = connector.counters.clone();
        let client = RpcClient::new(connector, policy(1)).with_sleeper(RecordingSleeper::new());

        client.call_tool("a", &Arguments::new()).await.unwrap();
        client.call_tool("b", &Arguments::new()).await.unwrap_err();

        assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failed_attempt() {
        let connector = ScriptedConnector::new(vec![Step::Hang, ok_body()]);
        let counters = connector.counters.clone();
        let client = RpcClient::new(connector, policy(2)).with_sleeper(RecordingSleeper::new());

        let envelope = client.call_tool("queryARGO", &Arguments::new()).await.unwrap();

        assert!(envelope.success);
        assert_eq!(counters.sends(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_retried() {
        let connector = ScriptedConnector::new(vec![Step::Reply(Ok(json!([1, 2, 3]))), ok_body()]);
        let counters = connector.counters.clone();
        let client = RpcClient::new(connector, policy(2)).with_sleeper(RecordingSleeper::new());

        assert!(client.call_tool("queryARGO", &Arguments::new()).await.is_ok());
        assert_eq!(counters.sends(), 2);
    }

    #[tokio::test]
    async fn test_application_error_is_returned_not_retried() {
        let connector = ScriptedConnector::new(vec![Step::Reply(Ok(
            json!({"success": false, "error": "syntax error at SELEC"}),
        ))]);
        let counters = connector.counters.clone();
        let client = RpcClient::new(connector, policy(3)).with_sleeper(RecordingSleeper::new());

        let envelope = client.call_tool("queryARGO", &Arguments::new()).await.unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("syntax error at SELEC"));
        assert_eq!(counters.sends(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_makes_no_call() {
        let connector = ScriptedConnector::new(vec![ok_body()]);
        let counters = connector.counters.clone();
        let client = RpcClient::new(connector, policy(3));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .call_tool_cancellable("queryARGO", &Arguments::new(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(counters.sends(), 0);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 0);
    }

    /// Fires the token when asked to wait, then never wakes.
    struct CancellingSleeper(CancellationToken);

    #[async_trait]
    impl Sleeper for CancellingSleeper {
        async fn sleep(&self, _duration: Duration) {
            self.0.cancel();
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_is_distinct_from_exhaustion() {
        let connector = ScriptedConnector::new(ScriptedConnector::failing(3));
        let counters = connector.counters.clone();
        let cancel = CancellationToken::new();
        let client = RpcClient::new(connector, policy(3))
            .with_sleeper(CancellingSleeper(cancel.clone()));

        let err = client
            .call_tool_cancellable("queryARGO", &Arguments::new(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(counters.sends(), 1);
        assert_eq!(counters.drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_attempt_in_flight() {
        let connector = ScriptedConnector::new(vec![Step::Hang]);
        let cancel = CancellationToken::new();
        let policy = RetryPolicy::new(3, Duration::ZERO, Duration::from_secs(60)).unwrap();
        let client = RpcClient::new(connector, policy);

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = client
            .call_tool_cancellable("queryARGO", &Arguments::new(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
