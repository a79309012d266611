//! Structured-parse-first command execution

use netscope_core::NetResult;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::pool::WorkerPool;
use crate::session::{ParseOutcome, Session};

/// Note attached to results that fell back to raw text
pub const RAW_FALLBACK_NOTE: &str = "Could not parse, returning raw output";

/// Outcome of running one command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Structured output from the parsing engine
    Parsed(Value),
    /// The parser found nothing to extract; raw device output instead
    RawFallback { raw_output: String },
    /// The command could not be run
    Failed { error: String },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, CommandOutcome::Failed { .. })
    }
}

impl Serialize for CommandOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = match self {
            CommandOutcome::Parsed(data) => json!({ "success": true, "data": data }),
            CommandOutcome::RawFallback { raw_output } => json!({
                "success": true,
                "data": { "raw_output": raw_output },
                "note": RAW_FALLBACK_NOTE,
            }),
            CommandOutcome::Failed { error } => json!({ "success": false, "error": error }),
        };
        body.serialize(serializer)
    }
}

/// Runs commands on sessions through the worker pool
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    pool: Arc<WorkerPool>,
}

impl CommandExecutor {
    pub fn new(pool: Arc<WorkerPool>) -> Self {
        Self { pool }
    }

    /// Ask the parsing engine for structured output
    pub async fn parse(&self, session: &Arc<dyn Session>, command: &str) -> NetResult<ParseOutcome> {
        let session = Arc::clone(session);
        let command = command.to_string();
        self.pool.run("parse", move || session.parse(&command)).await
    }

    /// Fetch raw text output
    pub async fn execute(&self, session: &Arc<dyn Session>, command: &str) -> NetResult<String> {
        let session = Arc::clone(session);
        let command = command.to_string();
        self.pool.run("execute", move || session.execute(&command)).await
    }

    /// Parse `command`, falling back to raw text when nothing was parsed.
    ///
    /// Never fails: faults are reported as [`CommandOutcome::Failed`].
    pub async fn execute_parsed(&self, session: &Arc<dyn Session>, command: &str) -> CommandOutcome {
        match self.parse(session, command).await {
            Ok(ParseOutcome::Parsed(data)) => CommandOutcome::Parsed(data),
            Ok(ParseOutcome::Empty) => {
                debug!(command, "Nothing parsed, falling back to raw output");
                match self.execute(session, command).await {
                    Ok(raw_output) => CommandOutcome::RawFallback { raw_output },
                    Err(e) => {
                        warn!(command, error = %e, "Raw fallback failed");
                        CommandOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                warn!(command, error = %e, "Command failed");
                CommandOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConnector, MockScript};
    use crate::session::Connector;
    use netscope_core::{DeviceDescriptor, NetError};
    use std::time::Duration;

    fn session(script: MockScript) -> (Arc<MockConnector>, Arc<dyn Session>) {
        let connector = Arc::new(MockConnector::new().with_device("rtr1", script));
        let session = connector.open(&DeviceDescriptor::new("rtr1"));
        (connector, session)
    }

    #[tokio::test]
    async fn test_parsed_output() {
        let (connector, session) = session(
            MockScript::new().with_parsed("show version", json!({"version": {"os": "IOS-XE"}})),
        );
        let executor = CommandExecutor::new(Arc::new(WorkerPool::default()));

        let outcome = executor.execute_parsed(&session, "show version").await;
        assert_eq!(outcome, CommandOutcome::Parsed(json!({"version": {"os": "IOS-XE"}})));
        assert_eq!(connector.executes(), 0);
    }

    #[tokio::test]
    async fn test_empty_parse_falls_back_to_raw() {
        let (_, session) = session(
            MockScript::new()
                .with_empty_parse("show version")
                .with_raw("show version", "Cisco IOS Software, Version 15.2"),
        );
        let executor = CommandExecutor::new(Arc::new(WorkerPool::default()));

        let outcome = executor.execute_parsed(&session, "show version").await;
        assert!(outcome.is_success());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": true,
                "data": {"raw_output": "Cisco IOS Software, Version 15.2"},
                "note": "Could not parse, returning raw output"
            })
        );
    }

    #[tokio::test]
    async fn test_failure_carries_no_data() {
        let (_, session) = session(MockScript::new().with_parse_error(
            "show version",
            NetError::Execution("% Invalid input".to_string()),
        ));
        let executor = CommandExecutor::new(Arc::new(WorkerPool::default()));

        let outcome = executor.execute_parsed(&session, "show version").await;
        assert!(!outcome.is_success());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"success": false, "error": "Execution error: % Invalid input"})
        );
    }

    #[tokio::test]
    async fn test_failed_raw_fallback() {
        let (_, session) = session(MockScript::new().with_empty_parse("show version"));
        let executor = CommandExecutor::new(Arc::new(WorkerPool::default()));

        let outcome = executor.execute_parsed(&session, "show version").await;
        assert!(matches!(outcome, CommandOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_timeout_reported_as_failure() {
        let (_, session) = session(
            MockScript::new()
                .with_parsed("show version", json!({}))
                .with_call_delay(Duration::from_millis(300)),
        );
        let executor = CommandExecutor::new(Arc::new(WorkerPool::new(2, Duration::from_millis(20))));

        let outcome = executor.execute_parsed(&session, "show version").await;
        assert_eq!(
            outcome,
            CommandOutcome::Failed {
                error: "parse timed out after 20ms".to_string()
            }
        );
    }
}
