//! Sessions backed by an external driver program
//!
//! The driver performs the vendor CLI interaction and parsing. It is invoked
//! once per call as `program [args..] <verb> [command]`, where verb is one of
//! `connect`, `disconnect`, `parse` or `execute`, with the device described by
//! the `NETSCOPE_DEVICE`, `NETSCOPE_HOST`, `NETSCOPE_OS` and `NETSCOPE_TYPE`
//! environment variables.
//!
//! Exit status 0 means success: `parse` prints a JSON document, `execute`
//! prints raw device output. `parse` exits with `empty_parse_exit_code` when
//! the output held nothing to extract. Any call may exit with
//! `session_lost_exit_code` to report that the device connection dropped.

use netscope_core::{DeviceDescriptor, NetError, NetResult};
use serde::{Deserialize, Serialize};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::session::{Connector, ParseOutcome, Session};

/// Driver program configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Program to run
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the verb
    #[serde(default)]
    pub args: Vec<String>,
    /// Exit status meaning "parsed, but nothing to extract"
    #[serde(default = "default_empty_parse_exit_code")]
    pub empty_parse_exit_code: i32,
    /// Exit status meaning "the device connection is gone"
    #[serde(default = "default_session_lost_exit_code")]
    pub session_lost_exit_code: i32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            empty_parse_exit_code: default_empty_parse_exit_code(),
            session_lost_exit_code: default_session_lost_exit_code(),
        }
    }
}

fn default_program() -> String {
    "netscope-driver".to_string()
}

fn default_empty_parse_exit_code() -> i32 {
    3
}

fn default_session_lost_exit_code() -> i32 {
    4
}

/// Builds [`DriverSession`]s sharing one configuration
#[derive(Debug, Clone)]
pub struct DriverConnector {
    config: Arc<DriverConfig>,
}

impl DriverConnector {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Connector for DriverConnector {
    fn open(&self, device: &DeviceDescriptor) -> Arc<dyn Session> {
        Arc::new(DriverSession {
            device: device.clone(),
            config: Arc::clone(&self.config),
            connected: AtomicBool::new(false),
        })
    }
}

/// Session whose every call runs the driver program
#[derive(Debug)]
pub struct DriverSession {
    device: DeviceDescriptor,
    config: Arc<DriverConfig>,
    connected: AtomicBool,
}

impl DriverSession {
    fn invoke(&self, verb: &str, command: Option<&str>) -> std::io::Result<Output> {
        trace!(device = %self.device.name, verb, command = ?command, "Running driver");

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.args).arg(verb);
        if let Some(command) = command {
            cmd.arg(command);
        }
        cmd.env("NETSCOPE_DEVICE", &self.device.name)
            .env("NETSCOPE_HOST", self.device.management_ip.as_deref().unwrap_or(""))
            .env("NETSCOPE_OS", self.device.os.as_deref().unwrap_or(""))
            .env("NETSCOPE_TYPE", self.device.device_type.as_deref().unwrap_or(""))
            .output()
    }

    /// Error for a non-zero exit, marking the session dead when the driver
    /// reports the connection lost
    fn failure(&self, verb: &str, output: &Output) -> String {
        if output.status.code() == Some(self.config.session_lost_exit_code) {
            debug!(device = %self.device.name, "Driver reported session lost");
            self.connected.store(false, Ordering::SeqCst);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            format!("driver {} exited with {}", verb, output.status)
        } else {
            stderr.to_string()
        }
    }

    fn lost(&self, output: &Output) -> bool {
        output.status.code() == Some(self.config.session_lost_exit_code)
    }
}

impl Session for DriverSession {
    fn connect(&self) -> NetResult<()> {
        let output = self
            .invoke("connect", None)
            .map_err(|e| NetError::Connection(format!("failed to run {}: {}", self.config.program, e)))?;

        if !output.status.success() {
            return Err(NetError::Connection(self.failure("connect", &output)));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect(&self) -> NetResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        let output = self
            .invoke("disconnect", None)
            .map_err(|e| NetError::Connection(format!("failed to run {}: {}", self.config.program, e)))?;

        if !output.status.success() {
            return Err(NetError::Connection(self.failure("disconnect", &output)));
        }
        Ok(())
    }

    fn parse(&self, command: &str) -> NetResult<ParseOutcome> {
        let output = self
            .invoke("parse", Some(command))
            .map_err(|e| NetError::Execution(format!("failed to run {}: {}", self.config.program, e)))?;

        if output.status.code() == Some(self.config.empty_parse_exit_code) {
            return Ok(ParseOutcome::Empty);
        }
        if !output.status.success() {
            let message = self.failure("parse", &output);
            return Err(if self.lost(&output) {
                NetError::Connection(message)
            } else {
                NetError::Execution(message)
            });
        }

        serde_json::from_slice(&output.stdout)
            .map(ParseOutcome::Parsed)
            .map_err(|e| NetError::Execution(format!("invalid parser output for '{}': {}", command, e)))
    }

    fn execute(&self, command: &str) -> NetResult<String> {
        let output = self
            .invoke("execute", Some(command))
            .map_err(|e| NetError::Execution(format!("failed to run {}: {}", self.config.program, e)))?;

        if !output.status.success() {
            let message = self.failure("execute", &output);
            return Err(if self.lost(&output) {
                NetError::Connection(message)
            } else {
                NetError::Execution(message)
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_alive(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    const SCRIPT: &str = r#"
case "$1" in
  connect) [ "$NETSCOPE_HOST" = "10.0.0.1" ] || { echo "unreachable" >&2; exit 1; } ;;
  disconnect) ;;
  parse)
    case "$2" in
      "show version") echo '{"version": {"hostname": "'"$NETSCOPE_DEVICE"'"}}' ;;
      "show cdp neighbors detail") exit 3 ;;
      "show bogus") echo 'not json' ;;
      *) echo "% Invalid input detected" >&2; exit 1 ;;
    esac ;;
  execute)
    case "$2" in
      "show clock") exit 4 ;;
      *) echo "raw $2" ;;
    esac ;;
esac
"#;

    fn session(host: &str) -> Arc<dyn Session> {
        let config = DriverConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), SCRIPT.to_string(), "driver".to_string()],
            ..DriverConfig::default()
        };
        let mut device = DeviceDescriptor::new("rtr1");
        device.management_ip = Some(host.to_string());
        DriverConnector::new(config).open(&device)
    }

    #[test]
    fn test_connect_and_parse() {
        let session = session("10.0.0.1");
        assert!(!session.is_alive());
        session.connect().unwrap();
        assert!(session.is_alive());

        let outcome = session.parse("show version").unwrap();
        assert_eq!(
            outcome,
            ParseOutcome::Parsed(json!({"version": {"hostname": "rtr1"}}))
        );

        session.disconnect().unwrap();
        assert!(!session.is_alive());
    }

    #[test]
    fn test_connect_failure_carries_stderr() {
        let session = session("10.9.9.9");
        assert_eq!(
            session.connect(),
            Err(NetError::Connection("unreachable".to_string()))
        );
        assert!(!session.is_alive());
    }

    #[test]
    fn test_empty_parse_exit_code() {
        let session = session("10.0.0.1");
        assert_eq!(
            session.parse("show cdp neighbors detail"),
            Ok(ParseOutcome::Empty)
        );
    }

    #[test]
    fn test_parse_errors() {
        let session = session("10.0.0.1");
        assert_eq!(
            session.parse("show nonsense"),
            Err(NetError::Execution("% Invalid input detected".to_string()))
        );
        assert!(matches!(
            session.parse("show bogus"),
            Err(NetError::Execution(msg)) if msg.starts_with("invalid parser output")
        ));
    }

    #[test]
    fn test_execute_raw() {
        let session = session("10.0.0.1");
        assert_eq!(session.execute("show version").unwrap(), "raw show version\n");
    }

    #[test]
    fn test_session_lost_marks_dead() {
        let session = session("10.0.0.1");
        session.connect().unwrap();

        let err = session.execute("show clock").unwrap_err();
        assert_eq!(err.kind(), "connection");
        assert!(!session.is_alive());
    }

    #[test]
    fn test_missing_program() {
        let config = DriverConfig {
            program: "/nonexistent/netscope-driver".to_string(),
            ..DriverConfig::default()
        };
        let session = DriverConnector::new(config).open(&DeviceDescriptor::new("rtr1"));
        assert_eq!(session.connect().unwrap_err().kind(), "connection");
    }
}
