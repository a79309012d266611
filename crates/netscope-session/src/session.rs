//! The seam between netscope and the device CLI / parsing engine
//!
//! Every method on [`Session`] blocks. Callers never invoke them directly from
//! async code; they go through [`crate::pool::WorkerPool`].

use netscope_core::{DeviceDescriptor, NetResult};
use serde_json::Value;
use std::sync::Arc;

/// Result of asking the parsing engine for structured output
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The output was parsed into a structured document
    Parsed(Value),
    /// The output was valid but held nothing to extract
    /// (e.g. the feature is not configured on the device)
    Empty,
}

/// A live CLI connection to one device
pub trait Session: Send + Sync {
    /// Establish the connection
    fn connect(&self) -> NetResult<()>;

    /// Tear the connection down
    fn disconnect(&self) -> NetResult<()>;

    /// Run a command and return the parsing engine's view of its output
    fn parse(&self, command: &str) -> NetResult<ParseOutcome>;

    /// Run a command and return its raw text output
    fn execute(&self, command: &str) -> NetResult<String>;

    /// Cheap liveness check, must not block on the network
    fn is_alive(&self) -> bool {
        true
    }
}

/// Builds unconnected sessions for inventory devices
pub trait Connector: Send + Sync {
    fn open(&self, device: &DeviceDescriptor) -> Arc<dyn Session>;
}
