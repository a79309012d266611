//! Error taxonomy shared by the session and discovery layers
//!
//! Empty-parse is deliberately absent: a parser that finds nothing to extract
//! reports it as a normal outcome, not as an error.

use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The name is not in the inventory; raised before any network contact
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Connecting to or disconnecting from the device failed
    #[error("Connection error: {0}")]
    Connection(String),
    /// The device rejected a command or its output could not be used
    #[error("Execution error: {0}")]
    Execution(String),
    /// A blocking call did not complete within the worker-pool deadline
    #[error("{operation} timed out after {ms}ms")]
    Timeout { operation: String, ms: u64 },
    /// Internal defect, e.g. a panicking worker
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl NetError {
    /// Short machine-readable kind, used for logging and status mapping
    pub fn kind(&self) -> &'static str {
        match self {
            NetError::DeviceNotFound(_) => "device_not_found",
            NetError::Connection(_) => "connection",
            NetError::Execution(_) => "execution",
            NetError::Timeout { .. } => "timeout",
            NetError::Unexpected(_) => "unexpected",
        }
    }
}
