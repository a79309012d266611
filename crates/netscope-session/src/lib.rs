//! Netscope Session - Device sessions and their lifecycle
//!
//! This crate owns everything that touches a device connection:
//! - The `Session` / `Connector` seam to the parsing engine
//! - A driver-process session backend
//! - A bounded worker pool for blocking calls, with per-call deadlines
//! - The connection manager (single-flight connects per device)
//! - The command executor (structured parse first, raw text fallback)

pub mod driver;
pub mod executor;
pub mod manager;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod pool;
pub mod session;

pub use driver::{DriverConfig, DriverConnector, DriverSession};
pub use executor::{CommandExecutor, CommandOutcome, RAW_FALLBACK_NOTE};
pub use manager::{ConnectionManager, SessionInfo};
pub use pool::WorkerPool;
pub use session::{Connector, ParseOutcome, Session};
