//! Netscope Discovery - Neighbor discovery and device operations
//!
//! This crate turns parsed device output into neighbor topology:
//! - LLDP and CDP schemas and their normalization into common records
//! - Merging both protocols with link-identity deduplication
//! - The operations exposed to callers (device listing, version, neighbors)

pub mod cdp;
pub mod engine;
pub mod lldp;
pub mod merge;
mod ordered;
pub mod service;

pub use cdp::{CdpOutput, CDP_COMMAND};
pub use engine::DiscoveryEngine;
pub use lldp::{LldpOutput, LLDP_COMMAND};
pub use merge::{dedup_neighbors, merge_neighbors};
pub use service::{to_response, DeviceDirectory, Disconnected, NetworkService, VERSION_COMMAND};
