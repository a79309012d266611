//! Netscope Core - Core types, device inventory, and error taxonomy
//!
//! This crate provides the foundational types for the netscope system:
//! - Device descriptors and the read-only inventory they are loaded into
//! - Normalized neighbor records shared by the LLDP and CDP extractors
//! - The error taxonomy surfaced by every exposed operation

pub mod device;
pub mod error;
pub mod inventory;
pub mod neighbor;

pub use device::{DeviceDescriptor, DeviceSummary};
pub use error::{NetError, NetResult};
pub use inventory::{Inventory, InventoryError};
pub use neighbor::{DiscoveryResult, LinkKey, NeighborRecord, Protocol};
