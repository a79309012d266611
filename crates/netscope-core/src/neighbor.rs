//! Normalized neighbor records shared by all discovery protocols

use serde::{Deserialize, Serialize};

/// Management address reported when a protocol did not advertise one
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Discovery protocol that reported a neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Link Layer Discovery Protocol (vendor neutral)
    Lldp,
    /// Cisco Discovery Protocol
    Cdp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Lldp => "lldp",
            Protocol::Cdp => "cdp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One link to a neighboring device, as seen from the queried device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRecord {
    pub protocol: Protocol,
    pub local_interface: String,
    pub remote_device: String,
    pub remote_interface: String,
    #[serde(default = "default_management_address")]
    pub management_address: String,
    #[serde(default)]
    pub platform: String,
}

fn default_management_address() -> String {
    UNKNOWN_ADDRESS.to_string()
}

impl NeighborRecord {
    /// Create a record with default metadata
    pub fn new(
        protocol: Protocol,
        local_interface: impl Into<String>,
        remote_device: impl Into<String>,
        remote_interface: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            local_interface: local_interface.into(),
            remote_device: remote_device.into(),
            remote_interface: remote_interface.into(),
            management_address: default_management_address(),
            platform: String::new(),
        }
    }

    /// Link identity; protocol and metadata are not part of it
    pub fn link_key(&self) -> LinkKey<'_> {
        LinkKey {
            local_interface: &self.local_interface,
            remote_device: &self.remote_device,
            remote_interface: &self.remote_interface,
        }
    }
}

/// Endpoint triple identifying a physical link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKey<'a> {
    pub local_interface: &'a str,
    pub remote_device: &'a str,
    pub remote_interface: &'a str,
}

/// Neighbors found on one device, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub device: String,
    pub neighbors: Vec<NeighborRecord>,
    pub total_neighbors: usize,
}

impl DiscoveryResult {
    pub fn new(device: impl Into<String>, neighbors: Vec<NeighborRecord>) -> Self {
        Self {
            device: device.into(),
            total_neighbors: neighbors.len(),
            neighbors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}
