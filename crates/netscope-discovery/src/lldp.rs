//! LLDP (Link Layer Discovery Protocol) neighbor extraction
//!
//! Parsed `show lldp neighbors detail` output is nested three levels deep:
//! local interface → port-id bucket → neighbor entries.

use netscope_core::{NeighborRecord, Protocol};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::ordered;

/// Command whose parsed output feeds [`LldpOutput`]
pub const LLDP_COMMAND: &str = "show lldp neighbors detail";

/// Remote interface reported when a neighbor advertised no port
pub const UNKNOWN_INTERFACE: &str = "unknown";

/// Parsed LLDP neighbor table
#[derive(Debug, Default, Deserialize)]
pub struct LldpOutput {
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub interfaces: Vec<(String, LldpInterface)>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LldpInterface {
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub port_id: Vec<(String, LldpPort)>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LldpPort {
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub neighbors: Vec<(String, LldpNeighbor)>,
}

/// One neighbor as advertised over LLDP
#[derive(Debug, Default, Deserialize)]
pub struct LldpNeighbor {
    pub system_name: Option<String>,
    pub neighbor_id: Option<String>,
    pub port_id: Option<String>,
    pub port_description: Option<String>,
    pub management_address: Option<String>,
    pub system_description: Option<String>,
}

impl LldpOutput {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Normalize every neighbor entry, in document order
    pub fn neighbors(&self) -> Vec<NeighborRecord> {
        let mut records = Vec::new();

        for (local_interface, interface) in &self.interfaces {
            for (_, port) in &interface.port_id {
                for (id, neighbor) in &port.neighbors {
                    match neighbor.to_record(local_interface) {
                        Some(record) => records.push(record),
                        None => debug!(
                            interface = %local_interface,
                            neighbor = %id,
                            "Skipping LLDP neighbor without a system name or id"
                        ),
                    }
                }
            }
        }

        records
    }
}

impl LldpNeighbor {
    fn to_record(&self, local_interface: &str) -> Option<NeighborRecord> {
        let remote_device = present(&self.system_name).or(present(&self.neighbor_id))?;
        let remote_interface = present(&self.port_id)
            .or(present(&self.port_description))
            .unwrap_or(UNKNOWN_INTERFACE);

        let mut record = NeighborRecord::new(
            Protocol::Lldp,
            local_interface,
            remote_device,
            remote_interface,
        );
        if let Some(address) = &self.management_address {
            record.management_address = address.clone();
        }
        if let Some(description) = &self.system_description {
            record.platform = description.lines().next().unwrap_or_default().to_string();
        }
        Some(record)
    }
}

/// The value, unless missing or empty
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
