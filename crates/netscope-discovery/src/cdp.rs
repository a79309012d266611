//! CDP (Cisco Discovery Protocol) neighbor extraction

use netscope_core::{NeighborRecord, Protocol};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::lldp::{present, UNKNOWN_INTERFACE};
use crate::ordered;

/// Command whose parsed output feeds [`CdpOutput`]
pub const CDP_COMMAND: &str = "show cdp neighbors detail";

/// Parsed CDP neighbor table, one numbered entry per neighbor
#[derive(Debug, Default, Deserialize)]
pub struct CdpOutput {
    #[serde(default, deserialize_with = "ordered::deserialize")]
    pub index: Vec<(String, CdpEntry)>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CdpEntry {
    pub local_interface: Option<String>,
    pub device_id: Option<String>,
    pub port_id: Option<String>,
    /// Advertised addresses; only the keys matter
    #[serde(default)]
    pub management_addresses: BTreeMap<String, Value>,
    pub platform: Option<String>,
}

impl CdpOutput {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Normalize every entry, in document order
    pub fn neighbors(&self) -> Vec<NeighborRecord> {
        self.index
            .iter()
            .filter_map(|(index, entry)| {
                let record = entry.to_record();
                if record.is_none() {
                    debug!(index = %index, "Skipping CDP entry without interface or device id");
                }
                record
            })
            .collect()
    }
}

impl CdpEntry {
    fn to_record(&self) -> Option<NeighborRecord> {
        let local_interface = present(&self.local_interface)?;
        let remote_device = present(&self.device_id)?;
        let remote_interface = present(&self.port_id).unwrap_or(UNKNOWN_INTERFACE);

        let mut record = NeighborRecord::new(
            Protocol::Cdp,
            local_interface,
            remote_device,
            remote_interface,
        );
        // Lowest address wins; the parser gives no meaningful order
        if let Some(address) = self.management_addresses.keys().next() {
            record.management_address = address.clone();
        }
        if let Some(platform) = &self.platform {
            record.platform = platform.trim().to_string();
        }
        Some(record)
    }
}
