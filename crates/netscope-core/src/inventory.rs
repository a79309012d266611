//! Read-only device inventory
//!
//! The inventory is loaded once at startup from a TOML file with one table
//! per device:
//!
//! ```toml
//! [devices.rtr1]
//! os = "iosxe"
//! type = "router"
//! function = "core"
//! management_ip = "10.0.0.1"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::device::{DeviceDescriptor, DeviceSummary};

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Failed to read inventory: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse inventory: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Deserialize)]
struct InventoryFile {
    #[serde(default)]
    devices: BTreeMap<String, DeviceDescriptor>,
}

/// Directory of devices keyed by name
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    devices: BTreeMap<String, DeviceDescriptor>,
}

impl Inventory {
    /// Load the inventory from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, InventoryError> {
        let content = std::fs::read_to_string(path)?;
        let inventory = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            count = inventory.len(),
            "Loaded device inventory"
        );
        Ok(inventory)
    }

    /// Parse the inventory from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, InventoryError> {
        let file: InventoryFile = toml::from_str(content)?;
        Ok(Self::from_devices(file.devices.into_iter().map(|(name, mut device)| {
            // The table key is authoritative for the name
            device.name = name;
            device
        })))
    }

    /// Build an inventory from descriptors; later duplicates replace earlier ones
    pub fn from_devices(devices: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|device| (device.name.clone(), device))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DeviceDescriptor> {
        self.devices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// All devices in name order
    pub fn devices(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.devices.values()
    }

    /// Snapshot of the directory, name → summary
    pub fn summaries(&self) -> BTreeMap<String, DeviceSummary> {
        self.devices
            .iter()
            .map(|(name, device)| (name.clone(), device.summary()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
