//! Device descriptors as declared in the inventory

use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "unknown";

/// Connection parameters and metadata for one network device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Inventory name, unique across the inventory
    #[serde(default)]
    pub name: String,
    /// Operating-system tag (e.g. "iosxe", "nxos")
    #[serde(default)]
    pub os: Option<String>,
    /// Device type or model
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    /// Role of the device in the network
    #[serde(default)]
    pub function: Option<String>,
    /// Management address used to reach the device CLI
    #[serde(default)]
    pub management_ip: Option<String>,
}

impl DeviceDescriptor {
    /// Create a descriptor with only a name set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os: None,
            device_type: None,
            function: None,
            management_ip: None,
        }
    }

    /// Listing view with "unknown" in place of missing values
    pub fn summary(&self) -> DeviceSummary {
        fn or_unknown(value: &Option<String>) -> String {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        }

        DeviceSummary {
            os: or_unknown(&self.os),
            device_type: or_unknown(&self.device_type),
            function: or_unknown(&self.function),
            management_ip: or_unknown(&self.management_ip),
        }
    }
}

/// Entry of the device directory returned by `list_devices`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub os: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub function: String,
    pub management_ip: String,
}
