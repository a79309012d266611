//! The operations exposed to callers
//!
//! Every operation returns a structured result; no fault escapes. The wire
//! form of a result is built by [`to_response`].

use netscope_core::{DeviceSummary, DiscoveryResult, NetError, NetResult, Protocol};
use netscope_session::{CommandExecutor, CommandOutcome, ConnectionManager, SessionInfo};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::DiscoveryEngine;

/// Command run by [`NetworkService::show_version`]
pub const VERSION_COMMAND: &str = "show version";

/// Snapshot of the device directory
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDirectory {
    pub devices: BTreeMap<String, DeviceSummary>,
}

/// Result of dropping a device's session
#[derive(Debug, Clone, Serialize)]
pub struct Disconnected {
    pub device: String,
    pub disconnected: bool,
}

/// Device operations over a shared connection manager
pub struct NetworkService {
    manager: Arc<ConnectionManager>,
    executor: CommandExecutor,
    engine: DiscoveryEngine,
}

impl NetworkService {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        let executor = CommandExecutor::new(Arc::clone(manager.pool()));
        Self {
            engine: DiscoveryEngine::new(executor.clone()),
            executor,
            manager,
        }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Every inventory device with its metadata
    pub fn list_devices(&self) -> DeviceDirectory {
        DeviceDirectory {
            devices: self.manager.inventory().summaries(),
        }
    }

    /// `show version`, parsed when possible
    pub async fn show_version(&self, device_name: &str) -> NetResult<CommandOutcome> {
        self.run_command(device_name, VERSION_COMMAND).await
    }

    /// Any `show` command, parsed when possible
    pub async fn run_command(&self, device_name: &str, command: &str) -> NetResult<CommandOutcome> {
        let command = command.trim();
        if command.is_empty() {
            return Err(NetError::Execution("command must not be empty".to_string()));
        }
        if !is_show_command(command) {
            return Err(NetError::Execution(format!(
                "only show commands are allowed: '{}'",
                command
            )));
        }

        let session = self.manager.get_connection(device_name).await?;
        debug!(device = %device_name, command, "Running command");
        Ok(self.executor.execute_parsed(&session, command).await)
    }

    pub async fn discover_neighbors_lldp(&self, device_name: &str) -> NetResult<DiscoveryResult> {
        self.discover_single(device_name, Protocol::Lldp).await
    }

    pub async fn discover_neighbors_cdp(&self, device_name: &str) -> NetResult<DiscoveryResult> {
        self.discover_single(device_name, Protocol::Cdp).await
    }

    /// LLDP and CDP neighbors, merged and deduplicated by link
    pub async fn discover_neighbors_combined(&self, device_name: &str) -> NetResult<DiscoveryResult> {
        let session = self.manager.get_connection(device_name).await?;
        let neighbors = self.engine.combined_neighbors(device_name, &session).await;

        info!(device = %device_name, count = neighbors.len(), "Combined neighbor discovery complete");
        Ok(DiscoveryResult::new(device_name, neighbors))
    }

    /// Close the device's cached session, if any
    pub async fn disconnect(&self, device_name: &str) -> NetResult<Disconnected> {
        let was_connected = self.manager.is_connected(device_name).await;
        self.manager.cleanup_connection(device_name).await?;
        Ok(Disconnected {
            device: device_name.to_string(),
            disconnected: was_connected,
        })
    }

    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.manager.sessions().await
    }

    async fn discover_single(&self, device_name: &str, protocol: Protocol) -> NetResult<DiscoveryResult> {
        let session = self.manager.get_connection(device_name).await?;
        let neighbors = self.engine.neighbors(&session, protocol).await?;

        info!(device = %device_name, %protocol, count = neighbors.len(), "Neighbor discovery complete");
        Ok(DiscoveryResult::new(device_name, neighbors))
    }
}

/// Read-only commands: `show` followed by at least one argument
fn is_show_command(command: &str) -> bool {
    let mut words = command.split_whitespace();
    matches!(words.next(), Some(verb) if verb.eq_ignore_ascii_case("show")) && words.next().is_some()
}

/// Wire form of an operation result.
///
/// Successes carry `"success": true` alongside their fields, failures are
/// exactly `{"success": false, "error": "<message>"}`.
pub fn to_response<T: Serialize>(result: &NetResult<T>) -> Value {
    match result {
        Ok(body) => match serde_json::to_value(body) {
            Ok(Value::Object(fields)) => {
                let mut response = Map::with_capacity(fields.len() + 1);
                response.insert("success".to_string(), Value::Bool(true));
                // A body that reports its own outcome takes precedence
                for (key, value) in fields {
                    response.insert(key, value);
                }
                Value::Object(response)
            }
            Ok(other) => json!({ "success": true, "data": other }),
            Err(e) => failure(&NetError::Unexpected(e.to_string())),
        },
        Err(e) => failure(e),
    }
}

fn failure(error: &NetError) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::CDP_COMMAND;
    use crate::lldp::LLDP_COMMAND;
    use netscope_core::{DeviceDescriptor, Inventory, NeighborRecord};
    use netscope_session::mock::{MockConnector, MockScript};
    use netscope_session::WorkerPool;

    fn service(connector: Arc<MockConnector>) -> NetworkService {
        let mut rtr1 = DeviceDescriptor::new("rtr1");
        rtr1.os = Some("iosxe".to_string());
        rtr1.management_ip = Some("10.0.0.1".to_string());
        let inventory = Arc::new(Inventory::from_devices(vec![rtr1, DeviceDescriptor::new("rtr2")]));

        let manager = ConnectionManager::new(inventory, connector, Arc::new(WorkerPool::default()));
        NetworkService::new(Arc::new(manager))
    }

    fn lldp_scenario() -> Value {
        json!({"interfaces": {"Gi0/0": {"port_id": {"1": {"neighbors": {"n1": {
            "system_name": "sw1", "port_id": "Gi1/0/1"
        }}}}}}})
    }

    fn cdp_scenario() -> Value {
        json!({"index": {"1": {
            "local_interface": "Gi0/0", "device_id": "sw1", "port_id": "Gi1/0/1",
            "management_addresses": {}, "platform": "cisco"
        }}})
    }

    #[test]
    fn test_list_devices() {
        let service = service(Arc::new(MockConnector::new()));
        let response = serde_json::to_value(service.list_devices()).unwrap();

        assert_eq!(
            response["devices"]["rtr1"],
            json!({"os": "iosxe", "type": "unknown", "function": "unknown", "management_ip": "10.0.0.1"})
        );
        assert_eq!(response["devices"]["rtr2"]["os"], "unknown");
    }

    #[tokio::test]
    async fn test_unknown_device_fails_without_contact() {
        let connector = Arc::new(MockConnector::new());
        let service = service(connector.clone());

        let expected = json!({"success": false, "error": "Device not found: ghost"});
        assert_eq!(to_response(&service.show_version("ghost").await), expected);
        assert_eq!(to_response(&service.discover_neighbors_lldp("ghost").await), expected);
        assert_eq!(to_response(&service.discover_neighbors_cdp("ghost").await), expected);
        assert_eq!(to_response(&service.discover_neighbors_combined("ghost").await), expected);
        assert_eq!(to_response(&service.disconnect("ghost").await), expected);
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_show_version_parsed() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new().with_parsed(VERSION_COMMAND, json!({"version": {"version": "17.3.1"}})),
        ));
        let service = service(connector);

        let response = to_response(&service.show_version("rtr1").await);
        assert_eq!(
            response,
            json!({"success": true, "data": {"version": {"version": "17.3.1"}}})
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new().with_connect_error(NetError::Connection("auth failed".to_string())),
        ));
        let service = service(connector);

        assert_eq!(
            to_response(&service.discover_neighbors_combined("rtr1").await),
            json!({"success": false, "error": "Connection error: auth failed"})
        );
    }

    #[tokio::test]
    async fn test_combined_scenario_drops_cdp_duplicate() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new()
                .with_parsed(LLDP_COMMAND, lldp_scenario())
                .with_parsed(CDP_COMMAND, cdp_scenario()),
        ));
        let service = service(connector);

        let result = service.discover_neighbors_combined("rtr1").await.unwrap();
        assert_eq!(result.total_neighbors, 1);
        assert_eq!(
            result.neighbors,
            vec![NeighborRecord::new(Protocol::Lldp, "Gi0/0", "sw1", "Gi1/0/1")]
        );

        assert_eq!(
            to_response(&Ok(result)),
            json!({
                "success": true,
                "device": "rtr1",
                "neighbors": [{
                    "protocol": "lldp",
                    "local_interface": "Gi0/0",
                    "remote_device": "sw1",
                    "remote_interface": "Gi1/0/1",
                    "management_address": "unknown",
                    "platform": ""
                }],
                "total_neighbors": 1
            })
        );
    }

    #[tokio::test]
    async fn test_combined_is_idempotent() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new()
                .with_parsed(LLDP_COMMAND, lldp_scenario())
                .with_parsed(CDP_COMMAND, json!({"index": {
                    "1": {"local_interface": "Gi0/0", "device_id": "sw1", "port_id": "Gi1/0/1"},
                    "2": {"local_interface": "Gi0/3", "device_id": "rtr9", "port_id": "Gi0/0"}
                }})),
        ));
        let service = service(connector.clone());

        let first = service.discover_neighbors_combined("rtr1").await.unwrap();
        let second = service.discover_neighbors_combined("rtr1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_neighbors, 2);
        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_single_protocol_empty_parse_is_success() {
        let connector = Arc::new(
            MockConnector::new().with_device("rtr1", MockScript::new().with_empty_parse(CDP_COMMAND)),
        );
        let service = service(connector);

        assert_eq!(
            to_response(&service.discover_neighbors_cdp("rtr1").await),
            json!({"success": true, "device": "rtr1", "neighbors": [], "total_neighbors": 0})
        );
    }

    #[tokio::test]
    async fn test_single_protocol_fault_is_failure() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new().with_parse_error(LLDP_COMMAND, NetError::Execution("% Invalid input".to_string())),
        ));
        let service = service(connector);

        assert_eq!(
            to_response(&service.discover_neighbors_lldp("rtr1").await),
            json!({"success": false, "error": "Execution error: % Invalid input"})
        );
    }

    #[tokio::test]
    async fn test_run_command_rejects_non_show() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new()
                .with_empty_parse("reload")
                .with_raw("reload", "Proceed with reload? [confirm]"),
        ));
        let service = service(connector.clone());

        for command in ["reload", "configure terminal", "show", "showrun"] {
            let err = service.run_command("rtr1", command).await.unwrap_err();
            assert_eq!(err.kind(), "execution");
        }
        assert_eq!(
            to_response(&service.run_command("rtr1", "reload").await),
            json!({"success": false, "error": "Execution error: only show commands are allowed: 'reload'"})
        );
        assert_eq!(connector.connects(), 0);
        assert_eq!(connector.executes(), 0);
        assert!(is_show_command("SHOW ip interface brief"));
    }

    #[tokio::test]
    async fn test_run_command_rejects_blank() {
        let connector = Arc::new(MockConnector::new());
        let service = service(connector.clone());

        assert!(service.run_command("rtr1", "  ").await.is_err());
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let connector = Arc::new(MockConnector::new().with_device(
            "rtr1",
            MockScript::new().with_parsed(VERSION_COMMAND, json!({})),
        ));
        let service = service(connector.clone());

        service.show_version("rtr1").await.unwrap();
        assert_eq!(service.sessions().await.len(), 1);

        let closed = service.disconnect("rtr1").await.unwrap();
        assert!(closed.disconnected);
        assert!(!service.disconnect("rtr1").await.unwrap().disconnected);
        assert_eq!(connector.disconnects(), 1);
    }
}
