//! Neighbor discovery over an established session

use netscope_core::{NeighborRecord, NetError, NetResult, Protocol};
use netscope_session::{CommandExecutor, ParseOutcome, Session};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cdp::{CdpOutput, CDP_COMMAND};
use crate::lldp::{LldpOutput, LLDP_COMMAND};
use crate::merge::merge_neighbors;

/// Extracts and normalizes neighbors per protocol
#[derive(Debug, Clone)]
pub struct DiscoveryEngine {
    executor: CommandExecutor,
}

impl DiscoveryEngine {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    /// Neighbors reported by one protocol.
    ///
    /// A protocol the device has nothing to say about (empty parse) yields no
    /// neighbors; execution faults and malformed output are errors.
    pub async fn neighbors(
        &self,
        session: &Arc<dyn Session>,
        protocol: Protocol,
    ) -> NetResult<Vec<NeighborRecord>> {
        let command = match protocol {
            Protocol::Lldp => LLDP_COMMAND,
            Protocol::Cdp => CDP_COMMAND,
        };

        let data = match self.executor.parse(session, command).await? {
            ParseOutcome::Parsed(data) => data,
            ParseOutcome::Empty => {
                debug!(%protocol, "Nothing parsed, no neighbors");
                return Ok(Vec::new());
            }
        };

        let records = match protocol {
            Protocol::Lldp => LldpOutput::from_value(data).map(|output| output.neighbors()),
            Protocol::Cdp => CdpOutput::from_value(data).map(|output| output.neighbors()),
        }
        .map_err(|e| NetError::Execution(format!("unexpected {} output: {}", protocol, e)))?;

        debug!(%protocol, count = records.len(), "Extracted neighbors");
        Ok(records)
    }

    /// LLDP then CDP neighbors, merged and deduplicated.
    ///
    /// Each protocol is fault-isolated: a failing protocol is logged and
    /// contributes no neighbors.
    pub async fn combined_neighbors(
        &self,
        device: &str,
        session: &Arc<dyn Session>,
    ) -> Vec<NeighborRecord> {
        let lldp = self.isolated(device, session, Protocol::Lldp).await;
        let cdp = self.isolated(device, session, Protocol::Cdp).await;
        merge_neighbors(lldp, cdp)
    }

    async fn isolated(
        &self,
        device: &str,
        session: &Arc<dyn Session>,
        protocol: Protocol,
    ) -> Vec<NeighborRecord> {
        match self.neighbors(session, protocol).await {
            Ok(records) => records,
            Err(e) => {
                warn!(device = %device, %protocol, error = %e, "Neighbor parsing failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netscope_core::DeviceDescriptor;
    use netscope_session::mock::{MockConnector, MockScript};
    use netscope_session::{Connector, WorkerPool};
    use serde_json::json;

    fn engine_with(script: MockScript) -> (DiscoveryEngine, Arc<dyn Session>) {
        let connector = MockConnector::new().with_device("rtr1", script);
        let session = connector.open(&DeviceDescriptor::new("rtr1"));
        let engine = DiscoveryEngine::new(CommandExecutor::new(Arc::new(WorkerPool::default())));
        (engine, session)
    }

    fn cdp_two_neighbors() -> serde_json::Value {
        json!({"index": {
            "1": {"local_interface": "Gi0/1", "device_id": "rtr2", "port_id": "Gi0/0",
                  "management_addresses": {"10.0.0.2": {}}, "platform": "Cisco 7206VXR"},
            "2": {"local_interface": "Gi0/2", "device_id": "rtr3", "port_id": "Gi0/0",
                  "management_addresses": {}, "platform": "Cisco 2911"}
        }})
    }

    #[tokio::test]
    async fn test_empty_parse_yields_no_neighbors() {
        let (engine, session) = engine_with(MockScript::new().with_empty_parse(LLDP_COMMAND));
        let records = engine.neighbors(&session, Protocol::Lldp).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_output_is_execution_error() {
        let (engine, session) =
            engine_with(MockScript::new().with_parsed(CDP_COMMAND, json!({"index": "garbage"})));
        let err = engine.neighbors(&session, Protocol::Cdp).await.unwrap_err();
        assert_eq!(err.kind(), "execution");
    }

    #[tokio::test]
    async fn test_lldp_empty_parse_isolated_from_cdp() {
        let (engine, session) = engine_with(
            MockScript::new()
                .with_empty_parse(LLDP_COMMAND)
                .with_parsed(CDP_COMMAND, cdp_two_neighbors()),
        );

        let records = engine.combined_neighbors("rtr1", &session).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.protocol == Protocol::Cdp));
    }

    #[tokio::test]
    async fn test_lldp_fault_isolated_from_cdp() {
        let (engine, session) = engine_with(
            MockScript::new()
                .with_parse_error(LLDP_COMMAND, NetError::Execution("% LLDP is not enabled".to_string()))
                .with_parsed(CDP_COMMAND, cdp_two_neighbors()),
        );

        let records = engine.combined_neighbors("rtr1", &session).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].management_address, "10.0.0.2");
        assert_eq!(records[1].management_address, "unknown");
    }

    #[tokio::test]
    async fn test_both_protocols_failing_yields_empty() {
        let (engine, session) = engine_with(MockScript::new());
        assert!(engine.combined_neighbors("rtr1", &session).await.is_empty());
    }
}
