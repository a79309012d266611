//! Application state management

use anyhow::Result;
use netscope_core::Inventory;
use netscope_discovery::NetworkService;
use netscope_session::{ConnectionManager, Connector, DriverConnector, WorkerPool};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Shared application state
pub struct AppState {
    /// Device operations and the session cache behind them
    pub service: NetworkService,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Create application state with driver-backed sessions
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let inventory = load_inventory(&config.inventory.path)?;
        let connector = Arc::new(DriverConnector::new(config.driver.clone()));
        Ok(Self::with_connector(config, inventory, connector))
    }

    /// Create application state around an existing connector
    pub fn with_connector(
        config: Config,
        inventory: Inventory,
        connector: Arc<dyn Connector>,
    ) -> Arc<Self> {
        let pool = Arc::new(WorkerPool::new(
            config.sessions.max_blocking,
            config.sessions.op_timeout(),
        ));
        let manager = ConnectionManager::new(Arc::new(inventory), connector, pool);

        Arc::new(Self {
            service: NetworkService::new(Arc::new(manager)),
            config,
        })
    }

    /// Periodically disconnect idle sessions, if configured
    pub fn spawn_session_reaper(self: &Arc<Self>) {
        let Some(max_idle) = self.config.sessions.idle_timeout() else {
            debug!("Idle session eviction disabled");
            return;
        };

        let state = Arc::clone(self);
        let period = self.config.sessions.reap_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = state.service.manager().evict_idle(max_idle).await;
                if evicted > 0 {
                    info!(evicted, "Evicted idle sessions");
                }
            }
        });
    }

    /// Disconnect every cached session
    pub async fn shutdown(&self) {
        self.service.manager().shutdown().await;
    }
}

/// Load the inventory, or an empty one when the file is missing
fn load_inventory(path: &str) -> Result<Inventory> {
    let path = Path::new(path);
    if !path.exists() {
        warn!(path = %path.display(), "Inventory not found, starting with no devices");
        return Ok(Inventory::default());
    }
    Ok(Inventory::from_file(path)?)
}
