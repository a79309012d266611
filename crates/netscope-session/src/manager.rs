//! Per-device session cache with single-flight connects
//!
//! Every inventory device gets its own async gate when the manager is built.
//! Whoever holds a device's gate is the only task allowed to connect,
//! disconnect, or replace that device's session, so concurrent first requests
//! share one connect attempt while unrelated devices proceed in parallel.
//! A connect that outlives its deadline keeps the gate until it finishes.

use chrono::{DateTime, Utc};
use netscope_core::{Inventory, NetError, NetResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::pool::WorkerPool;
use crate::session::{Connector, Session};

struct CachedSession {
    session: Arc<dyn Session>,
    connected_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
    last_used: Instant,
}

impl CachedSession {
    fn new(session: Arc<dyn Session>) -> Self {
        let now = Utc::now();
        Self {
            session,
            connected_at: now,
            last_used_at: now,
            last_used: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_used_at = Utc::now();
        self.last_used = Instant::now();
    }
}

type Slot = Mutex<Option<CachedSession>>;

/// Snapshot of one cached session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub device: String,
    pub connected_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

/// Owns every live device session
pub struct ConnectionManager {
    inventory: Arc<Inventory>,
    connector: Arc<dyn Connector>,
    pool: Arc<WorkerPool>,
    slots: HashMap<String, Arc<Slot>>,
}

impl ConnectionManager {
    pub fn new(
        inventory: Arc<Inventory>,
        connector: Arc<dyn Connector>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        let slots = inventory
            .devices()
            .map(|device| (device.name.clone(), Arc::new(Mutex::new(None))))
            .collect();

        Self {
            inventory,
            connector,
            pool,
            slots,
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    fn slot(&self, device_name: &str) -> NetResult<&Arc<Slot>> {
        self.slots
            .get(device_name)
            .ok_or_else(|| NetError::DeviceNotFound(device_name.to_string()))
    }

    /// Return the cached session for `device_name`, connecting on first use.
    ///
    /// A cached session that no longer reports itself alive is torn down and
    /// replaced by a fresh connection.
    pub async fn get_connection(&self, device_name: &str) -> NetResult<Arc<dyn Session>> {
        let slot = Arc::clone(self.slot(device_name)?);
        let mut cached = slot.lock_owned().await;

        if let Some(entry) = cached.as_mut() {
            if entry.session.is_alive() {
                entry.touch();
                return Ok(Arc::clone(&entry.session));
            }
        }

        if let Some(stale) = cached.take() {
            warn!(device = %device_name, "Cached session is no longer alive, reconnecting");
            self.disconnect_quietly(device_name, stale.session).await;
        }

        let device = self
            .inventory
            .get(device_name)
            .ok_or_else(|| NetError::DeviceNotFound(device_name.to_string()))?;

        debug!(device = %device_name, "Opening new session");
        let mut attempt = tokio::spawn(connect_and_cache(
            device_name.to_string(),
            self.connector.open(device),
            Arc::clone(&self.pool),
            cached,
        ));
        self.pool.wait("connect", &mut attempt).await
    }

    /// Disconnect and forget the cached session for `device_name`.
    ///
    /// No-op when the device has no cached session. The entry is dropped even
    /// if the disconnect itself fails.
    pub async fn cleanup_connection(&self, device_name: &str) -> NetResult<()> {
        let slot = self.slot(device_name)?;
        let mut cached = slot.lock().await;

        let Some(entry) = cached.take() else {
            debug!(device = %device_name, "No cached session to clean up");
            return Ok(());
        };

        let session = entry.session;
        self.pool
            .run("disconnect", move || session.disconnect())
            .await?;
        info!(device = %device_name, "Connection closed");
        Ok(())
    }

    /// Whether a session is currently cached for `device_name`
    pub async fn is_connected(&self, device_name: &str) -> bool {
        match self.slots.get(device_name) {
            Some(slot) => slot.lock().await.is_some(),
            None => false,
        }
    }

    /// Disconnect sessions unused for longer than `max_idle`.
    ///
    /// Devices whose gate is busy are in use and skipped. Returns the number
    /// of sessions evicted.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut evicted = 0;

        for (name, slot) in &self.slots {
            let Ok(mut cached) = slot.try_lock() else {
                continue;
            };

            let idle = cached
                .as_ref()
                .map(|entry| entry.last_used.elapsed() > max_idle)
                .unwrap_or(false);
            if !idle {
                continue;
            }

            if let Some(entry) = cached.take() {
                info!(device = %name, "Evicting idle session");
                self.disconnect_quietly(name, entry.session).await;
                evicted += 1;
            }
        }

        evicted
    }

    /// Disconnect every cached session
    pub async fn shutdown(&self) {
        for (name, slot) in &self.slots {
            let mut cached = slot.lock().await;
            if let Some(entry) = cached.take() {
                self.disconnect_quietly(name, entry.session).await;
            }
        }
        info!("All sessions closed");
    }

    /// Cached sessions in device name order
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let mut sessions = Vec::new();
        for (name, slot) in &self.slots {
            if let Some(entry) = slot.lock().await.as_ref() {
                sessions.push(SessionInfo {
                    device: name.clone(),
                    connected_at: entry.connected_at,
                    last_used: entry.last_used_at,
                });
            }
        }
        sessions.sort_by(|a, b| a.device.cmp(&b.device));
        sessions
    }

    async fn disconnect_quietly(&self, device_name: &str, session: Arc<dyn Session>) {
        if let Err(e) = self
            .pool
            .run("disconnect", move || session.disconnect())
            .await
        {
            warn!(device = %device_name, error = %e, "Disconnect failed");
        }
    }
}

/// Connect `session` and cache it, holding the device gate throughout.
///
/// Runs as its own task so the attempt settles even when the caller gives up
/// on it: a late success is cached for the next caller instead of leaking.
async fn connect_and_cache(
    device_name: String,
    session: Arc<dyn Session>,
    pool: Arc<WorkerPool>,
    mut cached: OwnedMutexGuard<Option<CachedSession>>,
) -> NetResult<Arc<dyn Session>> {
    let connecting = Arc::clone(&session);
    pool.submit("connect", move || connecting.connect())
        .await
        .map_err(|e| NetError::Unexpected(format!("connect worker failed: {}", e)))??;

    info!(device = %device_name, "New connection established");
    *cached = Some(CachedSession::new(Arc::clone(&session)));
    Ok(session)
}
