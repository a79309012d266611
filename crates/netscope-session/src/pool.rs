//! Bounded worker pool for blocking session calls

use netscope_core::{NetError, NetResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{trace, warn};

/// Default number of blocking calls allowed in flight
pub const DEFAULT_MAX_BLOCKING: usize = 16;

/// Default deadline for a single blocking call
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs blocking calls on tokio's blocking threads, at most `max_blocking`
/// at a time, each bounded by a deadline.
///
/// The deadline covers waiting for a free slot as well as the call itself.
/// A call that misses its deadline keeps running to completion in the
/// background and holds its slot until then.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    op_timeout: Duration,
}

impl WorkerPool {
    pub fn new(max_blocking: usize, op_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_blocking.max(1))),
            op_timeout,
        }
    }

    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Deadline in milliseconds, saturating at `u64::MAX`
    pub fn op_timeout_ms(&self) -> u64 {
        u64::try_from(self.op_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Submit `call` to the pool and await its completion
    pub async fn run<T, F>(&self, operation: &str, call: F) -> NetResult<T>
    where
        F: FnOnce() -> NetResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut task = self.submit(operation, call);
        let result = self.wait(operation, &mut task).await;
        if result.is_err() {
            // A call still queued for a slot never starts
            task.abort();
        }
        result
    }

    /// Queue `call` without waiting for it.
    ///
    /// The returned handle resolves once the call has run, however long that
    /// takes. Use [`WorkerPool::wait`] to await it under the pool deadline.
    pub fn submit<T, F>(&self, operation: &str, call: F) -> JoinHandle<NetResult<T>>
    where
        F: FnOnce() -> NetResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let operation = operation.to_string();
        trace!(operation = %operation, "Submitting blocking call");

        tokio::spawn(async move {
            let permit = permits
                .acquire_owned()
                .await
                .map_err(|_| NetError::Unexpected("worker pool is closed".to_string()))?;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                call()
            })
            .await
            .map_err(|e| NetError::Unexpected(format!("{} worker failed: {}", operation, e)))?
        })
    }

    /// Await a submitted call for at most the pool deadline.
    ///
    /// On timeout the call is left untouched and `task` may be awaited again.
    pub async fn wait<T>(&self, operation: &str, task: &mut JoinHandle<NetResult<T>>) -> NetResult<T> {
        match timeout(self.op_timeout, &mut *task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(NetError::Unexpected(format!("{} worker failed: {}", operation, e))),
            Err(_) => {
                let ms = self.op_timeout_ms();
                warn!(operation, timeout_ms = ms, "Blocking call timed out");
                Err(NetError::Timeout {
                    operation: operation.to_string(),
                    ms,
                })
            }
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLOCKING, DEFAULT_OP_TIMEOUT)
    }
}
