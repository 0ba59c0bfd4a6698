//! Explicit HTTP connection pool
//!
//! The pool is a value owned by one invocation, not a process global. The
//! runner force-closes it after the operation finishes so no keep-alive
//! socket outlives the response.

use crate::config::HttpConfig;
use crate::errors::ToolError;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Idle connections kept per host
const MAX_IDLE_PER_HOST: usize = 2;

/// Shared handle to a closable HTTP client
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    client: Mutex<Option<Client>>,
    requests: AtomicU64,
    max_body_bytes: usize,
}

impl ConnectionPool {
    /// Build a pool from HTTP settings
    pub fn new(config: &HttpConfig) -> Result<Self, ToolError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_millis(config.pool_idle_timeout_ms))
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .build()
            .map_err(|e| ToolError::unexpected(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::from_client(client, config.max_body_bytes))
    }

    /// Wrap an existing client
    pub fn from_client(client: Client, max_body_bytes: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                client: Mutex::new(Some(client)),
                requests: AtomicU64::new(0),
                max_body_bytes,
            }),
        }
    }

    /// Handle to the underlying client; fails once the pool is closed
    pub fn client(&self) -> Result<Client, ToolError> {
        self.lock()
            .as_ref()
            .cloned()
            .ok_or_else(|| ToolError::fetch_failed("connection pool is closed"))
    }

    /// Drop the client and every idle connection it holds.
    ///
    /// Returns `true` if this call closed an open pool. Idempotent.
    pub fn close(&self) -> bool {
        let client = self.lock().take();
        let was_open = client.is_some();
        drop(client);
        if was_open {
            tracing::debug!(
                requests = self.requests_issued(),
                "connection pool closed"
            );
        }
        was_open
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Number of requests sent through this pool
    pub fn requests_issued(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }

    /// Upper bound on a response body read through this pool
    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }

    pub(crate) fn record_request(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
    }

    fn lock(&self) -> MutexGuard<'_, Option<Client>> {
        // A poisoned lock still holds a valid Option<Client>.
        self.inner
            .client
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Scoped ownership of the pool for one invocation.
///
/// `release` closes the pool at the intended point; dropping the guard on
/// any other path closes it too.
#[derive(Debug)]
pub struct PoolGuard {
    pool: ConnectionPool,
    released: bool,
}

impl PoolGuard {
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            released: false,
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Close the pool now. Returns whether it was still open.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.pool.close()
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        if !self.released {
            self.pool.close();
        }
    }
}
