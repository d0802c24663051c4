use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

#[derive(Debug)]
struct ClientEntry {
    id: u64,
    addr: SocketAddr,
    cancel: CancellationToken,
}

/// Connection tracking and management
///
/// Bounds the number of live connections and keeps a registry of them keyed
/// by peer IP so they can be listed or disconnected from outside their tasks.
/// Nothing on the per-exchange path touches the tracker.
#[derive(Debug)]
pub struct ConnectionTracker {
    active_connections: AtomicUsize,
    total_connections: AtomicU64,
    rejected_connections: AtomicU64,
    next_id: AtomicU64,
    connection_semaphore: Arc<Semaphore>,
    max_connections: usize,
    clients: Mutex<HashMap<IpAddr, Vec<ClientEntry>>>,
}

impl ConnectionTracker {
    pub fn new(max_connections: usize) -> Self {
        Self {
            active_connections: AtomicUsize::new(0),
            total_connections: AtomicU64::new(0),
            rejected_connections: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            connection_semaphore: Arc::new(Semaphore::new(max_connections)),
            max_connections,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn lock_clients(&self) -> MutexGuard<'_, HashMap<IpAddr, Vec<ClientEntry>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims a connection slot without waiting.
    ///
    /// The returned guard is cancelled when `parent` is cancelled or when the
    /// peer's IP is disconnected, and gives the slot back when dropped.
    pub fn try_acquire(
        self: &Arc<Self>,
        addr: SocketAddr,
        parent: &CancellationToken,
    ) -> Result<ConnectionGuard, ConnectionError> {
        let permit = match self.connection_semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                self.rejected_connections.fetch_add(1, Ordering::Relaxed);
                return Err(ConnectionError::LimitReached {
                    limit: self.max_connections,
                });
            }
            Err(TryAcquireError::Closed) => return Err(ConnectionError::Closed),
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = parent.child_token();
        self.lock_clients().entry(addr.ip()).or_default().push(ClientEntry {
            id,
            addr,
            cancel: cancel.clone(),
        });

        let active = self.active_connections.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total_connections.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::debug!(
            %addr,
            id,
            active_connections = active,
            total_connections = total,
            "Connection acquired"
        );

        Ok(ConnectionGuard {
            _permit: permit,
            tracker: Arc::clone(self),
            id,
            addr,
            cancel,
            start_time: Instant::now(),
        })
    }

    /// Cancels every live connection from `ip`, returning how many were signalled.
    pub fn disconnect(&self, ip: IpAddr) -> usize {
        let clients = self.lock_clients();
        let Some(entries) = clients.get(&ip) else {
            return 0;
        };

        for entry in entries {
            entry.cancel.cancel();
        }

        tracing::info!(%ip, connections = entries.len(), "Disconnecting client");
        entries.len()
    }

    /// Snapshot of live connections grouped by peer IP
    pub fn clients(&self) -> Vec<ClientInfo> {
        let mut clients: Vec<ClientInfo> = self
            .lock_clients()
            .iter()
            .map(|(ip, entries)| ClientInfo {
                ip: *ip,
                connections: entries.iter().map(|e| e.addr).collect(),
            })
            .collect();
        clients.sort_by_key(|info| info.ip);
        clients
    }

    /// Get current metrics
    pub fn metrics(&self) -> ConnectionMetrics {
        ConnectionMetrics {
            active_connections: self.active_connections.load(Ordering::SeqCst),
            total_connections: self.total_connections.load(Ordering::SeqCst),
            rejected_connections: self.rejected_connections.load(Ordering::Relaxed),
            distinct_clients: self.lock_clients().len(),
            available_slots: self.connection_semaphore.available_permits(),
            max_connections: self.max_connections,
        }
    }

    fn release(&self, ip: IpAddr, id: u64) {
        let mut clients = self.lock_clients();
        if let Some(entries) = clients.get_mut(&ip) {
            entries.retain(|e| e.id != id);
            if entries.is_empty() {
                clients.remove(&ip);
            }
        }
    }
}

/// RAII guard for one live connection
pub struct ConnectionGuard {
    _permit: OwnedSemaphorePermit,
    tracker: Arc<ConnectionTracker>,
    id: u64,
    addr: SocketAddr,
    cancel: CancellationToken,
    start_time: Instant,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the connection has been told to close
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.release(self.addr.ip(), self.id);
        let active = self
            .tracker
            .active_connections
            .fetch_sub(1, Ordering::SeqCst)
            - 1;

        tracing::debug!(
            addr = %self.addr,
            id = self.id,
            active_connections = active,
            connection_duration_ms = self.start_time.elapsed().as_millis() as u64,
            "Connection released"
        );
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Connection limit of {limit} reached")]
    LimitReached { limit: usize },
    #[error("Connection tracker closed")]
    Closed,
}

/// Live connections of one peer IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: IpAddr,
    pub connections: Vec<SocketAddr>,
}

/// Connection metrics for monitoring
#[derive(Debug, Clone)]
pub struct ConnectionMetrics {
    pub active_connections: usize,
    pub total_connections: u64,
    pub rejected_connections: u64,
    pub distinct_clients: usize,
    pub available_slots: usize,
    pub max_connections: usize,
}
