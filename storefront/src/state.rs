//! Server runtime state
//!
//! Liveness flags and counters reported by the health endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Instant;

/// Process-wide runtime state
#[derive(Debug)]
pub struct ServerState {
    pub bind_address: SocketAddr,
    is_running: AtomicBool,
    /// Open order-room sockets
    websockets: AtomicU32,
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            is_running: AtomicBool::new(true),
            websockets: AtomicU32::new(0),
            started_at: Instant::now(),
        }
    }

    /// False once shutdown has begun
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.is_running.store(running, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn connection_count(&self) -> u32 {
        self.websockets.load(Ordering::Relaxed)
    }

    /// Record an upgraded socket, returning the new total
    pub fn increment_connection_count(&self) -> u32 {
        self.websockets.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn decrement_connection_count(&self) -> u32 {
        let previous = self
            .websockets
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)))
            .unwrap_or_default();
        previous.saturating_sub(1)
    }
}
