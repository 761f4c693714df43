//! Process-wide server registry
//!
//! Ensures exactly one [`ServerState`] exists per identity key, so unrelated
//! connections that target "the same server" observe shared databases and a
//! shared connectivity flag. This is essential for:
//!   1. State sharing (the entire purpose of identity keys)
//!   2. Stable behavior across the process regardless of construction order
//!
//! Entries are strong references and are never pruned automatically: a
//! simulated server lives for the life of the process, or until the caller
//! resets the registry explicitly (tests do this between cases).
//!
//! Uses a sharded concurrent map (`DashMap`) so concurrent lookups of an
//! unseen key cannot create two distinct states: `entry()` makes
//! get-or-create atomic.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::server::ServerState;

/// Registry mapping identity key -> shared server state.
///
/// The process-wide instance is [`SERVERS`]; an explicit instance can
/// be constructed for isolated setups (each registry is its own universe of
/// servers).
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: DashMap<String, Arc<ServerState>>,
}

impl ServerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the server registered under `key`, creating it on first call.
    ///
    /// Idempotent: repeated calls with the same key return the same state
    /// object regardless of call order or concurrent callers. `version` is
    /// only consulted when the entry is created; keys are already
    /// version-namespaced by identity resolution.
    pub fn get_or_create(&self, key: &str, version: u8) -> Arc<ServerState> {
        self.servers
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(server = key, version, "registering simulated server");
                Arc::new(ServerState::new(key, version))
            })
            .clone()
    }

    /// Look up an existing server without creating one.
    pub fn get(&self, key: &str) -> Option<Arc<ServerState>> {
        self.servers.get(key).map(|entry| entry.clone())
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// True when no server is registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Drop every registered server.
    ///
    /// Existing connections keep their `Arc` handles and continue to work
    /// against the old states; new lookups start fresh. Intended for test
    /// isolation.
    pub fn reset(&self) {
        self.servers.clear();
    }
}

/// Process-wide registry of simulated servers.
pub static SERVERS: Lazy<ServerRegistry> = Lazy::new(ServerRegistry::new);
