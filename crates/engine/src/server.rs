//! Simulated server state shared by every connection targeting one identity
//!
//! One `ServerState` is one logical server: its databases, its channel and
//! pattern subscriber registries, its connectivity flag, its last-save
//! timestamp. Connections resolving to the same identity key share one
//! instance (see [`crate::registry`]), which is the entire point: data
//! written through one connection is observable through every other.
//!
//! ## Locking
//!
//! A single `parking_lot::Mutex` guards the whole mutable interior. All
//! databases of one server share that lock; contention is expected to be
//! low and correctness, not throughput, is the goal here. The connectivity
//! flag is an atomic so the transport paths can check it without taking
//! the lock.
//!
//! ## Subscriber lifetime
//!
//! Subscriber registries hold `Weak` references to connection reply queues.
//! Dropping the last external reference to a connection makes its entries
//! decay without an explicit unsubscribe, and a subscription never keeps a
//! connection alive. Explicitly disconnected connections are additionally
//! unregistered eagerly and parked on a deferred-teardown list that is
//! reaped lazily.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use mirage_core::Value;

use crate::database::Database;
use crate::glob::glob_match;
use crate::queue::ReplyQueue;

/// Default protocol version tag used when the caller does not pick one.
pub const DEFAULT_PROTOCOL_VERSION: u8 = 7;

/// Derive the identity key naming one simulated server.
///
/// An explicit `path` is used verbatim. Otherwise `host:port` when both are
/// known. When neither is supplied the key is a fresh random identifier, so
/// the resulting server is intentionally unshared: callers wanting shared
/// state must supply identity explicitly. A `v{version}` suffix namespaces
/// the key in all cases so identical endpoints on different protocol
/// versions never collide.
pub fn resolve_identity(
    path: Option<&str>,
    host: Option<&str>,
    port: Option<u16>,
    version: u8,
) -> String {
    let base = match (path, host, port) {
        (Some(path), _, _) => path.to_string(),
        (None, Some(host), Some(port)) => format!("{host}:{port}"),
        _ => uuid::Uuid::new_v4().simple().to_string(),
    };
    format!("{base}v{version}")
}

/// Set of subscriber reply queues held weakly.
///
/// Membership must not extend a queue's lifetime; dead entries are pruned
/// on every traversal. Mutation always happens under the owning server's
/// lock, so adds never race a concurrent publish enumerating the set.
#[derive(Debug, Default)]
struct SubscriberSet {
    members: Vec<Weak<ReplyQueue>>,
}

impl SubscriberSet {
    fn add(&mut self, queue: &Arc<ReplyQueue>) {
        let target = Arc::downgrade(queue);
        if !self.members.iter().any(|w| w.ptr_eq(&target)) {
            self.members.push(target);
        }
    }

    fn remove(&mut self, queue: &Arc<ReplyQueue>) {
        let target = Arc::downgrade(queue);
        self.members.retain(|w| !w.ptr_eq(&target));
    }

    /// Upgrade live members, dropping decayed ones in place.
    fn live(&mut self) -> Vec<Arc<ReplyQueue>> {
        let mut live = Vec::with_capacity(self.members.len());
        self.members.retain(|w| match w.upgrade() {
            Some(q) => {
                live.push(q);
                true
            }
            None => false,
        });
        live
    }

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Mutable interior of a simulated server, guarded by one lock.
#[derive(Debug, Default)]
struct ServerInner {
    /// Database index -> keyspace, created lazily on first access
    dbs: HashMap<usize, Database>,
    /// Channel name -> subscribed connection queues
    subscribers: HashMap<String, SubscriberSet>,
    /// Glob pattern -> subscribed connection queues
    psubscribers: HashMap<String, SubscriberSet>,
    /// Timestamp of the last successful save
    lastsave: Option<DateTime<Utc>>,
    /// Queues of explicitly disconnected connections, reaped lazily
    closing: Vec<Weak<ReplyQueue>>,
}

/// Shared state of one simulated server.
///
/// Created once per identity key by the [`crate::registry::ServerRegistry`]
/// and kept alive for the life of the process (or until the registry is
/// reset). Many connections share one instance.
#[derive(Debug)]
pub struct ServerState {
    key: String,
    version: u8,
    connected: AtomicBool,
    inner: Mutex<ServerInner>,
}

impl ServerState {
    /// Create a fresh server under the given identity key.
    ///
    /// Construction never fails. The server starts connected with an empty
    /// keyspace and a last-save timestamp of "now".
    pub fn new(key: impl Into<String>, version: u8) -> Self {
        ServerState {
            key: key.into(),
            version,
            connected: AtomicBool::new(true),
            inner: Mutex::new(ServerInner {
                lastsave: Some(Utc::now()),
                ..ServerInner::default()
            }),
        }
    }

    /// Identity key naming this server.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Protocol version tag this server was registered under.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Whether the server currently accepts traffic.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Toggle whether the server accepts traffic; used to simulate outages.
    pub fn set_connected(&self, connected: bool) {
        debug!(server = %self.key, connected, "connectivity changed");
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Run `f` against the database at `index`, creating it on first use.
    ///
    /// The server lock is held for the duration of `f`; keep the critical
    /// section small.
    pub fn with_db<R>(&self, index: usize, f: impl FnOnce(&mut Database) -> R) -> R {
        let mut inner = self.inner.lock();
        f(inner.dbs.entry(index).or_default())
    }

    /// Drop every key in every database.
    pub fn flush_all(&self) {
        let mut inner = self.inner.lock();
        for db in inner.dbs.values_mut() {
            db.clear();
        }
    }

    /// Timestamp of the last save, if one happened.
    pub fn lastsave(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().lastsave
    }

    /// Record a save and return its timestamp.
    pub fn mark_saved(&self) -> DateTime<Utc> {
        let now = Utc::now();
        self.inner.lock().lastsave = Some(now);
        now
    }

    /// Register `queue` as a subscriber of `channel`.
    pub fn subscribe(&self, channel: &str, queue: &Arc<ReplyQueue>) {
        let mut inner = self.inner.lock();
        inner.subscribers.entry(channel.to_string()).or_default().add(queue);
    }

    /// Remove `queue` from `channel`'s subscriber set.
    pub fn unsubscribe(&self, channel: &str, queue: &Arc<ReplyQueue>) {
        let mut inner = self.inner.lock();
        if let Some(set) = inner.subscribers.get_mut(channel) {
            set.remove(queue);
            if set.is_empty() {
                inner.subscribers.remove(channel);
            }
        }
    }

    /// Register `queue` as a subscriber of the glob `pattern`.
    pub fn psubscribe(&self, pattern: &str, queue: &Arc<ReplyQueue>) {
        let mut inner = self.inner.lock();
        inner.psubscribers.entry(pattern.to_string()).or_default().add(queue);
    }

    /// Remove `queue` from `pattern`'s subscriber set.
    pub fn punsubscribe(&self, pattern: &str, queue: &Arc<ReplyQueue>) {
        let mut inner = self.inner.lock();
        if let Some(set) = inner.psubscribers.get_mut(pattern) {
            set.remove(queue);
            if set.is_empty() {
                inner.psubscribers.remove(pattern);
            }
        }
    }

    /// Count of live subscribers currently registered for `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        let mut inner = self.inner.lock();
        inner
            .subscribers
            .get_mut(channel)
            .map(|set| set.live().len())
            .unwrap_or(0)
    }

    /// Deliver `payload` to every live subscriber of `channel` and every
    /// live pattern subscriber whose pattern matches it.
    ///
    /// Returns the number of queues the message reached. Decayed
    /// subscriptions are pruned as a side effect.
    pub fn publish(&self, channel: &str, payload: &[u8]) -> usize {
        let mut inner = self.inner.lock();
        let mut receivers = 0;

        if let Some(set) = inner.subscribers.get_mut(channel) {
            for queue in set.live() {
                queue.push(Value::Array(vec![
                    Value::Bytes(b"message".to_vec()),
                    Value::Bytes(channel.as_bytes().to_vec()),
                    Value::Bytes(payload.to_vec()),
                ]));
                receivers += 1;
            }
        }

        // Pattern delivery carries the matched pattern alongside the channel.
        let patterns: Vec<String> = inner
            .psubscribers
            .keys()
            .filter(|p| glob_match(p, channel))
            .cloned()
            .collect();
        for pattern in patterns {
            if let Some(set) = inner.psubscribers.get_mut(&pattern) {
                for queue in set.live() {
                    queue.push(Value::Array(vec![
                        Value::Bytes(b"pmessage".to_vec()),
                        Value::Bytes(pattern.as_bytes().to_vec()),
                        Value::Bytes(channel.as_bytes().to_vec()),
                        Value::Bytes(payload.to_vec()),
                    ]));
                    receivers += 1;
                }
            }
        }

        inner.closing.retain(|w| w.strong_count() > 0);
        debug!(server = %self.key, channel, receivers, "publish");
        receivers
    }

    /// Tear down a disconnecting connection's registrations.
    ///
    /// Removes `queue` from every channel and pattern subscriber set, then
    /// parks a weak handle on the deferred-teardown list so any remaining
    /// cleanup can happen past the connection's last observable use. Dead
    /// entries already on the list are reaped while we are here.
    pub fn retire(&self, queue: &Arc<ReplyQueue>) {
        let mut inner = self.inner.lock();
        let target = Arc::downgrade(queue);
        inner.subscribers.retain(|_, set| {
            set.members.retain(|w| !w.ptr_eq(&target));
            !set.members.is_empty()
        });
        inner.psubscribers.retain(|_, set| {
            set.members.retain(|w| !w.ptr_eq(&target));
            !set.members.is_empty()
        });
        inner.closing.retain(|w| w.strong_count() > 0);
        inner.closing.push(target);
        debug!(server = %self.key, "connection retired");
    }

    /// Number of connections currently parked for deferred teardown.
    pub fn pending_teardown(&self) -> usize {
        self.inner.lock().closing.len()
    }
}
