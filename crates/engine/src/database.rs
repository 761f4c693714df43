//! Keyspace storage for one database index
//!
//! A simulated server holds a map of database index -> `Database`, all of
//! them guarded by the server's single interior lock. `Database` itself is
//! therefore plain data: every access path already runs under that lock, so
//! no per-database synchronization exists here.

use std::collections::HashMap;

use mirage_core::Value;

/// One keyspace. Created lazily on first access of its index.
///
/// Keys are raw bytes, exactly as submitted on the wire path. Values are
/// stored in their undecoded form (`Value::Bytes` for everything the string
/// commands write), so reads observe the same bytes a real server would
/// return.
#[derive(Debug, Default)]
pub struct Database {
    entries: HashMap<Vec<u8>, Value>,
}

impl Database {
    /// Creates an empty keyspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a stored value by key.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Store a value, replacing any previous value for the key.
    pub fn set(&mut self, key: Vec<u8>, value: Value) {
        self.entries.insert(key, value);
    }

    /// Remove a key. Returns `true` if it existed.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    /// True if the key currently holds a value.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys in this keyspace.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the keyspace holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every key.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
