//! Subscriber handle over a dedicated connection
//!
//! Subscriptions put a connection into a push-message mode, so the handle
//! owns its own connection instead of borrowing pooled ones. The handle
//! mirrors its active subscriptions locally; that is what lets
//! unsubscribe-all know how many confirmations to drain.

use std::time::Duration;

use mirage_core::{MirageResult, Value};

use crate::connection::{MirageConnection, ReadOptions};

/// Pub/sub handle owning one dedicated connection.
#[derive(Debug)]
pub struct PubSub {
    conn: MirageConnection,
    channels: Vec<String>,
    patterns: Vec<String>,
}

impl PubSub {
    /// Wrap a dedicated connection.
    pub fn new(conn: MirageConnection) -> Self {
        PubSub {
            conn,
            channels: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Channels this handle is subscribed to.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Patterns this handle is subscribed to.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Subscribe to the given channels, draining one confirmation each.
    pub fn subscribe(&mut self, channels: &[&str]) -> MirageResult<()> {
        self.enroll(channels, b"SUBSCRIBE", false)
    }

    /// Subscribe to the given glob patterns.
    pub fn psubscribe(&mut self, patterns: &[&str]) -> MirageResult<()> {
        self.enroll(patterns, b"PSUBSCRIBE", true)
    }

    /// Unsubscribe from the given channels, or from all when empty.
    pub fn unsubscribe(&mut self, channels: &[&str]) -> MirageResult<()> {
        self.withdraw(channels, b"UNSUBSCRIBE", false)
    }

    /// Unsubscribe from the given patterns, or from all when empty.
    pub fn punsubscribe(&mut self, patterns: &[&str]) -> MirageResult<()> {
        self.withdraw(patterns, b"PUNSUBSCRIBE", true)
    }

    /// Next pushed message, waiting at most `timeout`.
    ///
    /// Returns `None` when nothing arrives in time. `Duration::ZERO` polls.
    pub fn get_message(&mut self, timeout: Duration) -> MirageResult<Option<Value>> {
        if self.conn.can_read(timeout)? {
            return self.conn.read_response(&ReadOptions::default()).map(Some);
        }
        Ok(None)
    }

    /// Tear down the dedicated connection.
    pub fn close(&mut self) {
        self.conn.disconnect();
    }

    fn enroll(&mut self, names: &[&str], command: &[u8], pattern: bool) -> MirageResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        let mut request = vec![command.to_vec()];
        request.extend(names.iter().map(|n| n.as_bytes().to_vec()));
        self.conn.send_command(request)?;
        for name in names {
            self.conn.read_response(&ReadOptions::default())?;
            let list = if pattern { &mut self.patterns } else { &mut self.channels };
            if !list.iter().any(|n| n == name) {
                list.push((*name).to_string());
            }
        }
        Ok(())
    }

    fn withdraw(&mut self, names: &[&str], command: &[u8], pattern: bool) -> MirageResult<()> {
        let mut request = vec![command.to_vec()];
        request.extend(names.iter().map(|n| n.as_bytes().to_vec()));
        self.conn.send_command(request)?;
        let tracked = if pattern { &mut self.patterns } else { &mut self.channels };
        // one confirmation per name; dropping everything still confirms once
        let expected = if names.is_empty() {
            tracked.len().max(1)
        } else {
            names.len()
        };
        if names.is_empty() {
            tracked.clear();
        } else {
            tracked.retain(|n| !names.contains(&n.as_str()));
        }
        for _ in 0..expected {
            self.conn.read_response(&ReadOptions::default())?;
        }
        Ok(())
    }
}
