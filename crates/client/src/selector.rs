//! Readiness probe over a session's reply queue
//!
//! Real transport code answers "is a response currently available" by
//! polling the socket through a selector. The simulated equivalent asks the
//! reply queue instead: no file descriptors, no real I/O polling, identical
//! observable semantics (zero-timeout poll, bounded wait, `false` on
//! timeout).

use std::sync::Arc;
use std::time::Duration;

use mirage_engine::ReplyQueue;

/// Answers whether a reply is currently available on a session's queue.
///
/// (Re)initialized by the connection on every successful connect, mirroring
/// how a real connection rebuilds its selector around the fresh socket.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    replies: Arc<ReplyQueue>,
}

impl ResponseSelector {
    /// Build a selector over the given reply queue.
    pub fn new(replies: Arc<ReplyQueue>) -> Self {
        ResponseSelector { replies }
    }

    /// True when a reply can be read without blocking.
    ///
    /// `Duration::ZERO` is an instant poll; a positive timeout waits at most
    /// that long for a reply to arrive. Never consumes.
    pub fn check_can_read(&self, timeout: Duration) -> bool {
        self.replies.ready(timeout)
    }

    /// The queue this selector probes.
    pub fn replies(&self) -> &Arc<ReplyQueue> {
        &self.replies
    }
}
