//! Reply queue connecting a command engine to one connection
//!
//! Each engine session owns one `ReplyQueue`; the session's connection reads
//! from it. Exactly one reply is enqueued per submitted request, so requests
//! issued sequentially on one connection come back in order.
//!
//! Three read disciplines, matching what the transport layer needs:
//! - `pop`: blocking wait for the next reply (connected read path)
//! - `try_pop`: non-blocking fetch (fail-fast read path on a dead server)
//! - `ready`: non-consuming readiness probe with zero or bounded timeout
//!
//! Uses `parking_lot::Mutex` + `Condvar` rather than a channel because the
//! readiness probe must observe "a reply is available" without consuming it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use mirage_core::Value;

/// Unbounded FIFO of replies with blocking, non-blocking, and probing reads.
#[derive(Debug, Default)]
pub struct ReplyQueue {
    inner: Mutex<VecDeque<Value>>,
    available: Condvar,
}

impl ReplyQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a reply and wake one waiting reader.
    pub fn push(&self, value: Value) {
        let mut queue = self.inner.lock();
        queue.push_back(value);
        drop(queue);
        self.available.notify_one();
    }

    /// Blocking fetch of the next reply.
    ///
    /// Waits indefinitely; the engine contract (one reply per accepted
    /// request, error values included) guarantees the wait is bounded by the
    /// caller's own request/response discipline.
    pub fn pop(&self) -> Value {
        let mut queue = self.inner.lock();
        loop {
            if let Some(value) = queue.pop_front() {
                return value;
            }
            self.available.wait(&mut queue);
        }
    }

    /// Non-blocking fetch. Returns `None` if nothing is queued.
    pub fn try_pop(&self) -> Option<Value> {
        self.inner.lock().pop_front()
    }

    /// Non-consuming readiness probe.
    ///
    /// A zero timeout is an instant poll. A positive timeout waits until a
    /// reply is available or the timeout elapses, returning `false` on
    /// timeout with nothing queued.
    pub fn ready(&self, timeout: Duration) -> bool {
        let mut queue = self.inner.lock();
        if !queue.is_empty() {
            return true;
        }
        if timeout.is_zero() {
            return false;
        }
        let deadline = Instant::now() + timeout;
        // Condvar waits can wake spuriously; loop against the deadline.
        while queue.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            if self
                .available
                .wait_for(&mut queue, deadline - now)
                .timed_out()
                && queue.is_empty()
            {
                return false;
            }
        }
        true
    }

    /// Number of replies currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when no reply is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
