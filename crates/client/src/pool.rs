//! Connection pool with an injectable connection factory
//!
//! The wrapped client library composes a pool with a connection class; the
//! simulated layer keeps that shape but swaps the factory. The pool never
//! knows whether its factory produces real transports or simulated ones —
//! explicit composition at the seam instead of subclass surgery.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use mirage_core::{MirageError, MirageResult};

use crate::connection::{ConnectionSpec, MirageConnection};

/// Creates connections on demand for a pool (or for dedicated consumers
/// such as a pub/sub handle).
pub trait ConnectionFactory: Send + Sync {
    /// Build one unconnected connection.
    fn make_connection(&self) -> MirageResult<MirageConnection>;
}

/// The simulated factory: stamps out connections bound to one shared
/// server state.
#[derive(Debug, Clone)]
pub struct MirageFactory {
    spec: ConnectionSpec,
}

impl MirageFactory {
    /// Build a factory producing connections from `spec`.
    pub fn new(spec: ConnectionSpec) -> Self {
        MirageFactory { spec }
    }

    /// The spec this factory stamps connections from.
    pub fn spec(&self) -> &ConnectionSpec {
        &self.spec
    }
}

impl ConnectionFactory for MirageFactory {
    fn make_connection(&self) -> MirageResult<MirageConnection> {
        Ok(MirageConnection::new(self.spec.clone()))
    }
}

#[derive(Default)]
struct PoolState {
    idle: Vec<MirageConnection>,
    in_use: usize,
}

/// Checkout/checkin pool over a [`ConnectionFactory`].
///
/// Connections are created lazily, recycled on checkin, and capped by
/// `max_connections` when one is configured (checkout past the cap is a
/// [`MirageError::PoolExhausted`], surfaced to the caller rather than
/// queued — retry policy belongs to the caller).
pub struct ConnectionPool {
    factory: Arc<dyn ConnectionFactory>,
    max_connections: Option<usize>,
    state: Mutex<PoolState>,
}

impl ConnectionPool {
    /// Build a pool over `factory`, optionally capped.
    pub fn new(factory: Arc<dyn ConnectionFactory>, max_connections: Option<usize>) -> Self {
        ConnectionPool {
            factory,
            max_connections,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// The factory this pool draws from.
    pub fn factory(&self) -> &Arc<dyn ConnectionFactory> {
        &self.factory
    }

    /// Check out a connection, reusing an idle one when available.
    pub fn get(&self) -> MirageResult<PooledConnection<'_>> {
        let mut state = self.state.lock();
        if let Some(conn) = state.idle.pop() {
            state.in_use += 1;
            return Ok(PooledConnection {
                pool: self,
                conn: Some(conn),
            });
        }
        if let Some(limit) = self.max_connections {
            if state.in_use >= limit {
                return Err(MirageError::PoolExhausted { limit });
            }
        }
        let conn = self.factory.make_connection()?;
        state.in_use += 1;
        debug!(in_use = state.in_use, "pool created connection");
        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
        })
    }

    /// Number of connections currently checked out.
    pub fn in_use(&self) -> usize {
        self.state.lock().in_use
    }

    /// Number of idle connections waiting for reuse.
    pub fn idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Disconnect and drop every idle connection.
    ///
    /// Checked-out connections are untouched; they tear down when their
    /// guards return them and the pool is subsequently drained, or when
    /// they drop.
    pub fn disconnect_idle(&self) {
        let mut state = self.state.lock();
        for mut conn in state.idle.drain(..) {
            conn.disconnect();
        }
    }

    fn checkin(&self, conn: MirageConnection) {
        let mut state = self.state.lock();
        state.in_use = state.in_use.saturating_sub(1);
        state.idle.push(conn);
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConnectionPool")
            .field("max_connections", &self.max_connections)
            .field("in_use", &state.in_use)
            .field("idle", &state.idle.len())
            .finish()
    }
}

/// RAII checkout guard; returns the connection to the pool on drop.
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<MirageConnection>,
}

impl Deref for PooledConnection<'_> {
    type Target = MirageConnection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.checkin(conn);
        }
    }
}

impl fmt::Debug for PooledConnection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn)
            .finish()
    }
}
