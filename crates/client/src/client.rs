//! Top-level client adapter
//!
//! `MirageClient` constructs the familiar client/pool/connection stack while
//! substituting the connection factory with the simulated one and binding it
//! to shared server state — either resolved through the process-wide
//! registry from the configured identity, or taken from an explicit
//! `server` handle.
//!
//! Construction is where option handling lives: deprecated aliases are
//! translated (with a warning each), the three simulation extras (`server`,
//! `connected`, `version`) are stripped before pool construction, and only
//! the fixed allow-list of options reaches the pool.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use mirage_core::{MirageError, MirageResult, Value};
use mirage_engine::{resolve_identity, CommandEngine, CoreEngine, ServerState, SERVERS};

use crate::config::ClientConfig;
use crate::connection::ConnectionSpec;
use crate::pool::{ConnectionPool, MirageFactory, PooledConnection};
use crate::pubsub::PubSub;
use crate::url::parse_url;

/// Client facade over a pool of simulated connections.
pub struct MirageClient {
    pool: ConnectionPool,
    server: Arc<ServerState>,
}

impl MirageClient {
    /// Build a client with the bundled reference engine.
    pub fn new(config: ClientConfig) -> MirageResult<Self> {
        Self::with_engine(config, Arc::new(CoreEngine::new()))
    }

    /// Build a client routing requests through a caller-provided engine.
    pub fn with_engine(
        mut config: ClientConfig,
        engine: Arc<dyn CommandEngine>,
    ) -> MirageResult<Self> {
        for deprecation in config.normalize() {
            warn!("{deprecation}");
        }
        let options = config.pool_options()?;

        // An explicit server handle wins; otherwise resolve identity and go
        // through the registry so equal endpoints share state.
        let server = match config.server.take() {
            Some(server) => server,
            None => {
                let key = resolve_identity(
                    config.path.as_deref(),
                    options.host.as_deref(),
                    options.port,
                    config.effective_version(),
                );
                let server = SERVERS.get_or_create(&key, config.effective_version());
                server.set_connected(config.effective_connected());
                server
            }
        };

        let spec = ConnectionSpec {
            server_key: server.key().to_string(),
            server: Arc::clone(&server),
            db: options.db,
            engine,
            encoding: options.encoding,
            decode_responses: options.decode_responses,
            client_name: options.client_name.clone(),
        };
        let pool = ConnectionPool::new(
            Arc::new(MirageFactory::new(spec)),
            options.max_connections,
        );
        Ok(MirageClient { pool, server })
    }

    /// Build a client from a connection URL.
    ///
    /// Parses through the same grammar as the wrapped library, strips any
    /// username/password, and preserves every other parsed field.
    pub fn from_url(url: &str) -> MirageResult<Self> {
        Self::new(parse_url(url)?)
    }

    /// The shared server state this client is bound to.
    ///
    /// Handy for simulating outages: `client.server().set_connected(false)`.
    pub fn server(&self) -> &Arc<ServerState> {
        &self.server
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Check out a connection for manual request/response work.
    pub fn connection(&self) -> MirageResult<PooledConnection<'_>> {
        self.pool.get()
    }

    /// A pub/sub handle over its own dedicated connection.
    pub fn pubsub(&self) -> MirageResult<PubSub> {
        Ok(PubSub::new(self.pool.factory().make_connection()?))
    }

    /// Submit an arbitrary command and return its reply.
    pub fn execute(&self, parts: &[&[u8]]) -> MirageResult<Value> {
        let mut conn = self.pool.get()?;
        conn.execute(parts.iter().map(|p| p.to_vec()).collect())
    }

    // =========================================================================
    // Command helpers
    // =========================================================================

    /// PING; replies `PONG`.
    pub fn ping(&self) -> MirageResult<Value> {
        self.execute(&[b"PING"])
    }

    /// ECHO the given payload back.
    pub fn echo(&self, message: &str) -> MirageResult<Value> {
        self.execute(&[b"ECHO", message.as_bytes()])
    }

    /// GET a key's value (`Value::Nil` when absent).
    pub fn get(&self, key: &str) -> MirageResult<Value> {
        self.execute(&[b"GET", key.as_bytes()])
    }

    /// SET a key to a value.
    pub fn set(&self, key: &str, value: impl AsRef<[u8]>) -> MirageResult<()> {
        expect_ok("SET", self.execute(&[b"SET", key.as_bytes(), value.as_ref()])?)
    }

    /// DEL the given keys; returns how many existed.
    pub fn del(&self, keys: &[&str]) -> MirageResult<i64> {
        let mut parts: Vec<&[u8]> = vec![b"DEL"];
        parts.extend(keys.iter().map(|k| k.as_bytes()));
        expect_int("DEL", self.execute(&parts)?)
    }

    /// EXISTS count over the given keys.
    pub fn exists(&self, keys: &[&str]) -> MirageResult<i64> {
        let mut parts: Vec<&[u8]> = vec![b"EXISTS"];
        parts.extend(keys.iter().map(|k| k.as_bytes()));
        expect_int("EXISTS", self.execute(&parts)?)
    }

    /// INCR a counter key; returns the new value.
    pub fn incr(&self, key: &str) -> MirageResult<i64> {
        expect_int("INCR", self.execute(&[b"INCR", key.as_bytes()])?)
    }

    /// Number of keys in the selected database.
    pub fn dbsize(&self) -> MirageResult<i64> {
        expect_int("DBSIZE", self.execute(&[b"DBSIZE"])?)
    }

    /// Drop every key in the selected database.
    pub fn flushdb(&self) -> MirageResult<()> {
        expect_ok("FLUSHDB", self.execute(&[b"FLUSHDB"])?)
    }

    /// Drop every key in every database of the bound server.
    pub fn flushall(&self) -> MirageResult<()> {
        expect_ok("FLUSHALL", self.execute(&[b"FLUSHALL"])?)
    }

    /// Unix timestamp of the last save.
    pub fn lastsave(&self) -> MirageResult<i64> {
        expect_int("LASTSAVE", self.execute(&[b"LASTSAVE"])?)
    }

    /// Record a save.
    pub fn save(&self) -> MirageResult<()> {
        expect_ok("SAVE", self.execute(&[b"SAVE"])?)
    }

    /// PUBLISH a payload; returns the number of receiving subscribers.
    pub fn publish(&self, channel: &str, payload: impl AsRef<[u8]>) -> MirageResult<i64> {
        expect_int(
            "PUBLISH",
            self.execute(&[b"PUBLISH", channel.as_bytes(), payload.as_ref()])?,
        )
    }
}

impl fmt::Debug for MirageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirageClient")
            .field("server", &self.server.key())
            .field("pool", &self.pool)
            .finish()
    }
}

fn expect_int(command: &str, reply: Value) -> MirageResult<i64> {
    reply.as_int().ok_or_else(|| MirageError::UnexpectedReply {
        command: command.to_string(),
        reply: reply.type_name(),
    })
}

fn expect_ok(command: &str, reply: Value) -> MirageResult<()> {
    let ok = match &reply {
        Value::Bytes(bytes) => bytes == b"OK",
        Value::Str(s) => s == "OK",
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(MirageError::UnexpectedReply {
            command: command.to_string(),
            reply: reply.type_name(),
        })
    }
}
