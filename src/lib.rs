//! MirageDB - in-process stand-in for a networked Redis-style key-value store
//!
//! Mirage lets code written against a networked key-value client run
//! unmodified with no socket and no server process: the transport layer is
//! substituted with an in-process command engine, while connections keep
//! the exact observable contract of real transport code (error timing,
//! error types, decoding behavior, connection identity).
//!
//! # Quick Start
//!
//! ```ignore
//! use miragedb::{ClientConfig, MirageClient, Value};
//!
//! // Two clients with the same endpoint observe the same server
//! let a = MirageClient::new(ClientConfig::new().with_host("cache").with_port(6379))?;
//! let b = MirageClient::new(ClientConfig::new().with_host("cache").with_port(6379))?;
//!
//! a.set("user:1", "Alice")?;
//! assert_eq!(b.get("user:1")?, Value::Bytes(b"Alice".to_vec()));
//!
//! // Simulate an outage
//! a.server().set_connected(false);
//! assert!(b.ping().is_err());
//! ```
//!
//! # Architecture
//!
//! Identity keys resolve through a process-wide registry to shared
//! [`ServerState`]; connections attach engine sessions to it and read
//! replies through a blocking/probing queue. The client adapter wires the
//! simulated connection factory into an ordinary pool.

// Re-export the public API from the member crates
pub use mirage_core::{
    DecodeErrorMode, MirageError, MirageResult, RemoteError, TextEncoding, Value,
};
pub use mirage_engine::{
    resolve_identity, CommandEngine, CoreEngine, Database, EngineSession, ReplyQueue, Request,
    ServerRegistry, ServerState, DEFAULT_PROTOCOL_VERSION, SERVERS,
};
pub use mirage_client::{
    parse_url, reset_shared_client, shared_client, ClientConfig, ConnectionFactory,
    ConnectionPool, ConnectionSpec, ConnectionState, Deprecation, MirageClient, MirageConnection,
    MirageFactory, PoolOptions, PooledConnection, PubSub, ReadOptions, ResponseSelector,
};
