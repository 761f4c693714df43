//! Client-side substitution layer for Mirage
//!
//! This crate owns everything between calling code and the engine:
//! - MirageConnection: the transport stand-in (connect, readiness, read,
//!   disconnect) with real-socket error timing
//! - ResponseSelector: readiness probe over a session's reply queue
//! - ConnectionPool / ConnectionFactory: explicit composition seam where the
//!   simulated factory is injected
//! - ClientConfig / parse_url: the enumerated option surface, deprecated
//!   alias translation, and the URL grammar of the wrapped library
//! - MirageClient: the top-level adapter plus command helpers and pub/sub
//! - shared_client: process-wide singleton for integrations expecting one
//!   backing server

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod client;
pub mod config;
pub mod connection;
pub mod pool;
pub mod pubsub;
pub mod selector;
pub mod singleton;
pub mod url;

// Re-export commonly used types
pub use client::MirageClient;
pub use config::{ClientConfig, Deprecation, PoolOptions};
pub use connection::{ConnectionSpec, ConnectionState, MirageConnection, ReadOptions};
pub use pool::{ConnectionFactory, ConnectionPool, MirageFactory, PooledConnection};
pub use pubsub::PubSub;
pub use selector::ResponseSelector;
pub use singleton::{reset_shared_client, shared_client};
pub use url::parse_url;
