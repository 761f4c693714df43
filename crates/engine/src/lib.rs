//! Simulated server engine for Mirage
//!
//! This crate owns everything "server-side" of the substitution layer:
//! - ServerState: shared databases, subscriber registries, connectivity flag
//! - ServerRegistry: process-wide identity key -> server state cache
//! - ReplyQueue: blocking/non-blocking/probing reply channel
//! - CommandEngine / EngineSession: the interface the connection layer
//!   consumes, plus CoreEngine, the bundled reference implementation
//!
//! The engine crate knows nothing about client options, pools, or URLs;
//! that is `mirage-client`'s territory.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod database;
pub mod engine;
pub mod glob;
pub mod queue;
pub mod registry;
pub mod server;

// Re-export commonly used types
pub use database::Database;
pub use engine::{CommandEngine, CoreEngine, EngineSession, Request};
pub use glob::glob_match;
pub use queue::ReplyQueue;
pub use registry::{ServerRegistry, SERVERS};
pub use server::{resolve_identity, ServerState, DEFAULT_PROTOCOL_VERSION};
