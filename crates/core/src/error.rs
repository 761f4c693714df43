//! Error types for Mirage
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The connection-facing taxonomy mirrors what real transport code produces:
//! - `ConnectionRefused`: raised from `connect()` when the target server is down
//! - `ConnectionLost`: raised from `read_response()` when the server is down
//!   and nothing is buffered
//! - `Remote`: an application-level error carried through the response channel,
//!   re-raised exactly as produced by the command engine
//!
//! Refused/Lost are never retried internally; retry policy belongs to the
//! caller or the pool layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Mirage operations
pub type MirageResult<T> = std::result::Result<T, MirageError>;

/// An application-level error produced by the command engine.
///
/// Carried through the response channel as a first-class value and re-raised
/// verbatim. The decoding path never touches these, so error kind and message
/// arrive at the caller exactly as the engine produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} {message}")]
pub struct RemoteError {
    /// Error class, the leading word of a server error reply (e.g. `ERR`, `WRONGTYPE`)
    pub kind: String,
    /// Human-readable detail, passed through untouched
    pub message: String,
}

impl RemoteError {
    /// Create a new remote error with the given kind and message
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a generic `ERR`-class error
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new("ERR", message)
    }
}

/// Error types for Mirage
#[derive(Debug, Error)]
pub enum MirageError {
    /// Connect was attempted while the simulated server is marked down
    #[error("connection refused: simulated server is not accepting connections")]
    ConnectionRefused,

    /// The simulated server went down and no buffered response remains
    #[error("connection lost: simulated server is down and no response is buffered")]
    ConnectionLost,

    /// Error value produced by the command engine, surfaced as received
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Strict-mode text decoding failure
    #[error("cannot decode byte 0x{byte:02x} at offset {offset} as {codec}")]
    Decode {
        /// Offending byte
        byte: u8,
        /// Byte offset within the reply
        offset: usize,
        /// Codec name in effect
        codec: &'static str,
    },

    /// Malformed connection URL
    #[error("invalid connection URL: {0}")]
    InvalidUrl(String),

    /// Unrecognized option value (codec name, error mode, ...)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection checkout beyond the configured pool limit
    #[error("connection pool exhausted ({limit} connections in use)")]
    PoolExhausted {
        /// Configured `max_connections`
        limit: usize,
    },

    /// A typed helper received a reply shape it cannot interpret
    #[error("unexpected reply to '{command}': {reply}")]
    UnexpectedReply {
        /// Command the helper issued
        command: String,
        /// Variant name of the offending reply
        reply: &'static str,
    },
}

impl MirageError {
    /// True for the two transport-level failures (`ConnectionRefused`/`ConnectionLost`)
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MirageError::ConnectionRefused | MirageError::ConnectionLost
        )
    }
}
