//! Core types for Mirage
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: unified reply enum for everything the command engine can enqueue
//! - TextEncoding: validated codec + error-mode policy for reply decoding
//! - MirageError / RemoteError: error type hierarchy
//!
//! Nothing here knows about servers, connections, or pools; those live in
//! `mirage-engine` and `mirage-client`.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod encoding;
pub mod error;
pub mod value;

// Re-export commonly used types
pub use encoding::{DecodeErrorMode, TextEncoding};
pub use error::{MirageError, MirageResult, RemoteError};
pub use value::Value;
