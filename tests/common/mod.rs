//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any suite's
//! main.rs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

pub use miragedb::{
    ClientConfig, ConnectionState, MirageClient, MirageError, ReadOptions, Value, SERVERS,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test subscriber once so `RUST_LOG`-gated output works when a
/// test is run with `--nocapture`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A host name no other test in this process has used.
///
/// The server registry is process-wide and suites run threaded in one
/// binary, so endpoint-based tests each take a fresh host to stay isolated.
pub fn unique_host(prefix: &str) -> String {
    format!("{prefix}-{}", COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Client bound to `host:6379` through the process-wide registry.
pub fn client_at(host: &str) -> MirageClient {
    init_tracing();
    MirageClient::new(ClientConfig::new().with_host(host).with_port(6379))
        .expect("client construction")
}

/// Bytes helper for reply assertions.
pub fn bytes(s: &str) -> Value {
    Value::Bytes(s.as_bytes().to_vec())
}
