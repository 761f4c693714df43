//! Process-wide shared client
//!
//! Isolated clients deliberately do not share state, which trips up
//! integrations (task queues, schedulers) that construct their own client
//! per component and expect one backing server. The fix is the same one the
//! original ships: a lazily constructed singleton client that every call
//! site clones, so all of them observe the same simulated server.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use mirage_core::MirageResult;

use crate::client::MirageClient;
use crate::config::ClientConfig;

static SHARED: Lazy<Mutex<Option<Arc<MirageClient>>>> = Lazy::new(|| Mutex::new(None));

/// The process-wide client, constructed with defaults on first call.
///
/// Every subsequent call returns a handle to the same client (and therefore
/// the same simulated server), regardless of call site.
pub fn shared_client() -> MirageResult<Arc<MirageClient>> {
    let mut guard = SHARED.lock();
    if let Some(client) = guard.as_ref() {
        return Ok(Arc::clone(client));
    }
    let client = Arc::new(MirageClient::new(ClientConfig::new())?);
    *guard = Some(Arc::clone(&client));
    Ok(client)
}

/// Drop the shared client so the next call builds a fresh one.
///
/// Intended for test isolation, alongside resetting the server registry.
pub fn reset_shared_client() {
    SHARED.lock().take();
}
