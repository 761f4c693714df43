//! Shared-singleton tests
//!
//! Serialized in one test: the singleton is process-wide state and the
//! harness runs tests threaded.

use std::sync::Arc;

use miragedb::{reset_shared_client, shared_client};

use crate::common::*;

#[test]
fn singleton_lifecycle() {
    init_tracing();
    reset_shared_client();

    // every call site sees the same client and therefore the same server
    let a = shared_client().unwrap();
    let b = shared_client().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    a.set("task", "queued").unwrap();
    assert_eq!(b.get("task").unwrap(), bytes("queued"));

    // resetting starts a fresh universe
    reset_shared_client();
    let c = shared_client().unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(c.get("task").unwrap(), Value::Nil);

    // the old handle keeps working against its own server
    assert_eq!(a.get("task").unwrap(), bytes("queued"));

    reset_shared_client();
}
