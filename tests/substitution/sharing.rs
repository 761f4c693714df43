//! State-sharing tests
//!
//! Connections constructed with the same identity observe one server;
//! omitted identity deliberately isolates.

use crate::common::*;

#[test]
fn same_host_port_version_share_state() {
    let host = unique_host("share");
    let a = client_at(&host);
    let b = client_at(&host);

    a.set("k", "written-through-a").unwrap();
    assert_eq!(b.get("k").unwrap(), bytes("written-through-a"));

    // mutation through either client is visible to both
    b.del(&["k"]).unwrap();
    assert_eq!(a.get("k").unwrap(), Value::Nil);
}

#[test]
fn same_explicit_path_shares_state() {
    let path = format!("/tmp/{}.sock", unique_host("path"));
    let a = MirageClient::from_url(&format!("unix://{path}")).unwrap();
    let b = MirageClient::from_url(&format!("unix://{path}")).unwrap();
    a.set("k", "v").unwrap();
    assert_eq!(b.get("k").unwrap(), bytes("v"));
    assert_eq!(a.server().key(), b.server().key());
}

#[test]
fn different_versions_never_collide() {
    let host = unique_host("ver");
    let v6 = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_version(6),
    )
    .unwrap();
    let v7 = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_version(7),
    )
    .unwrap();

    v6.set("k", "six").unwrap();
    assert_eq!(v7.get("k").unwrap(), Value::Nil);
    assert_ne!(v6.server().key(), v7.server().key());
}

#[test]
fn omitted_identity_is_isolated() {
    init_tracing();
    let a = MirageClient::new(ClientConfig::new()).unwrap();
    let b = MirageClient::new(ClientConfig::new()).unwrap();
    a.set("k", "v").unwrap();
    assert_eq!(b.get("k").unwrap(), Value::Nil);
}

#[test]
fn databases_isolate_within_one_server() {
    let host = unique_host("dbidx");
    let db0 = client_at(&host);
    let db1 = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_db(1),
    )
    .unwrap();

    db0.set("k", "zero").unwrap();
    assert_eq!(db1.get("k").unwrap(), Value::Nil);
    db1.set("k", "one").unwrap();
    assert_eq!(db0.get("k").unwrap(), bytes("zero"));

    // flushall spans both databases
    db0.flushall().unwrap();
    assert_eq!(db0.dbsize().unwrap(), 0);
    assert_eq!(db1.dbsize().unwrap(), 0);
}

#[test]
fn registry_reset_starts_fresh() {
    // a private registry mirrors the process-wide one without interfering
    // with parallel tests
    let registry = miragedb::ServerRegistry::new();
    let first = registry.get_or_create("resetv7", 7);
    first.with_db(0, |db| db.set(b"k".to_vec(), Value::Int(1)));
    registry.reset();
    let second = registry.get_or_create("resetv7", 7);
    assert!(second.with_db(0, |db| db.is_empty()));
}
