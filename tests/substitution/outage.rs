//! Outage-semantics tests
//!
//! Flipping a server's connectivity flag must reproduce real transport
//! failure timing: refusal at connect, readiness that never blocks, buffered
//! replies that drain before the loss surfaces.

use std::time::{Duration, Instant};

use crate::common::*;

#[test]
fn fresh_connect_refused_when_down() {
    let host = unique_host("down-connect");
    let client = client_at(&host);
    client.server().set_connected(false);

    let mut conn = client.connection().unwrap();
    match conn.connect() {
        Err(MirageError::ConnectionRefused) => {}
        other => panic!("expected refusal, got {other:?}"),
    }
    assert_eq!(conn.state(), ConnectionState::Errored);

    // facade calls fail the same way
    match client.ping() {
        Err(MirageError::ConnectionRefused) => {}
        other => panic!("expected refusal, got {other:?}"),
    }
}

#[test]
fn can_read_returns_immediately_when_down() {
    let host = unique_host("down-canread");
    let client = client_at(&host);
    let mut conn = client.connection().unwrap();
    conn.connect().unwrap();

    client.server().set_connected(false);
    let start = Instant::now();
    // even a long timeout must not block against a dead server
    assert!(conn.can_read(Duration::from_secs(30)).unwrap());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn read_drains_buffer_then_reports_loss() {
    let host = unique_host("down-read");
    let client = client_at(&host);
    let mut conn = client.connection().unwrap();
    conn.send_command(vec![b"PING".to_vec()]).unwrap();
    conn.send_command(vec![b"ECHO".to_vec(), b"queued".to_vec()])
        .unwrap();

    client.server().set_connected(false);

    // replies queued before the outage still arrive, in order
    assert_eq!(
        conn.read_response(&ReadOptions::default()).unwrap(),
        bytes("PONG")
    );
    assert_eq!(
        conn.read_response(&ReadOptions::default()).unwrap(),
        bytes("queued")
    );
    // then the loss surfaces instead of hanging
    match conn.read_response(&ReadOptions::default()) {
        Err(MirageError::ConnectionLost) => {}
        other => panic!("expected lost connection, got {other:?}"),
    }
}

#[test]
fn recovery_after_outage() {
    let host = unique_host("down-recover");
    let client = client_at(&host);
    client.set("k", "survives").unwrap();

    client.server().set_connected(false);
    assert!(client.ping().is_err());

    client.server().set_connected(true);
    // data survives the simulated outage
    assert_eq!(client.get("k").unwrap(), bytes("survives"));
}

#[test]
fn write_to_downed_server_fails() {
    let host = unique_host("down-write");
    let client = client_at(&host);
    let mut conn = client.connection().unwrap();
    conn.connect().unwrap();

    client.server().set_connected(false);
    match conn.send_command(vec![b"PING".to_vec()]) {
        Err(MirageError::ConnectionLost) => {}
        other => panic!("expected lost connection, got {other:?}"),
    }
}
