//! Reply-decoding tests through the full stack

use crate::common::*;

#[test]
fn nested_replies_decode_isomorphically() {
    let host = unique_host("decode-nested");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_decode_responses(),
    )
    .unwrap();

    let mut pubsub = client.pubsub().unwrap();
    pubsub.subscribe(&["chan"]).unwrap();
    client.publish("chan", "payload").unwrap();

    // the pushed message is a nested array of byte leaves; with decoding on,
    // every leaf comes back as text and the shape is untouched
    let message = pubsub
        .get_message(std::time::Duration::from_secs(1))
        .unwrap()
        .unwrap();
    assert_eq!(
        message,
        Value::Array(vec![
            Value::Str("message".to_string()),
            Value::Str("chan".to_string()),
            Value::Str("payload".to_string()),
        ])
    );
}

#[test]
fn raw_client_keeps_bytes() {
    let host = unique_host("decode-raw");
    let client = client_at(&host);
    client.set("k", "value").unwrap();
    assert_eq!(client.get("k").unwrap(), bytes("value"));
}

#[test]
fn per_read_opt_out_beats_client_flag() {
    let host = unique_host("decode-optout");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_decode_responses(),
    )
    .unwrap();
    client.set("k", "value").unwrap();

    let mut conn = client.connection().unwrap();
    conn.send_command(vec![b"GET".to_vec(), b"k".to_vec()]).unwrap();
    let raw = conn
        .read_response(&ReadOptions {
            disable_decoding: true,
            ..ReadOptions::default()
        })
        .unwrap();
    assert_eq!(raw, bytes("value"));
}

#[test]
fn strict_decoding_rejects_invalid_text() {
    let host = unique_host("decode-strict");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_decode_responses(),
    )
    .unwrap();
    client.set("k", [0xffu8, 0xfe]).unwrap();
    match client.get("k") {
        Err(MirageError::Decode { .. }) => {}
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn replace_mode_substitutes_invalid_text() {
    let host = unique_host("decode-replace");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_decode_responses()
            .with_encoding_errors("replace"),
    )
    .unwrap();
    client.set("k", [b'a', 0xff]).unwrap();
    assert_eq!(client.get("k").unwrap(), Value::Str("a\u{fffd}".to_string()));
}

#[test]
fn remote_errors_never_decode() {
    let host = unique_host("decode-error");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_decode_responses(),
    )
    .unwrap();
    client.set("k", "not-a-number").unwrap();
    match client.incr("k") {
        Err(MirageError::Remote(err)) => {
            // message arrives exactly as the engine produced it
            assert_eq!(err.kind, "ERR");
            assert_eq!(err.message, "value is not an integer or out of range");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}
