//! Option-normalization tests

use miragedb::Deprecation;

use crate::common::*;

#[test]
fn charset_alias_sets_encoding_and_warns_once() {
    let mut config = ClientConfig {
        charset: Some("latin-1".to_string()),
        ..ClientConfig::default()
    };
    let deprecations = config.normalize();
    assert_eq!(deprecations, vec![Deprecation::Charset]);
    assert_eq!(config.encoding.as_deref(), Some("latin-1"));
    // the translation happened; nothing left to warn about
    assert!(config.normalize().is_empty());
}

#[test]
fn errors_alias_sets_encoding_errors() {
    let mut config = ClientConfig {
        errors: Some("ignore".to_string()),
        ..ClientConfig::default()
    };
    assert_eq!(config.normalize(), vec![Deprecation::Errors]);
    assert_eq!(config.encoding_errors.as_deref(), Some("ignore"));
}

#[test]
fn alias_conflict_resolves_to_new_name() {
    let mut config = ClientConfig {
        charset: Some("latin-1".to_string()),
        encoding: Some("ascii".to_string()),
        ..ClientConfig::default()
    };
    // reported, not silently merged; the explicit new-style value wins
    assert_eq!(config.normalize(), vec![Deprecation::Charset]);
    assert_eq!(config.encoding.as_deref(), Some("ascii"));
}

#[test]
fn legacy_charset_drives_decoding_end_to_end() {
    let host = unique_host("opt-charset");
    let client = MirageClient::new(ClientConfig {
        host: Some(host),
        port: Some(6379),
        decode_responses: true,
        charset: Some("latin-1".to_string()),
        ..ClientConfig::default()
    })
    .unwrap();

    // 0xe9 is 'é' in latin-1 and invalid utf-8; decoding proves the alias
    // actually landed on `encoding`
    client.set("k", [0x61u8, 0xe9]).unwrap();
    assert_eq!(client.get("k").unwrap(), Value::Str("aé".to_string()));
}

#[test]
fn credentials_accepted_but_ignored() {
    let host = unique_host("opt-creds");
    let client = MirageClient::new(ClientConfig {
        host: Some(host),
        port: Some(6379),
        username: Some("admin".to_string()),
        password: Some("secret".to_string()),
        ..ClientConfig::default()
    })
    .unwrap();
    // no AUTH emulation: construction succeeds and commands just work
    client.set("k", "v").unwrap();
    assert_eq!(client.get("k").unwrap(), bytes("v"));
}

#[test]
fn invalid_encoding_fails_construction() {
    match MirageClient::new(ClientConfig::new().with_encoding("utf-16")) {
        Err(MirageError::InvalidConfig(message)) => assert!(message.contains("utf-16")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn initial_connectivity_flag_applies() {
    let host = unique_host("opt-conn");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .disconnected(),
    )
    .unwrap();
    assert!(matches!(
        client.ping(),
        Err(MirageError::ConnectionRefused)
    ));
    client.server().set_connected(true);
    assert!(client.ping().is_ok());
}

#[test]
fn client_name_reaches_the_engine() {
    let host = unique_host("opt-name");
    let client = MirageClient::new(
        ClientConfig::new()
            .with_host(&host)
            .with_port(6379)
            .with_client_name("suite"),
    )
    .unwrap();
    assert_eq!(
        client.execute(&[b"CLIENT", b"GETNAME"]).unwrap(),
        bytes("suite")
    );
}
