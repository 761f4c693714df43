//! From-URL construction tests

use crate::common::*;

#[test]
fn url_clients_share_by_endpoint() {
    let host = unique_host("url-share");
    let a = MirageClient::from_url(&format!("redis://{host}:6379/0")).unwrap();
    let b = MirageClient::from_url(&format!("redis://{host}:6379/0")).unwrap();
    a.set("k", "v").unwrap();
    assert_eq!(b.get("k").unwrap(), bytes("v"));
}

#[test]
fn credentials_stripped_endpoint_preserved() {
    let host = unique_host("url-creds");
    let with_creds =
        MirageClient::from_url(&format!("redis://user:secret@{host}:7000/2")).unwrap();
    let without = MirageClient::from_url(&format!("redis://{host}:7000/2")).unwrap();

    // identical identity: the credentials were stripped, everything else kept
    assert_eq!(with_creds.server().key(), without.server().key());
    with_creds.set("k", "v").unwrap();
    assert_eq!(without.get("k").unwrap(), bytes("v"));
}

#[test]
fn url_database_index_is_honored() {
    let host = unique_host("url-db");
    let db2 = MirageClient::from_url(&format!("redis://{host}:6379/2")).unwrap();
    let db0 = MirageClient::from_url(&format!("redis://{host}:6379")).unwrap();
    db2.set("k", "two").unwrap();
    assert_eq!(db0.get("k").unwrap(), Value::Nil);
    assert_eq!(db2.get("k").unwrap(), bytes("two"));
}

#[test]
fn url_query_options_apply() {
    let host = unique_host("url-opts");
    let client = MirageClient::from_url(&format!(
        "redis://{host}:6379?decode_responses=true&client_name=via-url"
    ))
    .unwrap();
    client.set("k", "v").unwrap();
    assert_eq!(client.get("k").unwrap(), Value::Str("v".to_string()));
    assert_eq!(
        client.execute(&[b"CLIENT", b"GETNAME"]).unwrap(),
        Value::Str("via-url".to_string())
    );
}

#[test]
fn unix_urls_resolve_by_path() {
    let path = format!("/run/{}.sock", unique_host("url-unix"));
    let a = MirageClient::from_url(&format!("unix://{path}")).unwrap();
    let b = MirageClient::from_url(&format!("unix://{path}")).unwrap();
    a.set("k", "v").unwrap();
    assert_eq!(b.get("k").unwrap(), bytes("v"));
    assert!(a.server().key().starts_with(&path));
}

#[test]
fn malformed_urls_are_rejected() {
    init_tracing();
    assert!(MirageClient::from_url("memcached://h").is_err());
    assert!(MirageClient::from_url("redis://h:badport").is_err());
    assert!(MirageClient::from_url("redis://h:1?bogus=1").is_err());
}
