//! Subscriber lifetime tests
//!
//! Dropping the last reference to a subscribed connection must remove it
//! from every subscriber set without an explicit unsubscribe, and must not
//! disturb the server or the remaining subscribers.

use std::time::Duration;

use crate::common::*;

#[test]
fn dropped_subscriber_disappears_from_channel() {
    let host = unique_host("decay-drop");
    let client = client_at(&host);

    let mut pubsub = client.pubsub().unwrap();
    pubsub.subscribe(&["news"]).unwrap();
    assert_eq!(client.server().subscriber_count("news"), 1);

    drop(pubsub);
    assert_eq!(client.server().subscriber_count("news"), 0);
    // publishing to the now-empty channel reaches nobody and panics nothing
    assert_eq!(client.publish("news", "x").unwrap(), 0);
}

#[test]
fn surviving_subscribers_unaffected_by_peer_drop() {
    let host = unique_host("decay-peer");
    let client = client_at(&host);

    let mut keeper = client.pubsub().unwrap();
    keeper.subscribe(&["news"]).unwrap();
    {
        let mut transient = client.pubsub().unwrap();
        transient.subscribe(&["news"]).unwrap();
        assert_eq!(client.server().subscriber_count("news"), 2);
    }
    assert_eq!(client.server().subscriber_count("news"), 1);

    assert_eq!(client.publish("news", "still-on").unwrap(), 1);
    let message = keeper.get_message(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(
        message,
        Value::Array(vec![bytes("message"), bytes("news"), bytes("still-on")])
    );
}

#[test]
fn explicit_close_retires_connection() {
    let host = unique_host("decay-close");
    let client = client_at(&host);

    let mut pubsub = client.pubsub().unwrap();
    pubsub.subscribe(&["a", "b"]).unwrap();
    pubsub.psubscribe(&["c.*"]).unwrap();
    pubsub.close();

    assert_eq!(client.server().subscriber_count("a"), 0);
    assert_eq!(client.server().subscriber_count("b"), 0);
    assert_eq!(client.publish("c.d", "x").unwrap(), 0);
}

#[test]
fn pattern_and_channel_subscribers_both_receive() {
    let host = unique_host("decay-both");
    let client = client_at(&host);

    let mut direct = client.pubsub().unwrap();
    direct.subscribe(&["news.sports"]).unwrap();
    let mut pattern = client.pubsub().unwrap();
    pattern.psubscribe(&["news.*"]).unwrap();

    assert_eq!(client.publish("news.sports", "goal").unwrap(), 2);

    let plain = direct.get_message(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(
        plain,
        Value::Array(vec![bytes("message"), bytes("news.sports"), bytes("goal")])
    );
    let matched = pattern.get_message(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(
        matched,
        Value::Array(vec![
            bytes("pmessage"),
            bytes("news.*"),
            bytes("news.sports"),
            bytes("goal"),
        ])
    );
}

#[test]
fn get_message_times_out_quietly() {
    let host = unique_host("decay-timeout");
    let client = client_at(&host);
    let mut pubsub = client.pubsub().unwrap();
    pubsub.subscribe(&["silent"]).unwrap();
    assert_eq!(pubsub.get_message(Duration::from_millis(30)).unwrap(), None);
}
