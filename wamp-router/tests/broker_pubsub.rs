/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use integration_test_utils::{publish, subscribe, unsubscribe};
use serde_json::json;
use support::broker_with_sessions;
use wamp_router::messages::{Message, MatchPolicy};
use wamp_router::{Broker, BrokerError};

fn subscribed(broker: &Broker, session_id: u64, message: Message) -> u64 {
    match broker
        .receive_message(session_id, message)
        .expect("subscribe should succeed")
        .message
    {
        Message::Subscribed(subscribed) => subscribed.subscription_id,
        other => panic!("expected SUBSCRIBED, got {other:?}"),
    }
}

#[test]
fn publication_fans_out_to_every_subscriber_including_publisher() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1, 2, 3]);

    let first = subscribed(&broker, 3, subscribe(1, "com.example.topic", json!({})));
    let second = subscribed(&broker, 1, subscribe(1, "com.example.topic", json!({})));
    let third = subscribed(&broker, 2, subscribe(1, "com.example.topic", json!({})));
    assert_eq!(first, second);
    assert_eq!(second, third);

    let publication = broker
        .receive_publish(1, publish(10, "com.example.topic", json!({})))
        .expect("publish should succeed");

    assert_eq!(publication.recipients, vec![1, 2, 3]);
    let event = publication.event.expect("event should be built");
    assert_eq!(event.subscription_id, first);
    assert!(event.details.is_empty());
    assert_eq!(event.args, vec![json!("payload")]);
    assert!(publication.ack.is_none());
}

#[test]
fn publish_without_subscribers_only_acknowledges() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1]);

    let publication = broker
        .receive_publish(1, publish(42, "com.example.empty", json!({"acknowledge": true})))
        .expect("publish should succeed");

    assert!(publication.event.is_none());
    assert!(publication.recipients.is_empty());
    let ack = publication.ack.expect("acknowledge requested");
    assert_eq!(ack.recipient, 1);
    match ack.message {
        Message::Published(published) => {
            assert_eq!(published.request_id, 42);
            assert!(published.publication_id >= 1);
        }
        other => panic!("expected PUBLISHED, got {other:?}"),
    }
}

#[test]
fn exact_beats_prefix_beats_wildcard() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1, 2, 3, 4]);

    let exact = subscribed(&broker, 1, subscribe(1, "a.b.c", json!({})));
    let prefix = subscribed(&broker, 2, subscribe(1, "a.b", json!({"match": "prefix"})));
    let wildcard = subscribed(&broker, 3, subscribe(1, "a..c", json!({"match": "wildcard"})));

    let routed = |topic: &str| {
        broker
            .receive_publish(4, publish(1, topic, json!({})))
            .expect("publish should succeed")
            .event
            .map(|event| (event.subscription_id, event.details.get("topic").cloned()))
    };

    assert_eq!(routed("a.b.c"), Some((exact, None)));
    assert_eq!(routed("a.b.d"), Some((prefix, Some(json!("a.b.d")))));
    assert_eq!(routed("a.x.c"), Some((wildcard, Some(json!("a.x.c")))));
    assert_eq!(routed("z.x.c"), None);

    let matched = broker
        .match_subscription("a.b.zzz")
        .expect("prefix should match");
    assert_eq!(matched.match_policy, MatchPolicy::Prefix);
}

#[test]
fn exact_subscriber_alone_receives_exact_topic() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1, 2, 3, 4]);

    let exact = subscribed(&broker, 1, subscribe(1, "a.b", json!({})));
    subscribed(&broker, 2, subscribe(1, "a.", json!({"match": "prefix"})));
    subscribed(&broker, 3, subscribe(1, "a.*.c", json!({"match": "wildcard"})));

    let publication = broker
        .receive_publish(4, publish(1, "a.b", json!({})))
        .expect("publish should succeed");
    assert_eq!(publication.recipients, vec![1]);
    assert_eq!(
        publication.event.map(|event| event.subscription_id),
        Some(exact)
    );
}

#[test]
fn longest_prefix_wins() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1, 2, 3]);

    let short = subscribed(&broker, 1, subscribe(1, "com.", json!({"match": "prefix"})));
    let long = subscribed(&broker, 2, subscribe(1, "com.example.", json!({"match": "prefix"})));

    let route = |topic: &str| {
        broker
            .receive_publish(3, publish(1, topic, json!({})))
            .expect("publish should succeed")
            .event
            .map(|event| event.subscription_id)
    };
    assert_eq!(route("com.example.a"), Some(long));
    assert_eq!(route("com.other.a"), Some(short));
}

#[test]
fn removing_session_cleans_up_its_subscriptions() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1, 2]);

    subscribed(&broker, 1, subscribe(1, "com.example.solo", json!({})));
    let shared = subscribed(&broker, 1, subscribe(2, "com.example.shared", json!({})));
    subscribed(&broker, 2, subscribe(1, "com.example.shared", json!({})));

    broker.remove_session(1).expect("session should detach");

    assert!(!broker.has_session(1));
    assert!(!broker.has_subscription("com.example.solo"));
    assert!(broker.has_subscription("com.example.shared"));
    let remaining = broker
        .match_subscription("com.example.shared")
        .expect("shared subscription survives");
    assert_eq!(remaining.id, shared);
    assert_eq!(remaining.subscribers.len(), 1);
    assert!(remaining.subscribers.contains(&2));

    assert_eq!(
        broker.remove_session(1),
        Err(BrokerError::UnknownSession(1))
    );
}

#[test]
fn unsubscribing_last_subscriber_deletes_subscription() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1, 2]);

    let id = subscribed(&broker, 1, subscribe(1, "com.example.topic", json!({})));
    let reply = broker
        .receive_message(1, unsubscribe(2, id))
        .expect("unsubscribe should succeed");
    assert!(matches!(reply.message, Message::Unsubscribed(ref u) if u.request_id == 2));
    assert!(!broker.has_subscription("com.example.topic"));
    assert!(broker.subscriptions().is_empty());

    assert_eq!(
        broker.receive_message(1, unsubscribe(3, id)),
        Err(BrokerError::UnknownSubscription {
            session_id: 1,
            subscription_id: id,
        })
    );

    let publication = broker
        .receive_publish(2, publish(1, "com.example.topic", json!({})))
        .expect("publish should succeed");
    assert!(publication.event.is_none());
}

#[test]
fn subscription_ids_are_unique_across_topics() {
    integration_test_utils::init_logging();
    let broker = broker_with_sessions(&[1]);

    let mut ids: Vec<u64> = (0..50)
        .map(|n| subscribed(&broker, 1, subscribe(n, &format!("com.example.t{n}"), json!({}))))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}
