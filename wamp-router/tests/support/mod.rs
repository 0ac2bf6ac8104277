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

use integration_test_utils::session;
use wamp_router::messages::{Invocation, Message, MessageWithRecipient};
use wamp_router::{Broker, Dealer};

#[allow(dead_code)]
pub(crate) fn broker_with_sessions(ids: &[u64]) -> Broker {
    let broker = Broker::new();
    for &id in ids {
        broker
            .add_session(session(id))
            .expect("fresh session should attach to broker");
    }
    broker
}

#[allow(dead_code)]
pub(crate) fn dealer_with_sessions(ids: &[u64]) -> Dealer {
    let dealer = Dealer::new();
    for &id in ids {
        dealer
            .add_session(session(id))
            .expect("fresh session should attach to dealer");
    }
    dealer
}

/// Sends `message` and expects exactly one outbound message.
#[allow(dead_code)]
pub(crate) fn single(dealer: &Dealer, session_id: u64, message: Message) -> MessageWithRecipient {
    let mut outbound = dealer
        .receive_message(session_id, message)
        .expect("dealer should accept message");
    assert_eq!(outbound.len(), 1, "unexpected outbound batch: {outbound:?}");
    outbound.remove(0)
}

/// Registers `procedure` for `session_id` and returns the registration ID.
#[allow(dead_code)]
pub(crate) fn register_ok(
    dealer: &Dealer,
    session_id: u64,
    request_id: u64,
    procedure: &str,
    options: serde_json::Value,
) -> u64 {
    let reply = single(
        dealer,
        session_id,
        integration_test_utils::register(request_id, procedure, options),
    );
    match reply.message {
        Message::Registered(registered) => {
            assert_eq!(registered.request_id, request_id);
            registered.registration_id
        }
        other => panic!("expected REGISTERED, got {other:?}"),
    }
}

#[allow(dead_code)]
pub(crate) fn expect_invocation(routed: MessageWithRecipient) -> (u64, Invocation) {
    match routed.message {
        Message::Invocation(invocation) => (routed.recipient, invocation),
        other => panic!("expected INVOCATION, got {other:?}"),
    }
}

/// Issues a plain `CALL` and returns the callee it landed on plus the invocation.
#[allow(dead_code)]
pub(crate) fn call_ok(
    dealer: &Dealer,
    caller: u64,
    request_id: u64,
    procedure: &str,
) -> (u64, Invocation) {
    expect_invocation(single(
        dealer,
        caller,
        integration_test_utils::call(request_id, procedure),
    ))
}
