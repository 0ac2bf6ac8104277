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

use integration_test_utils::{
    call, invocation_error, register, static_session, unregister, yield_result,
};
use serde_json::json;
use support::{call_ok, dealer_with_sessions, expect_invocation, register_ok, single};
use wamp_router::messages::{
    uri, BinaryPayload, Call, InvocationPolicy, MatchPolicy, Message, MessageType, SerializerId,
    Yield,
};
use wamp_router::DealerError;

#[test]
fn register_call_yield_round_trip() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2]);

    let registration_id = register_ok(&dealer, 1, 1, "com.example.add", json!({}));
    assert!(dealer.has_procedure("com.example.add"));

    let (callee, invocation) = call_ok(&dealer, 2, 7, "com.example.add");
    assert_eq!(callee, 1);
    assert_eq!(invocation.registration_id, registration_id);
    assert_eq!(invocation.args, vec![json!(7)]);
    assert!(invocation.details.is_empty());

    let reply = single(&dealer, 1, yield_result(invocation.request_id));
    assert_eq!(reply.recipient, 2);
    match reply.message {
        Message::Result(result) => {
            assert_eq!(result.request_id, 7);
            assert_eq!(result.args, vec![json!("done")]);
            assert!(result.details.is_empty());
        }
        other => panic!("expected RESULT, got {other:?}"),
    }

    // the invocation is settled; a second YIELD has nothing to answer
    assert_eq!(
        dealer.receive_message(1, yield_result(invocation.request_id)),
        Err(DealerError::NoPendingCall(invocation.request_id))
    );
}

#[test]
fn call_to_unknown_procedure_returns_no_such_procedure() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1]);

    let reply = single(&dealer, 1, call(3, "com.example.missing"));
    assert_eq!(reply.recipient, 1);
    match reply.message {
        Message::Error(error) => {
            assert_eq!(error.request_type, MessageType::Call);
            assert_eq!(error.request_id, 3);
            assert_eq!(error.uri, uri::NO_SUCH_PROCEDURE);
        }
        other => panic!("expected ERROR, got {other:?}"),
    }
}

#[test]
fn single_registration_refuses_second_registrant() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2]);

    register_ok(&dealer, 1, 1, "com.example.only", json!({}));
    let reply = single(&dealer, 2, register(5, "com.example.only", json!({})));
    match reply.message {
        Message::Error(error) => {
            assert_eq!(error.request_type, MessageType::Register);
            assert_eq!(error.request_id, 5);
            assert_eq!(error.uri, uri::PROCEDURE_ALREADY_EXISTS);
        }
        other => panic!("expected ERROR, got {other:?}"),
    }

    let registration = dealer
        .match_registration("com.example.only")
        .expect("registration should exist");
    assert_eq!(registration.callees, vec![1]);
}

#[test]
fn shared_registration_requires_identical_policy() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2, 3]);

    let policy = json!({"invoke": "first"});
    let id = register_ok(&dealer, 1, 1, "com.example.shared", policy.clone());
    assert_eq!(
        register_ok(&dealer, 2, 1, "com.example.shared", policy),
        id
    );

    let already_exists = |message: &Message| {
        matches!(message, Message::Error(error) if error.uri == uri::PROCEDURE_ALREADY_EXISTS)
    };
    let mismatched = single(
        &dealer,
        3,
        register(1, "com.example.shared", json!({"invoke": "last"})),
    );
    assert!(already_exists(&mismatched.message));

    let again = single(
        &dealer,
        1,
        register(2, "com.example.shared", json!({"invoke": "first"})),
    );
    assert!(already_exists(&again.message));

    let registration = dealer
        .match_registration("com.example.shared")
        .expect("registration should exist");
    assert_eq!(registration.invocation_policy, InvocationPolicy::First);
    assert_eq!(registration.callees, vec![1, 2]);
}

#[test]
fn invocation_policies_pick_expected_callee() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2, 9]);

    for (request_id, policy) in ["first", "last", "roundrobin"].into_iter().enumerate() {
        let procedure = format!("com.example.{policy}");
        register_ok(&dealer, 1, request_id as u64, &procedure, json!({"invoke": policy}));
        register_ok(&dealer, 2, request_id as u64, &procedure, json!({"invoke": policy}));
    }

    let callees = |procedure: &str| -> Vec<u64> {
        (0..4)
            .map(|request_id| call_ok(&dealer, 9, request_id, procedure).0)
            .collect()
    };
    assert_eq!(callees("com.example.first"), vec![1, 1, 1, 1]);
    assert_eq!(callees("com.example.last"), vec![2, 2, 2, 2]);
    assert_eq!(callees("com.example.roundrobin"), vec![1, 2, 1, 2]);
}

#[test]
fn random_policy_only_picks_registrants() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2, 3, 9]);
    for callee in 1..=3 {
        let policy = json!({"invoke": "random"});
        register_ok(&dealer, callee, 1, "com.example.random", policy);
    }

    for request_id in 0..30 {
        let (callee, _) = call_ok(&dealer, 9, request_id, "com.example.random");
        assert!((1..=3).contains(&callee));
    }
}

#[test]
fn matching_precedence_for_calls() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2, 3, 9]);

    let exact = register_ok(&dealer, 1, 1, "a.b", json!({}));
    let prefix = register_ok(&dealer, 2, 1, "a.", json!({"match": "prefix"}));
    let wildcard = register_ok(&dealer, 3, 1, "x.*.c", json!({"match": "wildcard"}));

    let (callee, invocation) = call_ok(&dealer, 9, 1, "a.b");
    assert_eq!((callee, invocation.registration_id), (1, exact));
    assert!(invocation.details.get("procedure").is_none());

    let (callee, invocation) = call_ok(&dealer, 9, 2, "a.b.c");
    assert_eq!((callee, invocation.registration_id), (2, prefix));
    assert_eq!(invocation.details.get("procedure"), Some(&json!("a.b.c")));

    let (callee, invocation) = call_ok(&dealer, 9, 3, "x.y.c");
    assert_eq!((callee, invocation.registration_id), (3, wildcard));
    assert_eq!(invocation.details.get("procedure"), Some(&json!("x.y.c")));

    assert_eq!(dealer.exact_registrations().len(), 1);
    assert_eq!(dealer.prefix_registrations().len(), 1);
    assert_eq!(dealer.wildcard_registrations().len(), 1);
    let by_procedure = dealer.registrations_by_procedure();
    assert_eq!(by_procedure["x.*.c"].match_policy, MatchPolicy::Wildcard);
}

#[test]
fn removing_callee_session_unregisters_procedures() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2]);

    register_ok(&dealer, 1, 1, "com.example.a", json!({}));
    register_ok(&dealer, 1, 2, "com.example.b", json!({"invoke": "roundrobin"}));
    register_ok(&dealer, 2, 1, "com.example.b", json!({"invoke": "roundrobin"}));

    dealer.remove_session(1).expect("session should detach");

    assert!(!dealer.has_session(1));
    assert!(!dealer.has_procedure("com.example.a"));
    assert!(dealer.has_procedure("com.example.b"));
    let remaining = dealer
        .match_registration("com.example.b")
        .expect("shared registration survives");
    assert_eq!(remaining.callees, vec![2]);
    assert_eq!(
        dealer.remove_session(1),
        Err(DealerError::UnknownSession(1))
    );
}

#[test]
fn unregister_releases_procedure_for_new_registrant() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2]);

    let id = register_ok(&dealer, 1, 1, "com.example.swap", json!({}));
    let reply = single(&dealer, 1, unregister(2, id));
    assert!(matches!(reply.message, Message::Unregistered(ref u) if u.request_id == 2));
    assert!(!dealer.has_procedure("com.example.swap"));

    assert_eq!(
        dealer.receive_message(1, unregister(3, id)),
        Err(DealerError::UnknownRegistration {
            session_id: 1,
            registration_id: id,
        })
    );

    register_ok(&dealer, 2, 1, "com.example.swap", json!({}));
    assert_eq!(call_ok(&dealer, 1, 1, "com.example.swap").0, 2);
}

#[test]
fn invocation_error_is_relayed_to_caller() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2]);

    register_ok(&dealer, 1, 1, "com.example.fail", json!({}));
    let (_, invocation) = call_ok(&dealer, 2, 11, "com.example.fail");

    // only the callee that received the invocation may answer it
    assert_eq!(
        dealer.receive_message(
            2,
            invocation_error(invocation.request_id, "com.example.oops")
        ),
        Err(DealerError::NoPendingInvocation(invocation.request_id))
    );

    let reply = single(
        &dealer,
        1,
        invocation_error(invocation.request_id, "com.example.oops"),
    );
    assert_eq!(reply.recipient, 2);
    match reply.message {
        Message::Error(error) => {
            assert_eq!(error.request_type, MessageType::Call);
            assert_eq!(error.request_id, 11);
            assert_eq!(error.uri, "com.example.oops");
        }
        other => panic!("expected ERROR, got {other:?}"),
    }
}

#[test]
fn binary_payload_passes_through_to_static_serializers_only() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[2]);
    dealer
        .add_session(static_session(1))
        .expect("static session should attach");

    register_ok(&dealer, 1, 1, "com.example.bytes", json!({}));
    let payload = BinaryPayload {
        serializer: SerializerId::MsgPack,
        data: vec![0x92, 0x01, 0x02],
    };

    let routed = single(
        &dealer,
        2,
        Message::Call(Call {
            request_id: 4,
            procedure: "com.example.bytes".to_string(),
            args: vec![json!("fallback")],
            payload: Some(payload.clone()),
            ..Default::default()
        }),
    );
    let (_, invocation) = expect_invocation(routed);
    assert_eq!(invocation.payload, Some(payload.clone()));
    assert!(invocation.args.is_empty());

    // caller 2 cannot take raw bytes, so the decoded arguments are forwarded
    let reply = single(
        &dealer,
        1,
        Message::Yield(Yield {
            request_id: invocation.request_id,
            args: vec![json!(3)],
            payload: Some(payload),
            ..Default::default()
        }),
    );
    match reply.message {
        Message::Result(result) => {
            assert!(result.payload.is_none());
            assert_eq!(result.args, vec![json!(3)]);
        }
        other => panic!("expected RESULT, got {other:?}"),
    }
}

#[test]
fn caller_disclosure_adds_identity_details() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1, 2]);
    dealer.auto_disclose_caller(true);

    register_ok(&dealer, 1, 1, "com.example.who", json!({}));
    let (_, invocation) = call_ok(&dealer, 2, 1, "com.example.who");

    assert_eq!(invocation.details.get("caller"), Some(&json!(2)));
    assert_eq!(
        invocation.details.get("caller_authid"),
        Some(&json!("authid-2"))
    );
    assert_eq!(
        invocation.details.get("caller_authrole"),
        Some(&json!("user"))
    );
    assert_eq!(
        invocation.details.get("procedure"),
        Some(&json!("com.example.who"))
    );
}

#[test]
fn operations_from_unknown_sessions_fail() {
    integration_test_utils::init_logging();
    let dealer = dealer_with_sessions(&[1]);

    assert_eq!(
        dealer.receive_message(5, register(1, "com.example.x", json!({}))),
        Err(DealerError::UnknownSession(5))
    );
    assert_eq!(
        dealer.receive_message(5, call(1, "com.example.x")),
        Err(DealerError::UnknownSession(5))
    );
    assert_eq!(
        dealer.add_session(integration_test_utils::session(1)),
        Err(DealerError::DuplicateSession(1))
    );
    assert!(!dealer.has_procedure("com.example.x"));
}
