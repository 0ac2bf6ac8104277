/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Deterministic benchmark fixtures for the Criterion harness.

use crate::broker::{Broker, BrokerError};
use crate::dealer::{Dealer, DealerError};
use crate::matching::UriIndex;
use crate::messages::{
    Call, MatchPolicy, Message, Publish, Register, Subscribe, Yield, OPTION_ACKNOWLEDGE,
    OPTION_MATCH,
};
use crate::session_details::SessionDetails;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

const REALM: &str = "bench";
const PUBLISHER_ID: u64 = 1;
const CALLER_ID: u64 = 1;
const CALLEE_ID: u64 = 2;

fn session(id: u64) -> SessionDetails {
    SessionDetails::new(id, REALM, format!("bench-{id}"), "anonymous", false)
}

fn match_options(match_policy: MatchPolicy) -> crate::messages::Dict {
    let mut options = crate::messages::Dict::new();
    if match_policy != MatchPolicy::Exact {
        options.insert(OPTION_MATCH.to_string(), Value::from(match_policy.as_str()));
    }
    options
}

/// Fixed fixture for `broker_publish/*` benchmark IDs.
pub struct PublishFixture {
    broker: Broker,
    topic: String,
    request_ids: AtomicU64,
}

impl PublishFixture {
    /// One publisher and `subscribers` sessions on a single exact topic.
    pub fn new(subscribers: usize) -> Result<Self, BrokerError> {
        let broker = Broker::new();
        let topic = "io.xconn.bench.topic".to_string();
        broker.add_session(session(PUBLISHER_ID))?;

        for offset in 0..subscribers.max(1) as u64 {
            let subscriber_id = PUBLISHER_ID + 1 + offset;
            broker.add_session(session(subscriber_id))?;
            broker.receive_message(
                subscriber_id,
                Message::Subscribe(Subscribe {
                    request_id: 1,
                    topic: topic.clone(),
                    ..Default::default()
                }),
            )?;
        }

        Ok(Self {
            broker,
            topic,
            request_ids: AtomicU64::new(1),
        })
    }

    /// Publishes once with acknowledgement and returns the recipient count.
    pub fn publish_once(&self) -> Result<usize, BrokerError> {
        let mut options = crate::messages::Dict::new();
        options.insert(OPTION_ACKNOWLEDGE.to_string(), Value::Bool(true));
        let publication = self.broker.receive_publish(
            PUBLISHER_ID,
            Publish {
                request_id: self.request_ids.fetch_add(1, Ordering::Relaxed),
                options,
                topic: self.topic.clone(),
                args: vec![Value::from("arg1")],
                ..Default::default()
            },
        )?;
        Ok(publication.recipients.len())
    }
}

/// Fixed fixture for `dealer_call/*` benchmark IDs.
pub struct CallFixture {
    dealer: Dealer,
    procedure: String,
    request_ids: AtomicU64,
}

impl CallFixture {
    /// `rows` registrations of the given policy, with calls aimed at the last one.
    pub fn new(match_policy: MatchPolicy, rows: usize) -> Result<Self, DealerError> {
        let dealer = Dealer::new();
        dealer.add_session(session(CALLER_ID))?;
        dealer.add_session(session(CALLEE_ID))?;

        let rows = rows.max(1);
        for index in 0..rows {
            let procedure = match match_policy {
                MatchPolicy::Exact => format!("io.xconn.bench.proc{index}"),
                MatchPolicy::Prefix => format!("io.xconn.bench{index}."),
                MatchPolicy::Wildcard => format!("io.xconn{index}..proc"),
            };
            dealer.receive_message(
                CALLEE_ID,
                Message::Register(Register {
                    request_id: index as u64 + 1,
                    options: match_options(match_policy),
                    procedure,
                }),
            )?;
        }

        let last = rows - 1;
        let procedure = match match_policy {
            MatchPolicy::Exact => format!("io.xconn.bench.proc{last}"),
            MatchPolicy::Prefix => format!("io.xconn.bench{last}.echo"),
            MatchPolicy::Wildcard => format!("io.xconn{last}.bench.proc"),
        };

        Ok(Self {
            dealer,
            procedure,
            request_ids: AtomicU64::new(1),
        })
    }

    /// Runs CALL then YIELD and reports whether the caller got its result.
    pub fn call_round_trip(&self) -> Result<bool, DealerError> {
        let request_id = self.request_ids.fetch_add(1, Ordering::Relaxed);
        let invocation = self.dealer.receive_message(
            CALLER_ID,
            Message::Call(Call {
                request_id,
                procedure: self.procedure.clone(),
                args: vec![Value::from(request_id)],
                ..Default::default()
            }),
        )?;
        let Some(Message::Invocation(invocation)) = invocation.into_iter().next().map(|m| m.message)
        else {
            return Ok(false);
        };

        let result = self.dealer.receive_message(
            CALLEE_ID,
            Message::Yield(Yield {
                request_id: invocation.request_id,
                args: invocation.args,
                ..Default::default()
            }),
        )?;
        Ok(matches!(
            result.first().map(|routed| &routed.message),
            Some(Message::Result(call_result)) if call_result.request_id == request_id
        ))
    }
}

/// Fixed fixture for `uri_index/*` benchmark IDs.
pub struct UriIndexFixture {
    index: UriIndex<u64>,
    lookups: Vec<String>,
}

impl UriIndexFixture {
    /// `rows` entries per policy plus a lookup set hitting each index.
    pub fn new(rows: usize) -> Self {
        let mut index = UriIndex::new();
        let mut lookups = Vec::new();
        for row in 0..rows.max(1) as u64 {
            index.insert(&format!("com.exact.topic{row}"), MatchPolicy::Exact, row);
            index.insert(&format!("com.prefix{row}."), MatchPolicy::Prefix, row);
            index.insert(&format!("com.wild{row}..end"), MatchPolicy::Wildcard, row);
            lookups.push(format!("com.exact.topic{row}"));
            lookups.push(format!("com.prefix{row}.deep.path"));
            lookups.push(format!("com.wild{row}.any.end"));
        }
        Self { index, lookups }
    }

    /// Resolves every lookup and returns how many matched.
    pub fn resolve_count(&self) -> usize {
        self.lookups
            .iter()
            .filter(|uri| self.index.resolve(uri, |_| true).is_some())
            .count()
    }
}
