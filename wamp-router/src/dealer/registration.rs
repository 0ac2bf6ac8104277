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

use crate::messages::{InvocationPolicy, MatchPolicy};
use chrono::{SecondsFormat, Utc};
use rand::Rng;

/// Snapshot of a procedure registration and the sessions serving it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub id: u64,
    pub procedure: String,
    pub match_policy: MatchPolicy,
    pub invocation_policy: InvocationPolicy,
    /// Registrants in the order they joined.
    pub callees: Vec<u64>,
    /// Creation time, ISO-8601 in UTC.
    pub created: String,
    next_callee: usize,
}

impl Registration {
    pub(crate) fn new(
        id: u64,
        procedure: &str,
        match_policy: MatchPolicy,
        invocation_policy: InvocationPolicy,
        callee: u64,
    ) -> Self {
        Self {
            id,
            procedure: procedure.to_string(),
            match_policy,
            invocation_policy,
            callees: vec![callee],
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            next_callee: 0,
        }
    }

    pub fn has_callee(&self, session_id: u64) -> bool {
        self.callees.contains(&session_id)
    }

    /// Whether another session asking for `requested` may share this registration.
    pub(crate) fn admits(&self, requested: InvocationPolicy) -> bool {
        self.invocation_policy.is_shared() && self.invocation_policy == requested
    }

    pub(crate) fn add_callee(&mut self, session_id: u64) {
        self.callees.push(session_id);
    }

    /// Removes a callee and pulls the round-robin cursor back into range.
    pub(crate) fn remove_callee(&mut self, session_id: u64) -> bool {
        let Some(position) = self.callees.iter().position(|&id| id == session_id) else {
            return false;
        };
        self.callees.remove(position);
        if position < self.next_callee {
            self.next_callee -= 1;
        }
        if self.next_callee >= self.callees.len() {
            self.next_callee = 0;
        }
        true
    }

    /// Index of the callee that should serve the next call. Does not move the cursor.
    pub(crate) fn pick_callee(&self) -> Option<usize> {
        let count = self.callees.len();
        match count {
            0 => None,
            1 => Some(0),
            _ => Some(match self.invocation_policy {
                InvocationPolicy::First | InvocationPolicy::Single => 0,
                InvocationPolicy::Last => count - 1,
                InvocationPolicy::RoundRobin => {
                    if self.next_callee >= count {
                        0
                    } else {
                        self.next_callee
                    }
                }
                InvocationPolicy::Random => rand::thread_rng().gen_range(0..count),
            }),
        }
    }

    /// Records that the callee at `index` was handed a call.
    pub(crate) fn commit_pick(&mut self, index: usize) {
        if self.invocation_policy == InvocationPolicy::RoundRobin {
            self.next_callee = index + 1;
        }
    }
}
