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

//! Identifier allocation.
//!
//! WAMP identifiers are integers in `[1, 2^53]` so that they survive a round trip through an
//! IEEE-754 double. Two scopes exist: global identifiers drawn at random, and router-scope
//! identifiers counted up per router instance.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

/// Largest identifier value, `2^53`.
pub const MAX_ID: u64 = 1 << 53;

/// Draws a random identifier from the global scope.
pub fn generate_global_id() -> u64 {
    rand::thread_rng().gen_range(1..=MAX_ID)
}

/// Monotonic identifier source for one router instance.
///
/// Starts at 1 and wraps back to 1 after `MAX_ID`. Zero is never produced.
#[derive(Debug, Default)]
pub struct RouterScopeIdGenerator {
    last: AtomicU64,
}

impl RouterScopeIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> u64 {
        let previous = self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(Self::successor(last))
            })
            .unwrap_or_else(|last| last);
        Self::successor(previous)
    }

    fn successor(last: u64) -> u64 {
        if last >= MAX_ID {
            1
        } else {
            last + 1
        }
    }

    #[cfg(test)]
    fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }
}
