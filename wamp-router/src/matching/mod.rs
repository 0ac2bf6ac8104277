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

//! URI resolution shared by the broker and the dealer.
//!
//! Every subscription or registration lives in exactly one of three indexes, chosen by its
//! match policy. Lookups try them in order: exact, then the longest registered prefix, then
//! the first wildcard pattern that matches. The wildcard scan walks an unordered map, so when
//! several patterns match the same URI which one wins is unspecified.

mod prefix_tree;
mod wildcard;

pub use prefix_tree::PrefixTree;
pub use wildcard::{wildcard_matches, URI_SEPARATOR};

use crate::messages::MatchPolicy;
use std::collections::HashMap;

/// Outcome of resolving a URI against a [`UriIndex`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub policy: MatchPolicy,
}

/// Exact table, prefix tree and wildcard list over one keyspace.
pub struct UriIndex<T> {
    entries: HashMap<String, (MatchPolicy, T)>,
    prefix: PrefixTree<T>,
    wildcard: HashMap<String, T>,
}

impl<T> Default for UriIndex<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            prefix: PrefixTree::new(),
            wildcard: HashMap::new(),
        }
    }
}

impl<T: Copy> UriIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry stored for this exact URI string, whatever its policy.
    pub fn get(&self, uri: &str) -> Option<(MatchPolicy, T)> {
        self.entries.get(uri).copied()
    }

    /// Stores `value` for `uri` under `policy`, replacing any previous entry for the string.
    pub fn insert(&mut self, uri: &str, policy: MatchPolicy, value: T) -> Option<(MatchPolicy, T)> {
        let previous = self.remove(uri);
        self.entries.insert(uri.to_string(), (policy, value));
        match policy {
            MatchPolicy::Exact => {}
            MatchPolicy::Prefix => {
                self.prefix.insert(uri, value);
            }
            MatchPolicy::Wildcard => {
                self.wildcard.insert(uri.to_string(), value);
            }
        }
        previous
    }

    /// Drops `uri` from every index.
    pub fn remove(&mut self, uri: &str) -> Option<(MatchPolicy, T)> {
        let (policy, value) = self.entries.remove(uri)?;
        match policy {
            MatchPolicy::Exact => {}
            MatchPolicy::Prefix => {
                self.prefix.remove(uri);
            }
            MatchPolicy::Wildcard => {
                self.wildcard.remove(uri);
            }
        }
        Some((policy, value))
    }

    /// Resolves `uri`, ignoring entries for which `is_live` is false.
    pub fn resolve(&self, uri: &str, is_live: impl Fn(T) -> bool) -> Option<Resolved<T>> {
        if let Some(&(policy, value)) = self.entries.get(uri) {
            if is_live(value) {
                return Some(Resolved { value, policy });
            }
        }

        if let Some(&value) = self.prefix.longest_prefix_where(uri, |value| is_live(*value)) {
            return Some(Resolved {
                value,
                policy: MatchPolicy::Prefix,
            });
        }

        self.wildcard
            .iter()
            .find(|(pattern, value)| is_live(**value) && wildcard_matches(pattern, uri))
            .map(|(_, &value)| Resolved {
                value,
                policy: MatchPolicy::Wildcard,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MatchPolicy, T)> + '_ {
        self.entries
            .iter()
            .map(|(uri, &(policy, value))| (uri.as_str(), policy, value))
    }
}
