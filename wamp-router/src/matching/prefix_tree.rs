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

//! Compressed radix tree answering longest-prefix queries over URI strings.

use std::collections::BTreeMap;

/// Radix tree keyed by byte strings, with edges compressed so that every inner node either
/// holds a value or branches.
pub struct PrefixTree<V> {
    root: Node<V>,
    len: usize,
}

struct Node<V> {
    value: Option<V>,
    children: BTreeMap<u8, Edge<V>>,
}

struct Edge<V> {
    label: Vec<u8>,
    node: Node<V>,
}

impl<V> Default for PrefixTree<V> {
    fn default() -> Self {
        Self {
            root: Node::empty(),
            len: 0,
        }
    }
}

impl<V> PrefixTree<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        let previous = self.root.insert(key.as_bytes(), value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Removes `key` and folds any edge left with a single child back into its parent.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let removed = self.root.remove(key.as_bytes());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let mut node = &self.root;
        let mut rest = key.as_bytes();
        while let Some(first) = rest.first() {
            let edge = node.children.get(first)?;
            rest = rest.strip_prefix(edge.label.as_slice())?;
            node = &edge.node;
        }
        node.value.as_ref()
    }

    /// Value stored under the longest key that is a prefix of `key`.
    pub fn longest_prefix(&self, key: &str) -> Option<&V> {
        self.longest_prefix_where(key, |_| true)
    }

    /// Like [`PrefixTree::longest_prefix`] but skips stored values rejected by `accept`.
    pub fn longest_prefix_where(&self, key: &str, accept: impl Fn(&V) -> bool) -> Option<&V> {
        let mut node = &self.root;
        let mut rest = key.as_bytes();
        let mut best = node.value.as_ref().filter(|value| accept(*value));

        while let Some(first) = rest.first() {
            let Some(edge) = node.children.get(first) else {
                break;
            };
            let Some(remaining) = rest.strip_prefix(edge.label.as_slice()) else {
                break;
            };
            rest = remaining;
            node = &edge.node;
            if let Some(value) = node.value.as_ref().filter(|value| accept(*value)) {
                best = Some(value);
            }
        }

        best
    }
}

impl<V> Node<V> {
    fn empty() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }

    fn leaf(value: V) -> Self {
        Self {
            value: Some(value),
            children: BTreeMap::new(),
        }
    }

    fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let Some(&first) = key.first() else {
            return self.value.replace(value);
        };

        let Some(edge) = self.children.get_mut(&first) else {
            self.children.insert(
                first,
                Edge {
                    label: key.to_vec(),
                    node: Node::leaf(value),
                },
            );
            return None;
        };

        let common = common_prefix_len(&edge.label, key);
        if common < edge.label.len() {
            let suffix = edge.label.split_off(common);
            let lower = std::mem::replace(&mut edge.node, Node::empty());
            edge.node.children.insert(
                suffix[0],
                Edge {
                    label: suffix,
                    node: lower,
                },
            );
        }
        edge.node.insert(&key[common..], value)
    }

    fn remove(&mut self, key: &[u8]) -> Option<V> {
        let Some(&first) = key.first() else {
            return self.value.take();
        };

        let edge = self.children.get_mut(&first)?;
        let rest = key.strip_prefix(edge.label.as_slice())?;
        let removed = edge.node.remove(rest)?;

        if edge.node.value.is_none() {
            match edge.node.children.len() {
                0 => {
                    self.children.remove(&first);
                }
                1 => {
                    if let Some((_, lower)) = edge.node.children.pop_first() {
                        edge.label.extend_from_slice(&lower.label);
                        edge.node = lower.node;
                    }
                }
                _ => {}
            }
        }

        Some(removed)
    }
}

fn common_prefix_len(left: &[u8], right: &[u8]) -> usize {
    left.iter()
        .zip(right.iter())
        .take_while(|(l, r)| l == r)
        .count()
}
