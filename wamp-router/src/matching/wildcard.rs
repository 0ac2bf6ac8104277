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

/// Component separator in WAMP URIs.
pub const URI_SEPARATOR: char = '.';

/// Checks `uri` against a wildcard `pattern`.
///
/// Components are compared one by one. An empty pattern component, or `*`, matches any single
/// component; both sides must have the same number of components.
pub fn wildcard_matches(pattern: &str, uri: &str) -> bool {
    let mut pattern_components = pattern.split(URI_SEPARATOR);
    let mut uri_components = uri.split(URI_SEPARATOR);

    loop {
        match (pattern_components.next(), uri_components.next()) {
            (None, None) => return true,
            (Some(expected), Some(actual)) => {
                if !(expected.is_empty() || expected == "*" || expected == actual) {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::wildcard_matches;

    #[test]
    fn wildcard_component_matches_exactly_one_component() {
        assert!(wildcard_matches("a.*.c", "a.b.c"));
        assert!(wildcard_matches("a..c", "a.xyz.c"));
        assert!(!wildcard_matches("a.*.c", "a.b.d"));
        assert!(!wildcard_matches("a.*.c", "a.b.x.c"));
        assert!(!wildcard_matches("a.*", "a"));
    }

    #[test]
    fn literal_patterns_need_full_equality() {
        assert!(wildcard_matches("com.example", "com.example"));
        assert!(!wildcard_matches("com.example", "com.example.more"));
    }
}
