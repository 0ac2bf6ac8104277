/********************************************************************************
 * Copyright (c) 2025 Contributors to the Eclipse Foundation
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

//! Router settings loaded from JSON5.

use crate::observability::events;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::{debug, warn};

const COMPONENT: &str = "config";

/// Capacity of the registration meta-event queue when none is configured.
pub const DEFAULT_META_EVENT_QUEUE_SIZE: usize = 64;

fn default_meta_event_queue_size() -> usize {
    DEFAULT_META_EVENT_QUEUE_SIZE
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Adds the caller's identity to every `INVOCATION`.
    #[serde(default)]
    pub auto_disclose_caller: bool,
    /// Adds the publisher's identity to every `EVENT`.
    #[serde(default)]
    pub auto_disclose_publisher: bool,
    #[serde(default = "default_meta_event_queue_size")]
    pub meta_event_queue_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            auto_disclose_caller: false,
            auto_disclose_publisher: false,
            meta_event_queue_size: DEFAULT_META_EVENT_QUEUE_SIZE,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(json5::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read router config: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse router config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl RouterConfig {
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        json5::from_str(contents).map_err(ConfigError::Parse)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)
            .and_then(|contents| Self::from_json5_str(&contents));

        match &loaded {
            Ok(config) => debug!(
                event = events::CONFIG_LOADED,
                component = COMPONENT,
                path = %path.display(),
                auto_disclose_caller = config.auto_disclose_caller,
                auto_disclose_publisher = config.auto_disclose_publisher,
                meta_event_queue_size = config.meta_event_queue_size,
                "router config loaded"
            ),
            Err(err) => warn!(
                event = events::CONFIG_LOAD_FAILED,
                component = COMPONENT,
                path = %path.display(),
                err = %err,
                "router config could not be loaded"
            ),
        }

        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, RouterConfig, DEFAULT_META_EVENT_QUEUE_SIZE};
    use std::error::Error;

    #[test]
    fn empty_object_uses_defaults() {
        let config = RouterConfig::from_json5_str("{}").expect("empty config should parse");

        assert_eq!(config, RouterConfig::default());
        assert_eq!(config.meta_event_queue_size, DEFAULT_META_EVENT_QUEUE_SIZE);
    }

    #[test]
    fn json5_syntax_is_accepted() {
        let config = RouterConfig::from_json5_str(
            "{
                // disclose who is calling
                auto_disclose_caller: true,
                meta_event_queue_size: 8,
            }",
        )
        .expect("json5 config should parse");

        assert!(config.auto_disclose_caller);
        assert!(!config.auto_disclose_publisher);
        assert_eq!(config.meta_event_queue_size, 8);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RouterConfig::from_json5_str("{ disclose_everything: true }")
            .expect_err("unknown field should fail");

        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = RouterConfig::from_file("does/not/exist.json5").expect_err("missing file");

        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("failed to read router config"));
    }
}
