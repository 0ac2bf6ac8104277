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

//! Typed views over the option keys the router interprets.

use super::Dict;
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub const OPTION_MATCH: &str = "match";
pub const OPTION_INVOKE: &str = "invoke";
pub const OPTION_PROGRESS: &str = "progress";
pub const OPTION_RECEIVE_PROGRESS: &str = "receive_progress";
pub const OPTION_ACKNOWLEDGE: &str = "acknowledge";
pub const OPTION_MODE: &str = "mode";
pub const OPTION_REASON: &str = "reason";

/// Reads a boolean option; anything but `true` counts as unset.
pub fn option_flag(options: &Dict, key: &str) -> bool {
    options.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn option_str<'a>(options: &'a Dict, key: &str) -> Option<&'a str> {
    options.get(key).and_then(Value::as_str)
}

/// How a subscription topic or registration procedure is compared against incoming URIs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MatchPolicy {
    #[default]
    Exact,
    Prefix,
    Wildcard,
}

impl MatchPolicy {
    /// Unknown or missing `match` values fall back to exact matching.
    pub fn from_options(options: &Dict) -> Self {
        match option_str(options, OPTION_MATCH) {
            Some("prefix") => MatchPolicy::Prefix,
            Some("wildcard") => MatchPolicy::Wildcard,
            _ => MatchPolicy::Exact,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchPolicy::Exact => "exact",
            MatchPolicy::Prefix => "prefix",
            MatchPolicy::Wildcard => "wildcard",
        }
    }
}

impl Display for MatchPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule choosing which registrant serves a call on a shared registration.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum InvocationPolicy {
    #[default]
    Single,
    First,
    Last,
    RoundRobin,
    Random,
}

impl InvocationPolicy {
    /// Unknown or missing `invoke` values are treated as `single`.
    pub fn from_options(options: &Dict) -> Self {
        match option_str(options, OPTION_INVOKE) {
            Some("first") => InvocationPolicy::First,
            Some("last") => InvocationPolicy::Last,
            Some("roundrobin") => InvocationPolicy::RoundRobin,
            Some("random") => InvocationPolicy::Random,
            _ => InvocationPolicy::Single,
        }
    }

    /// Whether more than one callee may join a registration under this policy.
    pub fn is_shared(self) -> bool {
        !matches!(self, InvocationPolicy::Single)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvocationPolicy::Single => "single",
            InvocationPolicy::First => "first",
            InvocationPolicy::Last => "last",
            InvocationPolicy::RoundRobin => "roundrobin",
            InvocationPolicy::Random => "random",
        }
    }
}

impl Display for InvocationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `CANCEL` behaviour requested by the caller.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CancelMode {
    Skip,
    Kill,
    #[default]
    KillNoWait,
}

impl CancelMode {
    /// A missing `mode` means `killnowait`; an unrecognised one is returned as `Err`.
    pub fn from_options(options: &Dict) -> Result<Self, String> {
        match options.get(OPTION_MODE) {
            None => Ok(CancelMode::default()),
            Some(Value::String(mode)) => match mode.as_str() {
                "skip" => Ok(CancelMode::Skip),
                "kill" => Ok(CancelMode::Kill),
                "killnowait" => Ok(CancelMode::KillNoWait),
                other => Err(other.to_string()),
            },
            Some(other) => Err(other.to_string()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CancelMode::Skip => "skip",
            CancelMode::Kill => "kill",
            CancelMode::KillNoWait => "killnowait",
        }
    }
}

impl Display for CancelMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
