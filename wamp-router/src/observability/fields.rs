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

//! Shared field values and value-format helpers.

use crate::messages::Message;

pub const NONE: &str = "none";
pub const REASON_QUEUE_FULL: &str = "queue_full";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";

/// Name of the message kind, as used in the `msg_type` field.
pub fn format_message_type(message: &Message) -> &'static str {
    message.message_type().name()
}

/// Renders a recipient list compactly, e.g. `[3, 7]`.
pub fn format_recipients(recipients: &[u64]) -> String {
    if recipients.is_empty() {
        return NONE.to_string();
    }
    let joined = recipients
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{joined}]")
}
