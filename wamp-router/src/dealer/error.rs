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

use crate::messages::MessageType;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hard failures of a dealer operation. None of them leaves state modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealerError {
    DuplicateSession(u64),
    UnknownSession(u64),
    UnknownRegistration {
        session_id: u64,
        registration_id: u64,
    },
    NoPendingCall(u64),
    NoPendingInvocation(u64),
    NoPendingInvocationToCancel {
        caller: u64,
        request_id: u64,
    },
    /// An `ERROR` that does not answer an `INVOCATION`.
    UnexpectedErrorReply(MessageType),
    CalleeGone(u64),
    CallerGone(u64),
    UnsupportedCancelMode(String),
    UnexpectedMessage(MessageType),
}

impl Display for DealerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DealerError::DuplicateSession(id) => write!(f, "session {id} is already attached"),
            DealerError::UnknownSession(id) => write!(f, "session {id} is not attached"),
            DealerError::UnknownRegistration {
                session_id,
                registration_id,
            } => write!(
                f,
                "session {session_id} holds no registration {registration_id}"
            ),
            DealerError::NoPendingCall(id) => write!(f, "no pending call for invocation {id}"),
            DealerError::NoPendingInvocation(id) => write!(f, "no pending invocation {id}"),
            DealerError::NoPendingInvocationToCancel { caller, request_id } => write!(
                f,
                "no pending invocation to cancel for request {request_id} of session {caller}"
            ),
            DealerError::UnexpectedErrorReply(request_type) => write!(
                f,
                "dealer only accepts ERROR in reply to INVOCATION, got reply to {request_type}"
            ),
            DealerError::CalleeGone(id) => write!(f, "callee {id} is no longer attached"),
            DealerError::CallerGone(id) => write!(f, "caller {id} is no longer attached"),
            DealerError::UnsupportedCancelMode(mode) => {
                write!(f, "unsupported cancel mode {mode}")
            }
            DealerError::UnexpectedMessage(message_type) => {
                write!(f, "dealer cannot handle {message_type} messages")
            }
        }
    }
}

impl Error for DealerError {}

#[cfg(test)]
mod tests {
    use super::DealerError;
    use crate::messages::MessageType;

    #[test]
    fn display_names_the_offending_ids() {
        let error = DealerError::NoPendingInvocationToCancel {
            caller: 3,
            request_id: 12,
        };

        assert_eq!(
            error.to_string(),
            "no pending invocation to cancel for request 12 of session 3"
        );
        assert_eq!(
            DealerError::UnexpectedErrorReply(MessageType::Call).to_string(),
            "dealer only accepts ERROR in reply to INVOCATION, got reply to CALL"
        );
    }
}
