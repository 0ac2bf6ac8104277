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

//! Registration meta events, delivered best effort.

use super::registration::Registration;
use crate::observability::{events, fields};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

const COMPONENT: &str = "dealer_meta";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationMetaEvent {
    RegistrationCreated(Registration),
    CalleeAdded {
        session_id: u64,
        registration_id: u64,
    },
    CalleeRemoved {
        session_id: u64,
        registration_id: u64,
    },
    RegistrationDeleted {
        session_id: u64,
        registration_id: u64,
    },
}

/// Bounded sender that never waits for the consumer.
pub(crate) struct MetaEventSender {
    sender: mpsc::Sender<RegistrationMetaEvent>,
}

impl MetaEventSender {
    pub(crate) fn channel(capacity: usize) -> (Self, mpsc::Receiver<RegistrationMetaEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Drops the event if the queue is full or the receiver is gone.
    pub(crate) fn emit(&self, event: RegistrationMetaEvent) {
        if let Err(err) = self.sender.try_send(event) {
            let reason = match err {
                TrySendError::Full(_) => fields::REASON_QUEUE_FULL,
                TrySendError::Closed(_) => fields::REASON_QUEUE_CLOSED,
            };
            debug!(
                event = events::META_EVENT_DROPPED,
                component = COMPONENT,
                reason,
                "registration meta event dropped"
            );
        }
    }
}
