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

//! Realm-level facade dispatching messages to the broker and the dealer.

use crate::broker::{Broker, BrokerError};
use crate::config::RouterConfig;
use crate::dealer::{Dealer, DealerError};
use crate::messages::{Message, MessageType, MessageWithRecipient};
use crate::observability::{events, fields};
use crate::session_details::SessionDetails;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::{debug, warn, Level};

const COMPONENT: &str = "router";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    RealmMismatch { expected: String, actual: String },
    Broker(BrokerError),
    Dealer(DealerError),
    UnexpectedMessage(MessageType),
}

impl Display for RouterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::RealmMismatch { expected, actual } => {
                write!(f, "session belongs to realm {actual}, router serves {expected}")
            }
            RouterError::Broker(err) => write!(f, "broker rejected message: {err}"),
            RouterError::Dealer(err) => write!(f, "dealer rejected message: {err}"),
            RouterError::UnexpectedMessage(message_type) => {
                write!(f, "router cannot handle {message_type} messages")
            }
        }
    }
}

impl Error for RouterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RouterError::Broker(err) => Some(err),
            RouterError::Dealer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BrokerError> for RouterError {
    fn from(err: BrokerError) -> Self {
        RouterError::Broker(err)
    }
}

impl From<DealerError> for RouterError {
    fn from(err: DealerError) -> Self {
        RouterError::Dealer(err)
    }
}

/// One broker and one dealer serving a single realm.
pub struct Router {
    realm: String,
    broker: Broker,
    dealer: Dealer,
}

impl Router {
    pub fn new(realm: impl Into<String>) -> Self {
        Self::with_config(realm, &RouterConfig::default())
    }

    pub fn with_config(realm: impl Into<String>, config: &RouterConfig) -> Self {
        Self {
            realm: realm.into(),
            broker: Broker::with_config(config),
            dealer: Dealer::with_config(config),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }

    /// Adds a session to both components, undoing the broker side if the dealer refuses.
    pub fn attach(&self, session: SessionDetails) -> Result<(), RouterError> {
        if session.realm != self.realm {
            return Err(RouterError::RealmMismatch {
                expected: self.realm.clone(),
                actual: session.realm,
            });
        }

        let session_id = session.id;
        if let Err(err) = self.broker.add_session(session.clone()) {
            warn!(
                event = events::SESSION_ADD_FAILED,
                component = COMPONENT,
                session_id,
                err = %err,
                "broker refused session"
            );
            return Err(err.into());
        }

        if let Err(err) = self.dealer.add_session(session) {
            if let Err(rollback_err) = self.broker.remove_session(session_id) {
                warn!(
                    event = events::SESSION_ROLLBACK_FAILED,
                    component = COMPONENT,
                    session_id,
                    err = %rollback_err,
                    "broker attachment could not be rolled back"
                );
            }
            warn!(
                event = events::SESSION_ROLLBACK,
                component = COMPONENT,
                session_id,
                err = %err,
                "dealer refused session; broker attachment rolled back"
            );
            return Err(err.into());
        }

        debug!(
            event = events::SESSION_ADDED,
            component = COMPONENT,
            session_id,
            realm = self.realm.as_str(),
            "session attached"
        );
        Ok(())
    }

    /// Removes a session from both components. Both are attempted even if the first fails.
    pub fn detach(&self, session_id: u64) -> Result<(), RouterError> {
        let broker_result = self.broker.remove_session(session_id);
        let dealer_result = self.dealer.remove_session(session_id);

        broker_result?;
        dealer_result?;
        debug!(
            event = events::SESSION_REMOVED,
            component = COMPONENT,
            session_id,
            realm = self.realm.as_str(),
            "session detached"
        );
        Ok(())
    }

    /// Routes one inbound message and returns everything that must be delivered as a result.
    pub fn receive(
        &self,
        session_id: u64,
        message: Message,
    ) -> Result<Vec<MessageWithRecipient>, RouterError> {
        let message_type = message.message_type();
        let routed = self.route(session_id, message);
        match &routed {
            Ok(outbound) if tracing::enabled!(Level::DEBUG) => debug!(
                event = events::MESSAGE_ROUTED,
                component = COMPONENT,
                session_id,
                msg_type = message_type.name(),
                outbound = describe_outbound(outbound).as_str(),
                "message routed"
            ),
            Ok(_) => {}
            Err(err) => warn!(
                event = events::MESSAGE_REJECTED,
                component = COMPONENT,
                session_id,
                msg_type = message_type.name(),
                err = %err,
                "message rejected"
            ),
        }
        routed
    }

    fn route(
        &self,
        session_id: u64,
        message: Message,
    ) -> Result<Vec<MessageWithRecipient>, RouterError> {
        match message {
            Message::Publish(publish) => {
                let publication = self.broker.receive_publish(session_id, publish)?;
                let mut outbound = Vec::with_capacity(publication.recipients.len() + 1);
                if let Some(event) = publication.event {
                    outbound.extend(publication.recipients.iter().map(|&recipient| {
                        MessageWithRecipient::new(Message::Event(event.clone()), recipient)
                    }));
                }
                outbound.extend(publication.ack);
                Ok(outbound)
            }
            message @ (Message::Subscribe(_) | Message::Unsubscribe(_)) => {
                Ok(vec![self.broker.receive_message(session_id, message)?])
            }
            message @ (Message::Register(_)
            | Message::Unregister(_)
            | Message::Call(_)
            | Message::Yield(_)
            | Message::Cancel(_)
            | Message::Error(_)) => Ok(self.dealer.receive_message(session_id, message)?),
            other => Err(RouterError::UnexpectedMessage(other.message_type())),
        }
    }
}

/// Formats an outbound batch for debug logs, e.g. `INVOCATION->3, ERROR->1`.
pub fn describe_outbound(outbound: &[MessageWithRecipient]) -> String {
    if outbound.is_empty() {
        return fields::NONE.to_string();
    }
    outbound
        .iter()
        .map(|routed| {
            format!(
                "{}->{}",
                fields::format_message_type(&routed.message),
                routed.recipient
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{describe_outbound, Router, RouterError};
    use crate::broker::BrokerError;
    use crate::dealer::DealerError;
    use crate::messages::{Hello, Message, MessageType, MessageWithRecipient, Unsubscribed};
    use crate::session_details::SessionDetails;
    use std::error::Error;

    fn session(id: u64, realm: &str) -> SessionDetails {
        SessionDetails::new(id, realm, "anonymous", "anonymous", false)
    }

    #[test]
    fn attach_rejects_foreign_realm() {
        let router = Router::new("realm1");

        assert!(matches!(
            router.attach(session(1, "realm2")),
            Err(RouterError::RealmMismatch { .. })
        ));
        assert!(!router.broker().has_session(1));
    }

    #[test]
    fn attach_rolls_back_broker_when_dealer_refuses() {
        let router = Router::new("realm1");
        router
            .dealer()
            .add_session(session(1, "realm1"))
            .expect("seed dealer");

        assert_eq!(
            router.attach(session(1, "realm1")),
            Err(RouterError::Dealer(DealerError::DuplicateSession(1)))
        );
        assert!(!router.broker().has_session(1));

        router.dealer().remove_session(1).expect("release dealer");
        router
            .attach(session(1, "realm1"))
            .expect("rolled back session attaches again");
        assert!(router.broker().has_session(1));
        assert!(router.dealer().has_session(1));
    }

    #[test]
    fn detach_unknown_session_reports_broker_error_with_source() {
        let router = Router::new("realm1");

        let err = router.detach(4).expect_err("unknown session");

        assert_eq!(err, RouterError::Broker(BrokerError::UnknownSession(4)));
        assert!(err.source().is_some());
    }

    #[test]
    fn session_establishment_messages_are_not_routed() {
        let router = Router::new("realm1");
        router.attach(session(1, "realm1")).expect("attach");

        assert_eq!(
            router.receive(1, Message::Hello(Hello::default())),
            Err(RouterError::UnexpectedMessage(MessageType::Hello))
        );
    }

    #[test]
    fn describe_outbound_lists_kind_and_recipient() {
        let outbound = vec![MessageWithRecipient::new(
            Message::Unsubscribed(Unsubscribed { request_id: 1 }),
            7,
        )];

        assert_eq!(describe_outbound(&outbound), "UNSUBSCRIBED->7");
        assert_eq!(describe_outbound(&[]), "none");
    }
}
