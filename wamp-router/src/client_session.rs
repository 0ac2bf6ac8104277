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

//! Peer-side request bookkeeping.
//!
//! A [`ClientSession`] sits between a client application and its serializer. Every outbound
//! request is recorded so that inbound replies can be checked against it; a reply that answers
//! nothing the client asked for is rejected.

use crate::messages::{option_flag, Message, MessageType, OPTION_ACKNOWLEDGE, OPTION_PROGRESS};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientSessionError {
    /// The client may not send this kind of message through a session.
    UnsupportedSend(MessageType),
    /// The client does not expect to receive this kind of message.
    UnsupportedReceive(MessageType),
    /// An `ERROR` sent by a client must answer an `INVOCATION`.
    UnsupportedErrorSend(MessageType),
    /// An inbound `ERROR` answering a kind of request clients never send.
    UnexpectedErrorReply(MessageType),
    UnknownSubscription(u64),
    UnknownRegistration(u64),
    UnknownRequest {
        message_type: MessageType,
        request_id: u64,
    },
}

impl Display for ClientSessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientSessionError::UnsupportedSend(message_type) => {
                write!(f, "sending {message_type} is not supported")
            }
            ClientSessionError::UnsupportedReceive(message_type) => {
                write!(f, "receiving {message_type} is not supported")
            }
            ClientSessionError::UnsupportedErrorSend(request_type) => write!(
                f,
                "ERROR may only be sent in reply to INVOCATION, not {request_type}"
            ),
            ClientSessionError::UnexpectedErrorReply(request_type) => {
                write!(f, "received ERROR for unexpected request kind {request_type}")
            }
            ClientSessionError::UnknownSubscription(id) => {
                write!(f, "no subscription {id} is held")
            }
            ClientSessionError::UnknownRegistration(id) => {
                write!(f, "no registration {id} is held")
            }
            ClientSessionError::UnknownRequest {
                message_type,
                request_id,
            } => write!(f, "received {message_type} for unknown request {request_id}"),
        }
    }
}

impl Error for ClientSessionError {}

#[derive(Debug, Default)]
pub struct ClientSession {
    call_requests: HashSet<u64>,
    register_requests: HashSet<u64>,
    registrations: HashSet<u64>,
    invocation_requests: HashSet<u64>,
    /// Request ID to the registration being dropped.
    unregister_requests: HashMap<u64, u64>,

    publish_requests: HashSet<u64>,
    subscribe_requests: HashSet<u64>,
    subscriptions: HashSet<u64>,
    /// Request ID to the subscription being dropped.
    unsubscribe_requests: HashMap<u64, u64>,
}

impl ClientSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_registration(&self, registration_id: u64) -> bool {
        self.registrations.contains(&registration_id)
    }

    pub fn has_subscription(&self, subscription_id: u64) -> bool {
        self.subscriptions.contains(&subscription_id)
    }

    /// Records an outbound message before it is handed to the serializer.
    pub fn send_message(&mut self, message: &Message) -> Result<(), ClientSessionError> {
        match message {
            Message::Call(call) => {
                self.call_requests.insert(call.request_id);
            }
            Message::Cancel(cancel) => {
                // the call stays open until its ERROR or RESULT arrives
                if !self.call_requests.contains(&cancel.request_id) {
                    return Err(unknown(MessageType::Cancel, cancel.request_id));
                }
            }
            Message::Yield(yield_) => {
                if !self.invocation_requests.contains(&yield_.request_id) {
                    return Err(unknown(MessageType::Yield, yield_.request_id));
                }
                if !option_flag(&yield_.options, OPTION_PROGRESS) {
                    self.invocation_requests.remove(&yield_.request_id);
                }
            }
            Message::Register(register) => {
                self.register_requests.insert(register.request_id);
            }
            Message::Unregister(unregister) => {
                if !self.registrations.contains(&unregister.registration_id) {
                    return Err(ClientSessionError::UnknownRegistration(
                        unregister.registration_id,
                    ));
                }
                self.unregister_requests
                    .insert(unregister.request_id, unregister.registration_id);
            }
            Message::Publish(publish) => {
                if option_flag(&publish.options, OPTION_ACKNOWLEDGE) {
                    self.publish_requests.insert(publish.request_id);
                }
            }
            Message::Subscribe(subscribe) => {
                self.subscribe_requests.insert(subscribe.request_id);
            }
            Message::Unsubscribe(unsubscribe) => {
                if !self.subscriptions.contains(&unsubscribe.subscription_id) {
                    return Err(ClientSessionError::UnknownSubscription(
                        unsubscribe.subscription_id,
                    ));
                }
                self.unsubscribe_requests
                    .insert(unsubscribe.request_id, unsubscribe.subscription_id);
            }
            Message::Error(error) => {
                if error.request_type != MessageType::Invocation {
                    return Err(ClientSessionError::UnsupportedErrorSend(error.request_type));
                }
                self.invocation_requests.remove(&error.request_id);
            }
            Message::Goodbye(_) => {}
            other => return Err(ClientSessionError::UnsupportedSend(other.message_type())),
        }
        Ok(())
    }

    /// Checks an inbound message against outstanding requests and hands it back on success.
    pub fn receive_message(&mut self, message: Message) -> Result<Message, ClientSessionError> {
        match &message {
            Message::Result(result) => {
                if !self.call_requests.contains(&result.request_id) {
                    return Err(unknown(MessageType::Result, result.request_id));
                }
                if !option_flag(&result.details, OPTION_PROGRESS) {
                    self.call_requests.remove(&result.request_id);
                }
            }
            Message::Registered(registered) => {
                if !self.register_requests.remove(&registered.request_id) {
                    return Err(unknown(MessageType::Registered, registered.request_id));
                }
                self.registrations.insert(registered.registration_id);
            }
            Message::Unregistered(unregistered) => {
                let registration_id = self
                    .unregister_requests
                    .remove(&unregistered.request_id)
                    .ok_or_else(|| unknown(MessageType::Unregistered, unregistered.request_id))?;
                if !self.registrations.remove(&registration_id) {
                    return Err(ClientSessionError::UnknownRegistration(registration_id));
                }
            }
            Message::Invocation(invocation) => {
                if !self.registrations.contains(&invocation.registration_id) {
                    return Err(ClientSessionError::UnknownRegistration(
                        invocation.registration_id,
                    ));
                }
                self.invocation_requests.insert(invocation.request_id);
            }
            Message::Interrupt(interrupt) => {
                if !self.invocation_requests.contains(&interrupt.request_id) {
                    return Err(unknown(MessageType::Interrupt, interrupt.request_id));
                }
            }
            Message::Published(published) => {
                if !self.publish_requests.remove(&published.request_id) {
                    return Err(unknown(MessageType::Published, published.request_id));
                }
            }
            Message::Subscribed(subscribed) => {
                if !self.subscribe_requests.remove(&subscribed.request_id) {
                    return Err(unknown(MessageType::Subscribed, subscribed.request_id));
                }
                self.subscriptions.insert(subscribed.subscription_id);
            }
            Message::Unsubscribed(unsubscribed) => {
                let subscription_id = self
                    .unsubscribe_requests
                    .remove(&unsubscribed.request_id)
                    .ok_or_else(|| unknown(MessageType::Unsubscribed, unsubscribed.request_id))?;
                if !self.subscriptions.remove(&subscription_id) {
                    return Err(ClientSessionError::UnknownSubscription(subscription_id));
                }
            }
            Message::Event(event) => {
                if !self.subscriptions.contains(&event.subscription_id) {
                    return Err(ClientSessionError::UnknownSubscription(event.subscription_id));
                }
            }
            Message::Error(error) => {
                let outstanding = match error.request_type {
                    MessageType::Call => self.call_requests.remove(&error.request_id),
                    MessageType::Register => self.register_requests.remove(&error.request_id),
                    MessageType::Unregister => self
                        .unregister_requests
                        .remove(&error.request_id)
                        .is_some(),
                    MessageType::Subscribe => self.subscribe_requests.remove(&error.request_id),
                    MessageType::Unsubscribe => self
                        .unsubscribe_requests
                        .remove(&error.request_id)
                        .is_some(),
                    MessageType::Publish => self.publish_requests.remove(&error.request_id),
                    other => return Err(ClientSessionError::UnexpectedErrorReply(other)),
                };
                if !outstanding {
                    return Err(unknown(MessageType::Error, error.request_id));
                }
            }
            Message::Goodbye(_) => {}
            other => return Err(ClientSessionError::UnsupportedReceive(other.message_type())),
        }
        Ok(message)
    }
}

fn unknown(message_type: MessageType, request_id: u64) -> ClientSessionError {
    ClientSessionError::UnknownRequest {
        message_type,
        request_id,
    }
}
