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

//! Publish/subscribe routing.

use crate::config::RouterConfig;
use crate::id_generator::{generate_global_id, RouterScopeIdGenerator};
use crate::matching::UriIndex;
use crate::messages::{
    option_flag, Dict, Event, MatchPolicy, Message, MessageType, MessageWithRecipient, Publication,
    Publish, Published, Subscribe, Subscribed, Unsubscribe, Unsubscribed, OPTION_ACKNOWLEDGE,
};
use crate::observability::{events, fields};
use crate::session_details::SessionDetails;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tracing::debug;

const COMPONENT: &str = "broker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    DuplicateSession(u64),
    UnknownSession(u64),
    UnknownSubscription { session_id: u64, subscription_id: u64 },
    UnexpectedMessage(MessageType),
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::DuplicateSession(id) => write!(f, "session {id} is already attached"),
            BrokerError::UnknownSession(id) => write!(f, "session {id} is not attached"),
            BrokerError::UnknownSubscription {
                session_id,
                subscription_id,
            } => write!(
                f,
                "session {session_id} holds no subscription {subscription_id}"
            ),
            BrokerError::UnexpectedMessage(message_type) => {
                write!(f, "broker cannot handle {message_type} messages")
            }
        }
    }
}

impl Error for BrokerError {}

/// Snapshot of one subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub id: u64,
    pub topic: String,
    pub match_policy: MatchPolicy,
    pub subscribers: HashSet<u64>,
}

#[derive(Default)]
struct BrokerState {
    sessions: HashMap<u64, SessionDetails>,
    subscriptions: HashMap<u64, Subscription>,
    subscriptions_by_session: HashMap<u64, HashSet<u64>>,
    index: UriIndex<u64>,
    auto_disclose_publisher: bool,
}

impl BrokerState {
    fn is_live(&self, subscription_id: u64) -> bool {
        self.subscriptions
            .get(&subscription_id)
            .is_some_and(|subscription| !subscription.subscribers.is_empty())
    }

    /// Drops `session_id` from one subscription, deleting the subscription once empty.
    fn remove_subscriber(&mut self, subscription_id: u64, session_id: u64) {
        let Some(subscription) = self.subscriptions.get_mut(&subscription_id) else {
            return;
        };
        subscription.subscribers.remove(&session_id);
        debug!(
            event = events::SUBSCRIBER_REMOVED,
            component = COMPONENT,
            session_id,
            subscription_id,
            topic = subscription.topic.as_str(),
            "subscriber removed"
        );

        if subscription.subscribers.is_empty() {
            let topic = subscription.topic.clone();
            self.subscriptions.remove(&subscription_id);
            self.index.remove(&topic);
            debug!(
                event = events::SUBSCRIPTION_DELETED,
                component = COMPONENT,
                subscription_id,
                topic = topic.as_str(),
                "subscription deleted"
            );
        }
    }

    fn subscribe(
        &mut self,
        session_id: u64,
        subscribe: Subscribe,
        id_gen: &RouterScopeIdGenerator,
    ) -> Result<MessageWithRecipient, BrokerError> {
        if !self.sessions.contains_key(&session_id) {
            return Err(BrokerError::UnknownSession(session_id));
        }

        let subscription_id = match self.index.get(&subscribe.topic) {
            Some((_, existing)) => existing,
            None => {
                let match_policy = MatchPolicy::from_options(&subscribe.options);
                let subscription = Subscription {
                    id: id_gen.next_id(),
                    topic: subscribe.topic.clone(),
                    match_policy,
                    subscribers: HashSet::new(),
                };
                self.index
                    .insert(&subscription.topic, match_policy, subscription.id);
                debug!(
                    event = events::SUBSCRIPTION_CREATED,
                    component = COMPONENT,
                    subscription_id = subscription.id,
                    topic = subscription.topic.as_str(),
                    match_policy = match_policy.as_str(),
                    "subscription created"
                );
                let id = subscription.id;
                self.subscriptions.insert(id, subscription);
                id
            }
        };

        if let Some(subscription) = self.subscriptions.get_mut(&subscription_id) {
            subscription.subscribers.insert(session_id);
        }
        self.subscriptions_by_session
            .entry(session_id)
            .or_default()
            .insert(subscription_id);
        debug!(
            event = events::SUBSCRIBER_ADDED,
            component = COMPONENT,
            session_id,
            subscription_id,
            topic = subscribe.topic.as_str(),
            "subscriber added"
        );

        Ok(MessageWithRecipient::new(
            Message::Subscribed(Subscribed {
                request_id: subscribe.request_id,
                subscription_id,
            }),
            session_id,
        ))
    }

    fn unsubscribe(
        &mut self,
        session_id: u64,
        unsubscribe: Unsubscribe,
    ) -> Result<MessageWithRecipient, BrokerError> {
        let held = self
            .subscriptions_by_session
            .get_mut(&session_id)
            .ok_or(BrokerError::UnknownSession(session_id))?;

        if !held.remove(&unsubscribe.subscription_id) {
            return Err(BrokerError::UnknownSubscription {
                session_id,
                subscription_id: unsubscribe.subscription_id,
            });
        }
        self.remove_subscriber(unsubscribe.subscription_id, session_id);

        Ok(MessageWithRecipient::new(
            Message::Unsubscribed(Unsubscribed {
                request_id: unsubscribe.request_id,
            }),
            session_id,
        ))
    }

    fn publish(&self, session_id: u64, publish: Publish) -> Result<Publication, BrokerError> {
        let publisher = self
            .sessions
            .get(&session_id)
            .ok_or(BrokerError::UnknownSession(session_id))?;

        let publication_id = generate_global_id();
        let mut publication = Publication::default();

        let matched = self
            .index
            .resolve(&publish.topic, |subscription_id| self.is_live(subscription_id))
            .and_then(|resolved| {
                self.subscriptions
                    .get(&resolved.value)
                    .map(|subscription| (resolved.policy, subscription))
            });

        match matched {
            Some((policy, subscription)) => {
                let mut details = Dict::new();
                if policy != MatchPolicy::Exact {
                    details.insert("topic".to_string(), Value::from(publish.topic.as_str()));
                }
                if self.auto_disclose_publisher {
                    details.insert("publisher".to_string(), Value::from(publisher.id));
                    details.insert(
                        "publisher_authid".to_string(),
                        Value::from(publisher.authid.as_str()),
                    );
                    details.insert(
                        "publisher_authrole".to_string(),
                        Value::from(publisher.authrole.as_str()),
                    );
                    details.insert("topic".to_string(), Value::from(publish.topic.as_str()));
                }

                publication.recipients = subscription.subscribers.iter().copied().collect();
                publication.recipients.sort_unstable();
                publication.event = Some(Event {
                    subscription_id: subscription.id,
                    publication_id,
                    details,
                    args: publish.args,
                    kwargs: publish.kwargs,
                });
                debug!(
                    event = events::PUBLISH_ROUTED,
                    component = COMPONENT,
                    session_id,
                    topic = publish.topic.as_str(),
                    subscription_id = subscription.id,
                    recipients = fields::format_recipients(&publication.recipients),
                    "publication routed"
                );
            }
            None => debug!(
                event = events::PUBLISH_NO_SUBSCRIBERS,
                component = COMPONENT,
                session_id,
                topic = publish.topic.as_str(),
                "publication has no subscribers"
            ),
        }

        if option_flag(&publish.options, OPTION_ACKNOWLEDGE) {
            publication.ack = Some(MessageWithRecipient::new(
                Message::Published(Published {
                    request_id: publish.request_id,
                    publication_id,
                }),
                session_id,
            ));
        }

        Ok(publication)
    }
}

/// Broker for one realm. Every operation runs under a single lock.
#[derive(Default)]
pub struct Broker {
    state: Mutex<BrokerState>,
    id_gen: RouterScopeIdGenerator,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &RouterConfig) -> Self {
        let broker = Self::new();
        broker.auto_disclose_publisher(config.auto_disclose_publisher);
        broker
    }

    pub fn auto_disclose_publisher(&self, disclose: bool) {
        self.state.lock().auto_disclose_publisher = disclose;
    }

    pub fn add_session(&self, details: SessionDetails) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        if state.sessions.contains_key(&details.id) {
            return Err(BrokerError::DuplicateSession(details.id));
        }

        state.subscriptions_by_session.insert(details.id, HashSet::new());
        state.sessions.insert(details.id, details);
        Ok(())
    }

    pub fn remove_session(&self, session_id: u64) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        if state.sessions.remove(&session_id).is_none() {
            return Err(BrokerError::UnknownSession(session_id));
        }

        let held = state
            .subscriptions_by_session
            .remove(&session_id)
            .unwrap_or_default();
        for subscription_id in held {
            state.remove_subscriber(subscription_id, session_id);
        }
        Ok(())
    }

    pub fn has_session(&self, session_id: u64) -> bool {
        self.state.lock().sessions.contains_key(&session_id)
    }

    /// Whether a subscription exists for exactly this topic string.
    pub fn has_subscription(&self, topic: &str) -> bool {
        self.state.lock().index.get(topic).is_some()
    }

    /// The subscription a publication to `topic` would be delivered through.
    pub fn match_subscription(&self, topic: &str) -> Option<Subscription> {
        let state = self.state.lock();
        let resolved = state
            .index
            .resolve(topic, |subscription_id| state.is_live(subscription_id))?;
        state.subscriptions.get(&resolved.value).cloned()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.state.lock().subscriptions.values().cloned().collect()
    }

    /// Handles `SUBSCRIBE` and `UNSUBSCRIBE`.
    pub fn receive_message(
        &self,
        session_id: u64,
        message: Message,
    ) -> Result<MessageWithRecipient, BrokerError> {
        let mut state = self.state.lock();
        match message {
            Message::Subscribe(subscribe) => state.subscribe(session_id, subscribe, &self.id_gen),
            Message::Unsubscribe(unsubscribe) => state.unsubscribe(session_id, unsubscribe),
            other => Err(BrokerError::UnexpectedMessage(other.message_type())),
        }
    }

    /// Computes the fan-out of one `PUBLISH`. No match is not an error.
    pub fn receive_publish(
        &self,
        session_id: u64,
        publish: Publish,
    ) -> Result<Publication, BrokerError> {
        self.state.lock().publish(session_id, publish)
    }
}
