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

//! Remote procedure call routing.
//!
//! The dealer owns registrations and in-flight invocations for one realm. Every public
//! operation takes the single state lock for its whole duration and validates before it
//! mutates, so a failed operation leaves no trace.

mod calls;
mod error;
mod meta;
mod registration;

pub use error::DealerError;
pub use meta::RegistrationMetaEvent;
pub use registration::Registration;

use crate::config::{RouterConfig, DEFAULT_META_EVENT_QUEUE_SIZE};
use crate::id_generator::{generate_global_id, RouterScopeIdGenerator};
use crate::matching::UriIndex;
use crate::messages::{
    uri, Error, InvocationPolicy, MatchPolicy, Message, MessageType, MessageWithRecipient,
    Register, Registered, Unregister, Unregistered,
};
use crate::observability::events;
use crate::session_details::SessionDetails;
use meta::MetaEventSender;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::{debug, info};

const COMPONENT: &str = "dealer";

/// Router-side record of one dispatched call.
#[derive(Clone, Debug)]
struct PendingInvocation {
    request_id: u64,
    caller: u64,
    callee: u64,
    registration_id: u64,
    /// Policy of the registration the call resolved through.
    match_policy: MatchPolicy,
    receive_progress: bool,
    progress: bool,
    /// Set by a `kill` cancel; the next reply from the callee ends the call as canceled.
    canceled: bool,
}

#[derive(Default)]
struct DealerState {
    sessions: HashMap<u64, SessionDetails>,
    registrations: HashMap<u64, Registration>,
    registrations_by_session: HashMap<u64, HashSet<u64>>,
    index: UriIndex<u64>,
    pending: HashMap<u64, PendingInvocation>,
    invocation_by_call: HashMap<(u64, u64), u64>,
    auto_disclose_caller: bool,
    meta: Option<MetaEventSender>,
}

impl DealerState {
    fn emit(&self, event: RegistrationMetaEvent) {
        if let Some(meta) = &self.meta {
            meta.emit(event);
        }
    }

    fn is_live(&self, registration_id: u64) -> bool {
        self.registrations
            .get(&registration_id)
            .is_some_and(|registration| !registration.callees.is_empty())
    }

    fn fresh_registration_id(&self) -> u64 {
        loop {
            let id = generate_global_id();
            if !self.registrations.contains_key(&id) {
                return id;
            }
        }
    }

    fn register(
        &mut self,
        session_id: u64,
        register: Register,
    ) -> Result<MessageWithRecipient, DealerError> {
        if !self.sessions.contains_key(&session_id) {
            return Err(DealerError::UnknownSession(session_id));
        }

        let requested = InvocationPolicy::from_options(&register.options);
        let registration_id = match self.index.get(&register.procedure) {
            Some((_, existing_id)) => {
                let admitted = self.registrations.get_mut(&existing_id).and_then(|existing| {
                    (existing.admits(requested) && !existing.has_callee(session_id)).then(|| {
                        existing.add_callee(session_id);
                        existing.id
                    })
                });
                let Some(registration_id) = admitted else {
                    info!(
                        event = events::REGISTRATION_REJECTED,
                        component = COMPONENT,
                        session_id,
                        procedure = register.procedure.as_str(),
                        invocation_policy = requested.as_str(),
                        "procedure already registered"
                    );
                    return Ok(MessageWithRecipient::new(
                        Message::Error(Error::new(
                            MessageType::Register,
                            register.request_id,
                            uri::PROCEDURE_ALREADY_EXISTS,
                        )),
                        session_id,
                    ));
                };
                registration_id
            }
            None => {
                let match_policy = MatchPolicy::from_options(&register.options);
                let registration = Registration::new(
                    self.fresh_registration_id(),
                    &register.procedure,
                    match_policy,
                    requested,
                    session_id,
                );
                self.index
                    .insert(&registration.procedure, match_policy, registration.id);
                debug!(
                    event = events::REGISTRATION_CREATED,
                    component = COMPONENT,
                    registration_id = registration.id,
                    procedure = registration.procedure.as_str(),
                    match_policy = match_policy.as_str(),
                    invocation_policy = requested.as_str(),
                    "registration created"
                );
                self.emit(RegistrationMetaEvent::RegistrationCreated(
                    registration.clone(),
                ));
                let id = registration.id;
                self.registrations.insert(id, registration);
                id
            }
        };

        self.registrations_by_session
            .entry(session_id)
            .or_default()
            .insert(registration_id);
        debug!(
            event = events::CALLEE_ADDED,
            component = COMPONENT,
            session_id,
            registration_id,
            procedure = register.procedure.as_str(),
            "callee added"
        );
        self.emit(RegistrationMetaEvent::CalleeAdded {
            session_id,
            registration_id,
        });

        Ok(MessageWithRecipient::new(
            Message::Registered(Registered {
                request_id: register.request_id,
                registration_id,
            }),
            session_id,
        ))
    }

    fn unregister(
        &mut self,
        session_id: u64,
        unregister: Unregister,
    ) -> Result<MessageWithRecipient, DealerError> {
        let held = self
            .registrations_by_session
            .get_mut(&session_id)
            .ok_or(DealerError::UnknownSession(session_id))?;

        if !held.remove(&unregister.registration_id) {
            return Err(DealerError::UnknownRegistration {
                session_id,
                registration_id: unregister.registration_id,
            });
        }
        self.remove_callee(unregister.registration_id, session_id);

        Ok(MessageWithRecipient::new(
            Message::Unregistered(Unregistered {
                request_id: unregister.request_id,
            }),
            session_id,
        ))
    }

    /// Drops one callee, deleting the registration once nobody serves it.
    fn remove_callee(&mut self, registration_id: u64, session_id: u64) {
        let Some(registration) = self.registrations.get_mut(&registration_id) else {
            return;
        };
        if !registration.remove_callee(session_id) {
            return;
        }
        let now_empty = registration.callees.is_empty();
        let procedure = registration.procedure.clone();

        debug!(
            event = events::CALLEE_REMOVED,
            component = COMPONENT,
            session_id,
            registration_id,
            procedure = procedure.as_str(),
            "callee removed"
        );
        self.emit(RegistrationMetaEvent::CalleeRemoved {
            session_id,
            registration_id,
        });

        if now_empty {
            self.registrations.remove(&registration_id);
            self.index.remove(&procedure);
            debug!(
                event = events::REGISTRATION_DELETED,
                component = COMPONENT,
                registration_id,
                procedure = procedure.as_str(),
                "registration deleted"
            );
            self.emit(RegistrationMetaEvent::RegistrationDeleted {
                session_id,
                registration_id,
            });
        }
    }

    /// Forgets a pending invocation together with its (caller, request) entry.
    fn drop_pending(&mut self, invocation_id: u64) -> Option<PendingInvocation> {
        let pending = self.pending.remove(&invocation_id)?;
        let call_key = (pending.caller, pending.request_id);
        if self.invocation_by_call.get(&call_key) == Some(&invocation_id) {
            self.invocation_by_call.remove(&call_key);
        }
        Some(pending)
    }

    fn registrations_with(&self, match_policy: MatchPolicy) -> HashMap<u64, Registration> {
        self.registrations
            .values()
            .filter(|registration| registration.match_policy == match_policy)
            .map(|registration| (registration.id, registration.clone()))
            .collect()
    }
}

/// Dealer for one realm.
pub struct Dealer {
    state: Mutex<DealerState>,
    id_gen: RouterScopeIdGenerator,
    meta_event_queue_size: usize,
}

impl Default for Dealer {
    fn default() -> Self {
        Self {
            state: Mutex::new(DealerState::default()),
            id_gen: RouterScopeIdGenerator::new(),
            meta_event_queue_size: DEFAULT_META_EVENT_QUEUE_SIZE,
        }
    }
}

impl Dealer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &RouterConfig) -> Self {
        let dealer = Self {
            meta_event_queue_size: config.meta_event_queue_size,
            ..Self::default()
        };
        dealer.auto_disclose_caller(config.auto_disclose_caller);
        dealer
    }

    pub fn auto_disclose_caller(&self, disclose: bool) {
        self.state.lock().auto_disclose_caller = disclose;
    }

    /// Starts publishing registration meta events. A second call replaces the earlier
    /// receiver, which then sees its channel closed.
    pub fn enable_meta_api(&self) -> mpsc::Receiver<RegistrationMetaEvent> {
        let (sender, receiver) = MetaEventSender::channel(self.meta_event_queue_size);
        self.state.lock().meta = Some(sender);
        receiver
    }

    pub fn add_session(&self, details: SessionDetails) -> Result<(), DealerError> {
        let mut state = self.state.lock();
        if state.sessions.contains_key(&details.id) {
            return Err(DealerError::DuplicateSession(details.id));
        }

        state
            .registrations_by_session
            .insert(details.id, HashSet::new());
        state.sessions.insert(details.id, details);
        Ok(())
    }

    /// Detaches a session, dropping its registrations and the calls it was waiting on.
    pub fn remove_session(&self, session_id: u64) -> Result<(), DealerError> {
        let mut state = self.state.lock();
        if state.sessions.remove(&session_id).is_none() {
            return Err(DealerError::UnknownSession(session_id));
        }

        let held = state
            .registrations_by_session
            .remove(&session_id)
            .unwrap_or_default();
        for registration_id in held {
            state.remove_callee(registration_id, session_id);
        }

        let abandoned: Vec<u64> = state
            .pending
            .iter()
            .filter(|(_, pending)| pending.caller == session_id)
            .map(|(&invocation_id, _)| invocation_id)
            .collect();
        for invocation_id in abandoned {
            state.drop_pending(invocation_id);
            debug!(
                event = events::PENDING_INVOCATION_DROPPED,
                component = COMPONENT,
                session_id,
                invocation_id,
                "caller detached with invocation in flight"
            );
        }
        Ok(())
    }

    pub fn has_session(&self, session_id: u64) -> bool {
        self.state.lock().sessions.contains_key(&session_id)
    }

    /// Whether `procedure` is registered under exactly that string with at least one callee.
    pub fn has_procedure(&self, procedure: &str) -> bool {
        let state = self.state.lock();
        state
            .index
            .get(procedure)
            .is_some_and(|(_, registration_id)| state.is_live(registration_id))
    }

    /// The registration a call to `procedure` would be routed through.
    pub fn match_registration(&self, procedure: &str) -> Option<Registration> {
        let state = self.state.lock();
        let resolved = state
            .index
            .resolve(procedure, |registration_id| state.is_live(registration_id))?;
        state.registrations.get(&resolved.value).cloned()
    }

    pub fn exact_registrations(&self) -> HashMap<u64, Registration> {
        self.state.lock().registrations_with(MatchPolicy::Exact)
    }

    pub fn prefix_registrations(&self) -> HashMap<u64, Registration> {
        self.state.lock().registrations_with(MatchPolicy::Prefix)
    }

    pub fn wildcard_registrations(&self) -> HashMap<u64, Registration> {
        self.state.lock().registrations_with(MatchPolicy::Wildcard)
    }

    pub fn registrations_by_procedure(&self) -> HashMap<String, Registration> {
        self.state
            .lock()
            .registrations
            .values()
            .map(|registration| (registration.procedure.clone(), registration.clone()))
            .collect()
    }

    /// Handles `REGISTER`, `UNREGISTER`, `CALL`, `YIELD`, `CANCEL` and invocation `ERROR`s.
    ///
    /// `CANCEL` may produce two messages; every other kind produces exactly one.
    pub fn receive_message(
        &self,
        session_id: u64,
        message: Message,
    ) -> Result<Vec<MessageWithRecipient>, DealerError> {
        let mut state = self.state.lock();
        match message {
            Message::Register(register) => state.register(session_id, register).map(|m| vec![m]),
            Message::Unregister(unregister) => {
                state.unregister(session_id, unregister).map(|m| vec![m])
            }
            Message::Call(call) => state
                .call(session_id, call, &self.id_gen)
                .map(|m| vec![m]),
            Message::Yield(yield_) => state.yield_result(session_id, yield_).map(|m| vec![m]),
            Message::Error(error) => state.invocation_error(session_id, error).map(|m| vec![m]),
            Message::Cancel(cancel) => state.cancel(session_id, cancel),
            other => Err(DealerError::UnexpectedMessage(other.message_type())),
        }
    }
}
