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

//! Call dispatch, progressive results and cancellation.

use super::{DealerError, DealerState, PendingInvocation, COMPONENT};
use crate::id_generator::RouterScopeIdGenerator;
use crate::messages::{
    option_flag, uri, Call, CallResult, Cancel, CancelMode, Dict, Error, Interrupt, Invocation,
    MatchPolicy, Message, MessageType, MessageWithRecipient, Yield, OPTION_MODE, OPTION_PROGRESS,
    OPTION_REASON, OPTION_RECEIVE_PROGRESS,
};
use crate::observability::events;
use serde_json::Value;
use tracing::{debug, info};

impl DealerState {
    pub(super) fn call(
        &mut self,
        session_id: u64,
        call: Call,
        id_gen: &RouterScopeIdGenerator,
    ) -> Result<MessageWithRecipient, DealerError> {
        let caller = self
            .sessions
            .get(&session_id)
            .ok_or(DealerError::UnknownSession(session_id))?;

        let receive_progress = option_flag(&call.options, OPTION_RECEIVE_PROGRESS);
        let progress = option_flag(&call.options, OPTION_PROGRESS);

        let mut details = Dict::new();
        if receive_progress {
            details.insert(OPTION_RECEIVE_PROGRESS.to_string(), Value::Bool(true));
        }
        if progress {
            details.insert(OPTION_PROGRESS.to_string(), Value::Bool(true));
        }
        if self.auto_disclose_caller {
            details.insert("caller".to_string(), Value::from(caller.id));
            details.insert(
                "caller_authid".to_string(),
                Value::from(caller.authid.as_str()),
            );
            details.insert(
                "caller_authrole".to_string(),
                Value::from(caller.authrole.as_str()),
            );
            details.insert("procedure".to_string(), Value::from(call.procedure.as_str()));
        }

        // A progressive repeat stays on the invocation it opened. The closing repeat without
        // `progress` goes to the same callee under a new invocation.
        let existing = self
            .invocation_by_call
            .get(&(session_id, call.request_id))
            .copied();
        let open = existing.and_then(|invocation_id| {
            self.pending
                .get(&invocation_id)
                .filter(|pending| pending.progress)
                .map(|pending| {
                    (
                        invocation_id,
                        pending.callee,
                        pending.registration_id,
                        pending.match_policy,
                    )
                })
        });

        let (reused, callee_id, registration_id, match_policy) = match open {
            Some((invocation_id, callee_id, registration_id, match_policy)) if progress => {
                (Some(invocation_id), callee_id, registration_id, match_policy)
            }
            Some((_, callee_id, registration_id, match_policy)) => {
                if !self.sessions.contains_key(&callee_id) {
                    return Err(DealerError::CalleeGone(callee_id));
                }
                (None, callee_id, registration_id, match_policy)
            }
            None => {
                let Some(resolved) = self
                    .index
                    .resolve(&call.procedure, |registration_id| self.is_live(registration_id))
                else {
                    info!(
                        event = events::CALL_NO_SUCH_PROCEDURE,
                        component = COMPONENT,
                        session_id,
                        request_id = call.request_id,
                        procedure = call.procedure.as_str(),
                        "no registration matches procedure"
                    );
                    return Ok(no_such_procedure(session_id, call.request_id));
                };
                let Some((index, callee_id)) =
                    self.registrations.get(&resolved.value).and_then(|registration| {
                        registration
                            .pick_callee()
                            .map(|index| (index, registration.callees[index]))
                    })
                else {
                    return Ok(no_such_procedure(session_id, call.request_id));
                };
                if !self.sessions.contains_key(&callee_id) {
                    return Err(DealerError::CalleeGone(callee_id));
                }
                if let Some(registration) = self.registrations.get_mut(&resolved.value) {
                    registration.commit_pick(index);
                }
                (None, callee_id, resolved.value, resolved.policy)
            }
        };

        let invocation_id = match reused {
            Some(invocation_id) => invocation_id,
            None => {
                // a closing chunk, or a request ID reused before its call finished
                if let Some(superseded) = existing {
                    self.drop_pending(superseded);
                }
                let invocation_id = id_gen.next_id();
                self.pending.insert(
                    invocation_id,
                    PendingInvocation {
                        request_id: call.request_id,
                        caller: session_id,
                        callee: callee_id,
                        registration_id,
                        match_policy,
                        receive_progress,
                        progress,
                        canceled: false,
                    },
                );
                self.invocation_by_call
                    .insert((session_id, call.request_id), invocation_id);
                invocation_id
            }
        };

        if match_policy != MatchPolicy::Exact {
            details.insert("procedure".to_string(), Value::from(call.procedure.as_str()));
        }

        let callee = self
            .sessions
            .get(&callee_id)
            .ok_or(DealerError::CalleeGone(callee_id))?;

        let mut invocation = Invocation {
            request_id: invocation_id,
            registration_id,
            details,
            ..Default::default()
        };
        match call.payload {
            Some(payload) if callee.static_serializer => invocation.payload = Some(payload),
            _ => {
                invocation.args = call.args;
                invocation.kwargs = call.kwargs;
            }
        }

        debug!(
            event = events::CALL_ROUTED,
            component = COMPONENT,
            session_id,
            request_id = call.request_id,
            procedure = call.procedure.as_str(),
            registration_id,
            invocation_id,
            callee = callee_id,
            "call routed"
        );

        Ok(MessageWithRecipient::new(
            Message::Invocation(invocation),
            callee_id,
        ))
    }

    /// Looks up the invocation a callee is replying to.
    fn pending_for_callee(
        &self,
        session_id: u64,
        invocation_id: u64,
    ) -> Option<&PendingInvocation> {
        self.pending
            .get(&invocation_id)
            .filter(|pending| pending.callee == session_id)
    }

    pub(super) fn yield_result(
        &mut self,
        session_id: u64,
        yield_: Yield,
    ) -> Result<MessageWithRecipient, DealerError> {
        let pending = self
            .pending_for_callee(session_id, yield_.request_id)
            .cloned()
            .ok_or(DealerError::NoPendingCall(yield_.request_id))?;
        let caller = self
            .sessions
            .get(&pending.caller)
            .ok_or(DealerError::CallerGone(pending.caller))?;
        let caller_id = caller.id;
        let caller_takes_payload = caller.static_serializer;
        let request_id = pending.request_id;

        if pending.canceled {
            self.drop_pending(yield_.request_id);
            return Ok(MessageWithRecipient::new(
                Message::Error(Error::new(MessageType::Call, request_id, uri::CANCELED)),
                caller_id,
            ));
        }

        let progress = pending.receive_progress && option_flag(&yield_.options, OPTION_PROGRESS);
        let mut result = CallResult {
            request_id,
            ..Default::default()
        };
        if progress {
            result
                .details
                .insert(OPTION_PROGRESS.to_string(), Value::Bool(true));
        } else {
            self.drop_pending(yield_.request_id);
        }

        match yield_.payload {
            Some(payload) if caller_takes_payload => result.payload = Some(payload),
            _ => {
                result.args = yield_.args;
                result.kwargs = yield_.kwargs;
            }
        }

        debug!(
            event = events::YIELD_ROUTED,
            component = COMPONENT,
            session_id,
            invocation_id = yield_.request_id,
            request_id,
            progress,
            "result routed to caller"
        );

        Ok(MessageWithRecipient::new(Message::Result(result), caller_id))
    }

    pub(super) fn invocation_error(
        &mut self,
        session_id: u64,
        error: Error,
    ) -> Result<MessageWithRecipient, DealerError> {
        if error.request_type != MessageType::Invocation {
            return Err(DealerError::UnexpectedErrorReply(error.request_type));
        }

        let pending = self
            .pending_for_callee(session_id, error.request_id)
            .cloned()
            .ok_or(DealerError::NoPendingInvocation(error.request_id))?;
        if !self.sessions.contains_key(&pending.caller) {
            return Err(DealerError::CallerGone(pending.caller));
        }
        let request_id = pending.request_id;
        self.drop_pending(error.request_id);

        debug!(
            event = events::INVOCATION_ERROR_ROUTED,
            component = COMPONENT,
            session_id,
            invocation_id = error.request_id,
            request_id,
            err = error.uri.as_str(),
            "invocation error routed to caller"
        );

        Ok(MessageWithRecipient::new(
            Message::Error(Error {
                request_type: MessageType::Call,
                request_id,
                ..error
            }),
            pending.caller,
        ))
    }

    pub(super) fn cancel(
        &mut self,
        session_id: u64,
        cancel: Cancel,
    ) -> Result<Vec<MessageWithRecipient>, DealerError> {
        let mode =
            CancelMode::from_options(&cancel.options).map_err(DealerError::UnsupportedCancelMode)?;

        let not_pending = DealerError::NoPendingInvocationToCancel {
            caller: session_id,
            request_id: cancel.request_id,
        };
        let invocation_id = *self
            .invocation_by_call
            .get(&(session_id, cancel.request_id))
            .ok_or_else(|| not_pending.clone())?;
        let pending = self.pending.get(&invocation_id).ok_or(not_pending)?;
        let callee_id = pending.callee;

        if mode != CancelMode::Skip && !self.sessions.contains_key(&callee_id) {
            return Err(DealerError::CalleeGone(callee_id));
        }

        let canceled = MessageWithRecipient::new(
            Message::Error(Error::new(
                MessageType::Call,
                cancel.request_id,
                uri::CANCELED,
            )),
            session_id,
        );
        let interrupt = MessageWithRecipient::new(
            Message::Interrupt(Interrupt {
                request_id: invocation_id,
                options: interrupt_options(mode),
            }),
            callee_id,
        );

        let outbound = match mode {
            CancelMode::Skip => {
                self.drop_pending(invocation_id);
                vec![canceled]
            }
            CancelMode::Kill => {
                if let Some(pending) = self.pending.get_mut(&invocation_id) {
                    pending.canceled = true;
                }
                vec![interrupt]
            }
            CancelMode::KillNoWait => {
                self.drop_pending(invocation_id);
                vec![interrupt, canceled]
            }
        };

        info!(
            event = events::CALL_CANCELED,
            component = COMPONENT,
            session_id,
            request_id = cancel.request_id,
            invocation_id,
            mode = mode.as_str(),
            "call canceled"
        );

        Ok(outbound)
    }
}

fn no_such_procedure(session_id: u64, request_id: u64) -> MessageWithRecipient {
    MessageWithRecipient::new(
        Message::Error(Error::new(
            MessageType::Call,
            request_id,
            uri::NO_SUCH_PROCEDURE,
        )),
        session_id,
    )
}

fn interrupt_options(mode: CancelMode) -> Dict {
    let mut options = Dict::new();
    options.insert(OPTION_MODE.to_string(), Value::from(mode.as_str()));
    options.insert(OPTION_REASON.to_string(), Value::from(uri::CANCELED));
    options
}
