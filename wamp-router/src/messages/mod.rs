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

//! Router-ready WAMP message records.
//!
//! The router never sees bytes. A serializer owned by the host decodes and validates each
//! frame into one of the [`Message`] variants below and encodes the outbound records again.
//! Options and details stay as JSON objects so unknown keys survive the trip.

mod options;

pub use options::{
    option_flag, CancelMode, InvocationPolicy, MatchPolicy, OPTION_ACKNOWLEDGE, OPTION_INVOKE,
    OPTION_MATCH, OPTION_MODE, OPTION_PROGRESS, OPTION_REASON, OPTION_RECEIVE_PROGRESS,
};

use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// JSON object used for options and details dictionaries.
pub type Dict = Map<String, Value>;

/// Canonical error URIs produced by the router.
pub mod uri {
    pub const NO_SUCH_PROCEDURE: &str = "wamp.error.no_such_procedure";
    pub const PROCEDURE_ALREADY_EXISTS: &str = "wamp.error.procedure_already_exists";
    pub const CANCELED: &str = "wamp.error.canceled";
}

/// Numeric discriminant of every message kind the serializer understands.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageType {
    Hello = 1,
    Welcome = 2,
    Abort = 3,
    Challenge = 4,
    Authenticate = 5,
    Goodbye = 6,
    Error = 8,
    Publish = 16,
    Published = 17,
    Subscribe = 32,
    Subscribed = 33,
    Unsubscribe = 34,
    Unsubscribed = 35,
    Event = 36,
    Call = 48,
    Cancel = 49,
    Result = 50,
    Register = 64,
    Registered = 65,
    Unregister = 66,
    Unregistered = 67,
    Invocation = 68,
    Interrupt = 69,
    Yield = 70,
}

impl MessageType {
    /// Upper-case protocol name, as used in logs and validation errors.
    pub fn name(self) -> &'static str {
        match self {
            MessageType::Hello => "HELLO",
            MessageType::Welcome => "WELCOME",
            MessageType::Abort => "ABORT",
            MessageType::Challenge => "CHALLENGE",
            MessageType::Authenticate => "AUTHENTICATE",
            MessageType::Goodbye => "GOODBYE",
            MessageType::Error => "ERROR",
            MessageType::Publish => "PUBLISH",
            MessageType::Published => "PUBLISHED",
            MessageType::Subscribe => "SUBSCRIBE",
            MessageType::Subscribed => "SUBSCRIBED",
            MessageType::Unsubscribe => "UNSUBSCRIBE",
            MessageType::Unsubscribed => "UNSUBSCRIBED",
            MessageType::Event => "EVENT",
            MessageType::Call => "CALL",
            MessageType::Cancel => "CANCEL",
            MessageType::Result => "RESULT",
            MessageType::Register => "REGISTER",
            MessageType::Registered => "REGISTERED",
            MessageType::Unregister => "UNREGISTER",
            MessageType::Unregistered => "UNREGISTERED",
            MessageType::Invocation => "INVOCATION",
            MessageType::Interrupt => "INTERRUPT",
            MessageType::Yield => "YIELD",
        }
    }

    pub fn code(self) -> u64 {
        self as u64
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a numeric discriminant names no known message kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnknownMessageType(pub u64);

impl Display for UnknownMessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown message type {}", self.0)
    }
}

impl std::error::Error for UnknownMessageType {}

impl TryFrom<u64> for MessageType {
    type Error = UnknownMessageType;

    fn try_from(value: u64) -> Result<Self, UnknownMessageType> {
        let message_type = match value {
            1 => MessageType::Hello,
            2 => MessageType::Welcome,
            3 => MessageType::Abort,
            4 => MessageType::Challenge,
            5 => MessageType::Authenticate,
            6 => MessageType::Goodbye,
            8 => MessageType::Error,
            16 => MessageType::Publish,
            17 => MessageType::Published,
            32 => MessageType::Subscribe,
            33 => MessageType::Subscribed,
            34 => MessageType::Unsubscribe,
            35 => MessageType::Unsubscribed,
            36 => MessageType::Event,
            48 => MessageType::Call,
            49 => MessageType::Cancel,
            50 => MessageType::Result,
            64 => MessageType::Register,
            65 => MessageType::Registered,
            66 => MessageType::Unregister,
            67 => MessageType::Unregistered,
            68 => MessageType::Invocation,
            69 => MessageType::Interrupt,
            70 => MessageType::Yield,
            other => return Err(UnknownMessageType(other)),
        };
        Ok(message_type)
    }
}

/// Serializer that produced an opaque payload.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SerializerId {
    #[default]
    None = 0,
    Json = 1,
    MsgPack = 2,
    Cbor = 3,
}

/// Pre-serialized application payload forwarded without re-encoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinaryPayload {
    pub serializer: SerializerId,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hello {
    pub realm: String,
    pub details: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Welcome {
    pub session_id: u64,
    pub details: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Abort {
    pub details: Dict,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Challenge {
    pub auth_method: String,
    pub extra: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Authenticate {
    pub signature: String,
    pub extra: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Goodbye {
    pub details: Dict,
    pub reason: String,
}

/// `ERROR` reply; `request_type` names the kind of the request it answers.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub request_type: MessageType,
    pub request_id: u64,
    pub details: Dict,
    pub uri: String,
    pub args: Vec<Value>,
    pub kwargs: Dict,
}

impl Error {
    pub fn new(request_type: MessageType, request_id: u64, uri: &str) -> Self {
        Self {
            request_type,
            request_id,
            details: Dict::new(),
            uri: uri.to_string(),
            args: Vec::new(),
            kwargs: Dict::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Publish {
    pub request_id: u64,
    pub options: Dict,
    pub topic: String,
    pub args: Vec<Value>,
    pub kwargs: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Published {
    pub request_id: u64,
    pub publication_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subscribe {
    pub request_id: u64,
    pub options: Dict,
    pub topic: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subscribed {
    pub request_id: u64,
    pub subscription_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unsubscribe {
    pub request_id: u64,
    pub subscription_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unsubscribed {
    pub request_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub subscription_id: u64,
    pub publication_id: u64,
    pub details: Dict,
    pub args: Vec<Value>,
    pub kwargs: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Call {
    pub request_id: u64,
    pub options: Dict,
    pub procedure: String,
    pub args: Vec<Value>,
    pub kwargs: Dict,
    pub payload: Option<BinaryPayload>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cancel {
    pub request_id: u64,
    pub options: Dict,
}

/// `RESULT` sent back to a caller.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallResult {
    pub request_id: u64,
    pub details: Dict,
    pub args: Vec<Value>,
    pub kwargs: Dict,
    pub payload: Option<BinaryPayload>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Register {
    pub request_id: u64,
    pub options: Dict,
    pub procedure: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Registered {
    pub request_id: u64,
    pub registration_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unregister {
    pub request_id: u64,
    pub registration_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unregistered {
    pub request_id: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Invocation {
    pub request_id: u64,
    pub registration_id: u64,
    pub details: Dict,
    pub args: Vec<Value>,
    pub kwargs: Dict,
    pub payload: Option<BinaryPayload>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interrupt {
    pub request_id: u64,
    pub options: Dict,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Yield {
    pub request_id: u64,
    pub options: Dict,
    pub args: Vec<Value>,
    pub kwargs: Dict,
    pub payload: Option<BinaryPayload>,
}

/// Every message kind, one variant each.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Hello(Hello),
    Welcome(Welcome),
    Abort(Abort),
    Challenge(Challenge),
    Authenticate(Authenticate),
    Goodbye(Goodbye),
    Error(Error),
    Publish(Publish),
    Published(Published),
    Subscribe(Subscribe),
    Subscribed(Subscribed),
    Unsubscribe(Unsubscribe),
    Unsubscribed(Unsubscribed),
    Event(Event),
    Call(Call),
    Cancel(Cancel),
    Result(CallResult),
    Register(Register),
    Registered(Registered),
    Unregister(Unregister),
    Unregistered(Unregistered),
    Invocation(Invocation),
    Interrupt(Interrupt),
    Yield(Yield),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Hello(_) => MessageType::Hello,
            Message::Welcome(_) => MessageType::Welcome,
            Message::Abort(_) => MessageType::Abort,
            Message::Challenge(_) => MessageType::Challenge,
            Message::Authenticate(_) => MessageType::Authenticate,
            Message::Goodbye(_) => MessageType::Goodbye,
            Message::Error(_) => MessageType::Error,
            Message::Publish(_) => MessageType::Publish,
            Message::Published(_) => MessageType::Published,
            Message::Subscribe(_) => MessageType::Subscribe,
            Message::Subscribed(_) => MessageType::Subscribed,
            Message::Unsubscribe(_) => MessageType::Unsubscribe,
            Message::Unsubscribed(_) => MessageType::Unsubscribed,
            Message::Event(_) => MessageType::Event,
            Message::Call(_) => MessageType::Call,
            Message::Cancel(_) => MessageType::Cancel,
            Message::Result(_) => MessageType::Result,
            Message::Register(_) => MessageType::Register,
            Message::Registered(_) => MessageType::Registered,
            Message::Unregister(_) => MessageType::Unregister,
            Message::Unregistered(_) => MessageType::Unregistered,
            Message::Invocation(_) => MessageType::Invocation,
            Message::Interrupt(_) => MessageType::Interrupt,
            Message::Yield(_) => MessageType::Yield,
        }
    }
}

/// One outbound message and the session it must be delivered to.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageWithRecipient {
    pub message: Message,
    pub recipient: u64,
}

impl MessageWithRecipient {
    pub fn new(message: Message, recipient: u64) -> Self {
        Self { message, recipient }
    }
}

/// Fan-out computed for one `PUBLISH`. Never retained by the broker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Publication {
    pub event: Option<Event>,
    pub recipients: Vec<u64>,
    pub ack: Option<MessageWithRecipient>,
}
