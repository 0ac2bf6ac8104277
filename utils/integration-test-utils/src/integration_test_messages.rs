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

use serde_json::Value;
use wamp_router::messages::{
    Call, Cancel, Dict, Error, Message, MessageType, Publish, Register, Subscribe, Unregister,
    Unsubscribe, Yield,
};

/// Converts a `json!` object literal into an options/details dictionary.
pub fn dict(value: Value) -> Dict {
    match value {
        Value::Object(map) => map,
        Value::Null => Dict::new(),
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn subscribe(request_id: u64, topic: &str, options: Value) -> Message {
    Message::Subscribe(Subscribe {
        request_id,
        options: dict(options),
        topic: topic.to_string(),
    })
}

pub fn unsubscribe(request_id: u64, subscription_id: u64) -> Message {
    Message::Unsubscribe(Unsubscribe {
        request_id,
        subscription_id,
    })
}

pub fn publish(request_id: u64, topic: &str, options: Value) -> Publish {
    Publish {
        request_id,
        options: dict(options),
        topic: topic.to_string(),
        args: vec![Value::from("payload")],
        ..Default::default()
    }
}

pub fn register(request_id: u64, procedure: &str, options: Value) -> Message {
    Message::Register(Register {
        request_id,
        options: dict(options),
        procedure: procedure.to_string(),
    })
}

pub fn unregister(request_id: u64, registration_id: u64) -> Message {
    Message::Unregister(Unregister {
        request_id,
        registration_id,
    })
}

pub fn call(request_id: u64, procedure: &str) -> Message {
    Message::Call(Call {
        request_id,
        procedure: procedure.to_string(),
        args: vec![Value::from(request_id)],
        ..Default::default()
    })
}

/// A `CALL` chunk that asks for progressive results and may itself be progressive.
pub fn progressive_call(request_id: u64, procedure: &str, progress: bool) -> Message {
    let mut options = Dict::new();
    options.insert("receive_progress".to_string(), Value::Bool(true));
    if progress {
        options.insert("progress".to_string(), Value::Bool(true));
    }
    Message::Call(Call {
        request_id,
        options,
        procedure: procedure.to_string(),
        ..Default::default()
    })
}

pub fn yield_result(invocation_id: u64) -> Message {
    Message::Yield(Yield {
        request_id: invocation_id,
        args: vec![Value::from("done")],
        ..Default::default()
    })
}

pub fn progressive_yield(invocation_id: u64, chunk: u64) -> Message {
    let mut options = Dict::new();
    options.insert("progress".to_string(), Value::Bool(true));
    Message::Yield(Yield {
        request_id: invocation_id,
        options,
        args: vec![Value::from(chunk)],
        ..Default::default()
    })
}

pub fn invocation_error(invocation_id: u64, uri: &str) -> Message {
    Message::Error(Error::new(MessageType::Invocation, invocation_id, uri))
}

pub fn cancel(request_id: u64, mode: Option<&str>) -> Message {
    let mut options = Dict::new();
    if let Some(mode) = mode {
        options.insert("mode".to_string(), Value::from(mode));
    }
    Message::Cancel(Cancel {
        request_id,
        options,
    })
}
