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

/// Session record handed to the router once a peer has joined a realm.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionDetails {
    pub id: u64,
    pub realm: String,
    pub authid: String,
    pub authrole: String,
    /// Whether the peer's serializer can take a pre-serialized payload as-is.
    pub static_serializer: bool,
}

impl SessionDetails {
    pub fn new(
        id: u64,
        realm: impl Into<String>,
        authid: impl Into<String>,
        authrole: impl Into<String>,
        static_serializer: bool,
    ) -> Self {
        Self {
            id,
            realm: realm.into(),
            authid: authid.into(),
            authrole: authrole.into(),
            static_serializer,
        }
    }
}
