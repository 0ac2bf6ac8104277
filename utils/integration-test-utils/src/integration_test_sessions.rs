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

use wamp_router::SessionDetails;

pub const TEST_REALM: &str = "realm1";

/// Session whose serializer needs args/kwargs re-encoded.
pub fn session(id: u64) -> SessionDetails {
    SessionDetails::new(id, TEST_REALM, format!("authid-{id}"), "user", false)
}

/// Session whose serializer accepts pre-serialized payloads as-is.
pub fn static_session(id: u64) -> SessionDetails {
    SessionDetails::new(id, TEST_REALM, format!("authid-{id}"), "user", true)
}
