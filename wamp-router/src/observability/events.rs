/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Canonical structured event names used across `wamp-router`.

// Session directory events.
pub const SESSION_ADDED: &str = "session_added";
pub const SESSION_REMOVED: &str = "session_removed";
pub const SESSION_ADD_FAILED: &str = "session_add_failed";
pub const SESSION_ROLLBACK: &str = "session_rollback";
pub const SESSION_ROLLBACK_FAILED: &str = "session_rollback_failed";

// Broker events.
pub const SUBSCRIPTION_CREATED: &str = "subscription_created";
pub const SUBSCRIBER_ADDED: &str = "subscriber_added";
pub const SUBSCRIBER_REMOVED: &str = "subscriber_removed";
pub const SUBSCRIPTION_DELETED: &str = "subscription_deleted";
pub const PUBLISH_ROUTED: &str = "publish_routed";
pub const PUBLISH_NO_SUBSCRIBERS: &str = "publish_no_subscribers";

// Dealer events.
pub const REGISTRATION_CREATED: &str = "registration_created";
pub const REGISTRATION_REJECTED: &str = "registration_rejected";
pub const CALLEE_ADDED: &str = "callee_added";
pub const CALLEE_REMOVED: &str = "callee_removed";
pub const REGISTRATION_DELETED: &str = "registration_deleted";
pub const CALL_ROUTED: &str = "call_routed";
pub const CALL_NO_SUCH_PROCEDURE: &str = "call_no_such_procedure";
pub const YIELD_ROUTED: &str = "yield_routed";
pub const INVOCATION_ERROR_ROUTED: &str = "invocation_error_routed";
pub const CALL_CANCELED: &str = "call_canceled";
pub const PENDING_INVOCATION_DROPPED: &str = "pending_invocation_dropped";
pub const META_EVENT_DROPPED: &str = "meta_event_dropped";

// Router facade events.
pub const MESSAGE_ROUTED: &str = "message_routed";
pub const MESSAGE_REJECTED: &str = "message_rejected";

// Configuration events.
pub const CONFIG_LOADED: &str = "config_loaded";
pub const CONFIG_LOAD_FAILED: &str = "config_load_failed";
