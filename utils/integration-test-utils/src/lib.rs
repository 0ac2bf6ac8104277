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

mod integration_test_logging;
pub use integration_test_logging::init_logging;

mod integration_test_sessions;
pub use integration_test_sessions::{session, static_session, TEST_REALM};

mod integration_test_messages;
pub use integration_test_messages::{
    call, cancel, dict, invocation_error, progressive_call, progressive_yield, publish, register,
    subscribe, unregister, unsubscribe, yield_result,
};
