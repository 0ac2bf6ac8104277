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

//! # wamp-router
//!
//! `wamp-router` is the routing core of a WAMP router: a [`Broker`] for publish/subscribe and
//! a [`Dealer`] for remote procedure calls, plus the URI matching and session bookkeeping they
//! share.
//!
//! The crate never touches bytes or sockets. A host decodes frames into [`messages::Message`]
//! records, hands them to a component together with the sending session's ID, and delivers
//! the returned `(message, recipient)` pairs.
//!
//! ## Realm facade
//!
//! [`Router`] bundles one broker and one dealer for a realm and dispatches by message kind.
//!
//! ```
//! use wamp_router::messages::{Call, Message, Register, Yield};
//! use wamp_router::{Router, SessionDetails};
//!
//! let router = Router::new("realm1");
//! router
//!     .attach(SessionDetails::new(1, "realm1", "callee", "user", false))
//!     .unwrap();
//! router
//!     .attach(SessionDetails::new(2, "realm1", "caller", "user", false))
//!     .unwrap();
//!
//! let registered = router
//!     .receive(
//!         1,
//!         Message::Register(Register {
//!             request_id: 1,
//!             procedure: "com.example.add".to_string(),
//!             ..Default::default()
//!         }),
//!     )
//!     .unwrap();
//! assert!(matches!(registered[0].message, Message::Registered(_)));
//!
//! let routed = router
//!     .receive(
//!         2,
//!         Message::Call(Call {
//!             request_id: 7,
//!             procedure: "com.example.add".to_string(),
//!             args: vec![2.into(), 3.into()],
//!             ..Default::default()
//!         }),
//!     )
//!     .unwrap();
//! assert_eq!(routed[0].recipient, 1);
//! let Message::Invocation(invocation) = &routed[0].message else {
//!     panic!("expected INVOCATION");
//! };
//!
//! let result = router
//!     .receive(
//!         1,
//!         Message::Yield(Yield {
//!             request_id: invocation.request_id,
//!             args: vec![5.into()],
//!             ..Default::default()
//!         }),
//!     )
//!     .unwrap();
//! assert_eq!(result[0].recipient, 2);
//! assert!(matches!(&result[0].message, Message::Result(r) if r.request_id == 7));
//! ```
//!
//! ## Error model
//!
//! Protocol-level failures (unknown procedure, procedure already registered, canceled call)
//! are ordinary `ERROR` messages addressed to the requesting session. Invariant violations
//! (unknown session, unknown subscription, stale invocation ID) fail the operation with a
//! typed error and leave state untouched.
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber. Hosts and tests are
//! responsible for one-time `tracing_subscriber` initialization at process boundaries.

pub mod broker;
pub use broker::{Broker, BrokerError, Subscription};

pub mod client_session;
pub use client_session::{ClientSession, ClientSessionError};

pub mod config;
pub use config::{ConfigError, RouterConfig};

pub mod dealer;
pub use dealer::{Dealer, DealerError, Registration, RegistrationMetaEvent};

pub mod id_generator;
pub mod matching;
pub mod messages;

#[doc(hidden)]
pub mod observability;

mod router;
pub use router::{describe_outbound, Router, RouterError};

mod session_details;
pub use session_details::SessionDetails;

#[doc(hidden)]
pub mod benchmark_support;
