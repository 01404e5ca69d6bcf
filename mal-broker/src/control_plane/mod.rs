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

//! Control-plane layer.
//!
//! Owns broker-context partitioning and the registration strategy. Registry
//! maps are created on first mutation of a context and collected as soon as a
//! removal leaves both of them empty.
//!
//! ```
//! use mal_broker::{BrokerContextKey, BrokerHandler, DefaultBrokerHandler, ProviderIdentity, QosLevel, SessionType, Uri};
//!
//! let context = BrokerContextKey::new(vec!["esa".to_string()], "GROUND", SessionType::Live, "LIVE");
//! let provider = ProviderIdentity::new(Uri::from("maltcp://provider"), &context);
//! let mut handler = DefaultBrokerHandler::default();
//!
//! handler.register_provider(&context, &provider, QosLevel::Assured, vec![]);
//! assert_eq!(handler.context_count(), 1);
//!
//! assert!(handler.deregister_provider(&context, &provider));
//! assert!(!handler.deregister_provider(&context, &provider));
//! assert_eq!(handler.context_count(), 0);
//! ```

pub(crate) mod context_key;
pub(crate) mod handler;
pub(crate) mod registry_store;
