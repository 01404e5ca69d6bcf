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

//! Routing and subscription-resolution layer.
//!
//! Encapsulates the per-context registries and the matching policy used to turn
//! an update batch into notify sets: provider contracts, consumer subscription
//! filters and the strictness applied when filter and key-vector shapes differ.
//!
//! ```
//! use mal_broker::{Attribute, KeyFilter, KeyMatchStrictness, SubscriptionFilter, UpdateHeader};
//!
//! let filter = SubscriptionFilter::new(vec![KeyFilter::any_of("K1", vec![Attribute::Integer(5)])]);
//! let header = UpdateHeader {
//!     source: "P".to_string(),
//!     domain: vec!["esa".to_string(), "mission".to_string()],
//!     key_values: vec![Some(Attribute::Integer(5))],
//! };
//!
//! assert!(filter.matches(&header, &[], KeyMatchStrictness::Arity));
//! assert!(SubscriptionFilter::catch_all().matches(&header, &[], KeyMatchStrictness::Strict));
//! ```

pub(crate) mod consumer_registry;
pub(crate) mod notify_set;
pub(crate) mod provider_registry;
pub(crate) mod subscription_filter;
