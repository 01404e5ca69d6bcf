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

//! Which binding each consumer registration arrived on.

use crate::control_plane::context_key::BrokerContextKey;
use crate::message::Uri;
use std::collections::{BTreeMap, HashMap};

/// Consumer address to (context to binding address). One route per
/// registration; the latest REGISTER in a context decides its binding.
#[derive(Debug, Default)]
pub(crate) struct ConsumerRoutes {
    routes: HashMap<Uri, BTreeMap<BrokerContextKey, Uri>>,
}

impl ConsumerRoutes {
    /// Records the route and returns the binding it replaced, if different.
    pub(crate) fn bind(
        &mut self,
        context: &BrokerContextKey,
        consumer: &Uri,
        binding: &Uri,
    ) -> Option<Uri> {
        self.routes
            .entry(consumer.clone())
            .or_default()
            .insert(context.clone(), binding.clone())
            .filter(|previous| previous != binding)
    }

    /// Drops the route and returns the binding it used.
    pub(crate) fn unbind(&mut self, context: &BrokerContextKey, consumer: &Uri) -> Option<Uri> {
        let contexts = self.routes.get_mut(consumer)?;
        let removed = contexts.remove(context);
        if contexts.is_empty() {
            self.routes.remove(consumer);
        }
        removed
    }

    pub(crate) fn route(&self, context: &BrokerContextKey, consumer: &Uri) -> Option<&Uri> {
        self.routes.get(consumer)?.get(context)
    }

    /// `true` while any registration of `consumer` still routes through `binding`.
    pub(crate) fn routes_through(&self, consumer: &Uri, binding: &Uri) -> bool {
        self.routes
            .get(consumer)
            .is_some_and(|contexts| contexts.values().any(|uri| uri == binding))
    }

    /// Drops every route of `consumer` and returns the bindings they used.
    pub(crate) fn remove_consumer(&mut self, consumer: &Uri) -> Vec<Uri> {
        let mut bindings: Vec<Uri> = self
            .routes
            .remove(consumer)
            .map(|contexts| contexts.into_values().collect())
            .unwrap_or_default();
        bindings.sort();
        bindings.dedup();
        bindings
    }
}
