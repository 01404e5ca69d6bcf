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

//! Context-partitioned registry storage.

use crate::control_plane::context_key::BrokerContextKey;
use crate::observability::{events, fields};
use crate::routing::consumer_registry::ConsumerRegistry;
use crate::routing::provider_registry::ProviderRegistry;
use std::collections::HashMap;
use tracing::debug;

const COMPONENT: &str = "registry_store";

/// The provider and consumer maps of one broker context.
#[derive(Debug, Default)]
pub(crate) struct ContextRegistries {
    pub(crate) providers: ProviderRegistry,
    pub(crate) consumers: ConsumerRegistry,
}

impl ContextRegistries {
    fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.consumers.is_empty()
    }
}

/// Registry maps keyed by broker context. Contexts are created on first
/// mutation and collected once both of their maps are empty.
#[derive(Debug, Default)]
pub(crate) struct RegistryStore {
    contexts: HashMap<BrokerContextKey, ContextRegistries>,
}

impl RegistryStore {
    pub(crate) fn get(&self, context: &BrokerContextKey) -> Option<&ContextRegistries> {
        self.contexts.get(context)
    }

    pub(crate) fn get_mut(&mut self, context: &BrokerContextKey) -> Option<&mut ContextRegistries> {
        self.contexts.get_mut(context)
    }

    pub(crate) fn get_or_create(&mut self, context: &BrokerContextKey) -> &mut ContextRegistries {
        self.contexts.entry(context.clone()).or_insert_with(|| {
            debug!(
                event = events::CONTEXT_CREATED,
                component = COMPONENT,
                context = %fields::format_context(context),
                "created broker context"
            );
            ContextRegistries::default()
        })
    }

    /// Removes the context if both maps are empty. Returns `true` if removed.
    pub(crate) fn collect_if_empty(&mut self, context: &BrokerContextKey) -> bool {
        let empty = self
            .contexts
            .get(context)
            .is_some_and(ContextRegistries::is_empty);
        if empty {
            self.contexts.remove(context);
            debug!(
                event = events::CONTEXT_COLLECTED,
                component = COMPONENT,
                context = %fields::format_context(context),
                "collected empty broker context"
            );
        }
        empty
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (&BrokerContextKey, &mut ContextRegistries)> {
        self.contexts.iter_mut()
    }

    /// Drops every empty context.
    pub(crate) fn collect_all_empty(&mut self) -> usize {
        let before = self.contexts.len();
        self.contexts.retain(|_, registries| !registries.is_empty());
        before - self.contexts.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.contexts.len()
    }
}
