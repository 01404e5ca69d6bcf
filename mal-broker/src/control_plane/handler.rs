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

//! Registration strategy seam and its default implementation.

use crate::control_plane::context_key::{BrokerContextKey, ProviderIdentity};
use crate::control_plane::registry_store::RegistryStore;
use crate::error::BrokerError;
use crate::message::{KeyDeclaration, QosLevel, Subscription, Update, Uri};
use crate::observability::{events, fields};
use crate::routing::notify_set::MatchPlan;
use crate::routing::provider_registry::ProviderRegistration;
use crate::routing::subscription_filter::KeyMatchStrictness;
use tracing::debug;

const COMPONENT: &str = "broker_handler";

/// Registration and matching strategy used by the broker.
///
/// Every method runs inside the broker's registry critical section, so
/// implementations need no synchronization of their own and must not block.
pub trait BrokerHandler: Send + Sync {
    /// Creates or replaces the provider's publishing contract in `context`.
    fn register_provider(
        &mut self,
        context: &BrokerContextKey,
        provider: &ProviderIdentity,
        qos: QosLevel,
        declared_keys: Vec<KeyDeclaration>,
    );

    /// Fails with [`BrokerError::IncorrectState`] when the provider has no
    /// live registration in `context`.
    fn validate_publish(
        &self,
        context: &BrokerContextKey,
        provider: &ProviderIdentity,
        updates: &[Update],
    ) -> Result<ProviderRegistration, BrokerError>;

    /// Returns `true` when a registration was removed.
    fn deregister_provider(&mut self, context: &BrokerContextKey, provider: &ProviderIdentity) -> bool;

    fn add_subscriptions(
        &mut self,
        context: &BrokerContextKey,
        consumer: &Uri,
        subscriptions: Vec<Subscription>,
    );

    /// Returns the number of subscriptions removed.
    fn remove_subscriptions(
        &mut self,
        context: &BrokerContextKey,
        consumer: &Uri,
        subscription_ids: &[String],
    ) -> usize;

    fn match_batch(
        &self,
        context: &BrokerContextKey,
        declared_keys: &[KeyDeclaration],
        updates: &[Update],
    ) -> MatchPlan;

    /// QoS the provider registered with, `BestEffort` when unknown.
    fn provider_qos_level(&self, context: &BrokerContextKey, provider: &ProviderIdentity) -> QosLevel;

    /// Removes the consumer from every context. Returns how many contexts
    /// held a registration for it.
    fn remove_consumer(&mut self, consumer: &Uri) -> usize;

    fn context_count(&self) -> usize;

    fn provider_count(&self, context: &BrokerContextKey) -> usize;

    fn consumer_count(&self, context: &BrokerContextKey) -> usize;

    /// Subscription ids the consumer holds in `context`, sorted.
    fn subscription_ids(&self, context: &BrokerContextKey, consumer: &Uri) -> Vec<String>;
}

/// Context-partitioned in-memory registries.
#[derive(Debug, Default)]
pub struct DefaultBrokerHandler {
    store: RegistryStore,
    strictness: KeyMatchStrictness,
}

impl DefaultBrokerHandler {
    pub fn new(strictness: KeyMatchStrictness) -> Self {
        Self {
            store: RegistryStore::default(),
            strictness,
        }
    }

    pub fn strictness(&self) -> KeyMatchStrictness {
        self.strictness
    }
}

impl BrokerHandler for DefaultBrokerHandler {
    fn register_provider(
        &mut self,
        context: &BrokerContextKey,
        provider: &ProviderIdentity,
        qos: QosLevel,
        declared_keys: Vec<KeyDeclaration>,
    ) {
        let key_count = declared_keys.len();
        let created = self
            .store
            .get_or_create(context)
            .providers
            .register(provider, qos, declared_keys);
        debug!(
            event = events::PROVIDER_REGISTERED,
            component = COMPONENT,
            context = %fields::format_context(context),
            provider = %provider,
            qos = ?qos,
            key_count,
            created,
            "provider registered"
        );
    }

    fn validate_publish(
        &self,
        context: &BrokerContextKey,
        provider: &ProviderIdentity,
        updates: &[Update],
    ) -> Result<ProviderRegistration, BrokerError> {
        match self.store.get(context) {
            Some(registries) => registries
                .providers
                .validate_publish(context, provider, updates)
                .cloned(),
            None => Err(BrokerError::IncorrectState {
                provider: provider.address.clone(),
                context: context.to_string(),
            }),
        }
    }

    fn deregister_provider(&mut self, context: &BrokerContextKey, provider: &ProviderIdentity) -> bool {
        let removed = self
            .store
            .get_mut(context)
            .is_some_and(|registries| registries.providers.deregister(provider));
        self.store.collect_if_empty(context);

        debug!(
            event = events::PROVIDER_DEREGISTERED,
            component = COMPONENT,
            context = %fields::format_context(context),
            provider = %provider,
            removed,
            "provider deregistered"
        );
        removed
    }

    fn add_subscriptions(
        &mut self,
        context: &BrokerContextKey,
        consumer: &Uri,
        subscriptions: Vec<Subscription>,
    ) {
        let ids = fields::format_subscription_ids(subscriptions.iter().map(|s| s.id.as_str()));
        let created = self
            .store
            .get_or_create(context)
            .consumers
            .add_subscriptions(consumer, subscriptions);
        // An empty REGISTER on a fresh consumer leaves nothing behind.
        if created {
            if let Some(registries) = self.store.get_mut(context) {
                if registries.consumers.get(consumer).is_some_and(|r| r.is_empty()) {
                    registries.consumers.remove_consumer(consumer);
                }
            }
        }
        self.store.collect_if_empty(context);

        debug!(
            event = events::CONSUMER_REGISTERED,
            component = COMPONENT,
            context = %fields::format_context(context),
            consumer = %consumer,
            subscription_ids = %ids,
            created,
            "consumer subscriptions added"
        );
    }

    fn remove_subscriptions(
        &mut self,
        context: &BrokerContextKey,
        consumer: &Uri,
        subscription_ids: &[String],
    ) -> usize {
        let removed = self
            .store
            .get_mut(context)
            .map(|registries| {
                registries
                    .consumers
                    .remove_subscriptions(consumer, subscription_ids)
            })
            .unwrap_or(0);
        self.store.collect_if_empty(context);

        debug!(
            event = events::CONSUMER_DEREGISTERED,
            component = COMPONENT,
            context = %fields::format_context(context),
            consumer = %consumer,
            subscription_ids = %fields::format_subscription_ids(subscription_ids.iter().map(String::as_str)),
            removed,
            "consumer subscriptions removed"
        );
        removed
    }

    fn match_batch(
        &self,
        context: &BrokerContextKey,
        declared_keys: &[KeyDeclaration],
        updates: &[Update],
    ) -> MatchPlan {
        self.store
            .get(context)
            .map(|registries| {
                registries
                    .consumers
                    .match_batch(updates, declared_keys, self.strictness)
            })
            .unwrap_or_default()
    }

    fn provider_qos_level(&self, context: &BrokerContextKey, provider: &ProviderIdentity) -> QosLevel {
        self.store
            .get(context)
            .and_then(|registries| registries.providers.get(provider))
            .map(|registration| registration.qos)
            .unwrap_or_default()
    }

    fn remove_consumer(&mut self, consumer: &Uri) -> usize {
        let touched = self
            .store
            .iter_mut()
            .map(|(_, registries)| registries.consumers.remove_consumer(consumer))
            .filter(|removed| *removed)
            .count();
        self.store.collect_all_empty();

        debug!(
            event = events::CONSUMER_REMOVED,
            component = COMPONENT,
            consumer = %consumer,
            contexts = touched,
            "consumer removed from all contexts"
        );
        touched
    }

    fn context_count(&self) -> usize {
        self.store.len()
    }

    fn provider_count(&self, context: &BrokerContextKey) -> usize {
        self.store
            .get(context)
            .map_or(0, |registries| registries.providers.len())
    }

    fn consumer_count(&self, context: &BrokerContextKey) -> usize {
        self.store
            .get(context)
            .map_or(0, |registries| registries.consumers.len())
    }

    fn subscription_ids(&self, context: &BrokerContextKey, consumer: &Uri) -> Vec<String> {
        self.store
            .get(context)
            .and_then(|registries| registries.consumers.get(consumer))
            .map(|registration| registration.subscription_ids().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
