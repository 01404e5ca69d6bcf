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

use crate::binding::BrokerBinding;
use crate::config::BrokerConfig;
use crate::control_plane::context_key::{BrokerContextKey, ProviderIdentity};
use crate::control_plane::handler::{BrokerHandler, DefaultBrokerHandler};
use crate::data_plane::binding_directory::BindingDirectory;
use crate::data_plane::consumer_routes::ConsumerRoutes;
use crate::data_plane::transport::MalTransport;
use crate::error::{BrokerError, MalError, MalErrorCode};
use crate::message::{KeyDeclaration, MessageHeader, QosLevel, Subscription, Update, Uri};
use crate::observability::{events, fields};
use crate::routing::notify_set::{build_notify_sets, DeliveryContext, NotifyMessageSet};
use futures::future::join_all;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const COMPONENT: &str = "broker";

/// Per-consumer result of one PUBLISH fan-out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// NOTIFY messages handed to the transport successfully.
    pub notified: usize,
    /// Notify sets dropped because no open binding reaches the consumer.
    pub skipped_unknown: usize,
    /// Notify sets whose send failed.
    pub failed: usize,
}

/// Registration state guarded by one lock: the handler and the binding each
/// consumer registration arrived on.
struct Registry {
    handler: Box<dyn BrokerHandler>,
    routes: ConsumerRoutes,
}

/// Publish/subscribe broker core.
///
/// Registration mutation and matching run in one critical section over the
/// registry. NOTIFY sends happen after that section is released.
pub struct Broker {
    name: String,
    instance_id: Uuid,
    config: BrokerConfig,
    registry: Mutex<Registry>,
    bindings: BindingDirectory,
    closed: AtomicBool,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        let handler = DefaultBrokerHandler::new(config.key_match);
        Self::with_handler(config, Box::new(handler))
    }

    /// Builds a broker around a custom registration strategy.
    pub fn with_handler(config: BrokerConfig, handler: Box<dyn BrokerHandler>) -> Self {
        let instance_id = Uuid::new_v4();
        let name = config.name.clone();
        debug!(
            event = events::BROKER_CREATED,
            component = COMPONENT,
            broker = %name,
            instance_id = %instance_id,
            key_match = ?config.key_match,
            "broker created"
        );
        Self {
            name,
            instance_id,
            config,
            registry: Mutex::new(Registry {
                handler,
                routes: ConsumerRoutes::default(),
            }),
            bindings: BindingDirectory::default(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Binds a local broker address to a transport.
    pub async fn create_binding(
        &self,
        uri: Uri,
        transport: Arc<dyn MalTransport>,
    ) -> Result<Arc<BrokerBinding>, BrokerError> {
        self.ensure_open()?;
        let binding = Arc::new(BrokerBinding::new(uri, transport));
        self.bindings.insert(binding.clone()).await?;
        Ok(binding)
    }

    pub async fn binding(&self, uri: &Uri) -> Option<Arc<BrokerBinding>> {
        self.bindings.get(uri).await
    }

    /// Adds or replaces the sender's subscriptions in the header context and
    /// routes that context's NOTIFYs for the sender through `binding`.
    pub async fn handle_register(
        &self,
        binding: &BrokerBinding,
        header: &MessageHeader,
        subscriptions: Vec<Subscription>,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        if binding.is_closed() {
            return Err(BrokerError::BindingClosed(binding.uri().clone()));
        }
        let context = header.context_key();
        let consumer = &header.from;

        let mut registry = self.registry.lock().await;
        registry
            .handler
            .add_subscriptions(&context, consumer, subscriptions);
        // Membership changes with the registry so a concurrent publish never
        // sees a subscription without a route back to its consumer.
        if registry.handler.subscription_ids(&context, consumer).is_empty() {
            if let Some(previous) = registry.routes.unbind(&context, consumer) {
                self.release_binding(&registry.routes, consumer, &previous)
                    .await;
            }
        } else {
            binding.add_subscriber(consumer);
            if let Some(previous) = registry.routes.bind(&context, consumer, binding.uri()) {
                self.release_binding(&registry.routes, consumer, &previous)
                    .await;
            }
        }
        Ok(())
    }

    /// Removes the named subscriptions. The consumer leaves a binding once no
    /// registration of it routes through that binding.
    pub async fn handle_deregister(
        &self,
        header: &MessageHeader,
        subscription_ids: &[String],
    ) -> Result<usize, BrokerError> {
        self.ensure_open()?;
        let context = header.context_key();
        let consumer = &header.from;

        let mut registry = self.registry.lock().await;
        let removed = registry
            .handler
            .remove_subscriptions(&context, consumer, subscription_ids);
        if registry.handler.subscription_ids(&context, consumer).is_empty() {
            if let Some(previous) = registry.routes.unbind(&context, consumer) {
                self.release_binding(&registry.routes, consumer, &previous)
                    .await;
            }
        }
        Ok(removed)
    }

    pub async fn handle_publish_register(
        &self,
        header: &MessageHeader,
        declared_keys: Vec<KeyDeclaration>,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let context = header.context_key();
        let provider = ProviderIdentity::new(header.from.clone(), &context);

        self.registry
            .lock()
            .await
            .handler
            .register_provider(&context, &provider, header.qos, declared_keys);
        Ok(())
    }

    /// Returns `true` when a registration was removed.
    pub async fn handle_publish_deregister(
        &self,
        header: &MessageHeader,
    ) -> Result<bool, BrokerError> {
        self.ensure_open()?;
        let context = header.context_key();
        let provider = ProviderIdentity::new(header.from.clone(), &context);

        Ok(self
            .registry
            .lock()
            .await
            .handler
            .deregister_provider(&context, &provider))
    }

    /// Validates, matches and fans out one PUBLISH.
    ///
    /// A rejected publish changes no state and produces no NOTIFY. A consumer
    /// without an open route back to it, or whose send fails, does not affect
    /// the delivery to the others.
    pub async fn handle_publish(
        &self,
        header: &MessageHeader,
        updates: Vec<Update>,
    ) -> Result<PublishOutcome, BrokerError> {
        self.ensure_open()?;
        let context = header.context_key();
        let provider = ProviderIdentity::new(header.from.clone(), &context);

        let delivery = DeliveryContext::from_header(header);
        let sets = {
            let registry = self.registry.lock().await;
            let handler = &registry.handler;
            let registration = match handler.validate_publish(&context, &provider, &updates) {
                Ok(registration) => registration,
                Err(err) => {
                    warn!(
                        event = events::PUBLISH_REJECTED,
                        component = COMPONENT,
                        broker = %self.name,
                        context = %fields::format_context(&context),
                        provider = %provider,
                        err = %err,
                        "publish rejected"
                    );
                    return Err(err);
                }
            };
            let plan = handler.match_batch(&context, &registration.declared_keys, &updates);
            build_notify_sets(plan, &delivery)
                .into_iter()
                .map(|set| (registry.routes.route(&context, &set.consumer).cloned(), set))
                .collect::<Vec<_>>()
        };
        debug!(
            event = events::PUBLISH_MATCHED,
            component = COMPONENT,
            broker = %self.name,
            context = %fields::format_context(&context),
            provider = %provider,
            update_count = updates.len(),
            notify_sets = sets.len(),
            transaction_id = header.transaction_id,
            "publish matched"
        );

        let mut outcome = PublishOutcome::default();
        let mut routed = Vec::with_capacity(sets.len());
        for (route, set) in sets {
            let owner = match &route {
                Some(binding) => self.bindings.resolve_route(binding, &set.consumer).await,
                None => None,
            };
            match owner {
                Some(owner) => routed.push((owner, set)),
                None => {
                    let err = BrokerError::UnknownDestination(set.consumer.clone());
                    warn!(
                        event = events::NOTIFY_SKIPPED_UNKNOWN_DESTINATION,
                        component = COMPONENT,
                        broker = %self.name,
                        binding = ?route,
                        subscription_id = %set.subscription_id,
                        err = %err,
                        "no binding reaches consumer, skipping"
                    );
                    outcome.skipped_unknown += 1;
                }
            }
        }

        let notify_error = self.config.notify_error_on_delivery_failure;
        let results = join_all(
            routed
                .into_iter()
                .map(|(owner, set)| deliver(owner, set, notify_error)),
        )
        .await;
        for delivered in results {
            if delivered {
                outcome.notified += 1;
            } else {
                outcome.failed += 1;
            }
        }
        Ok(outcome)
    }

    /// QoS the provider registered with in `context`, `BestEffort` when unknown.
    pub async fn provider_qos_level(&self, context: &BrokerContextKey, provider: &Uri) -> QosLevel {
        let identity = ProviderIdentity::new(provider.clone(), context);
        self.registry
            .lock()
            .await
            .handler
            .provider_qos_level(context, &identity)
    }

    /// Drops the consumer's registrations in every context and detaches it
    /// from every binding. Returns how many contexts held it.
    pub async fn remove_consumer(&self, consumer: &Uri) -> usize {
        let mut registry = self.registry.lock().await;
        let contexts = registry.handler.remove_consumer(consumer);
        for binding in registry.routes.remove_consumer(consumer) {
            self.bindings.detach(&binding, consumer).await;
        }
        contexts
    }

    /// Closes every binding. Later sends and registrations fail.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let closed = self.bindings.close_all().await;
        info!(
            event = events::BROKER_CLOSED,
            component = COMPONENT,
            broker = %self.name,
            instance_id = %self.instance_id,
            bindings = closed,
            "broker closed"
        );
    }

    pub async fn context_count(&self) -> usize {
        self.registry.lock().await.handler.context_count()
    }

    pub async fn provider_count(&self, context: &BrokerContextKey) -> usize {
        self.registry.lock().await.handler.provider_count(context)
    }

    pub async fn consumer_count(&self, context: &BrokerContextKey) -> usize {
        self.registry.lock().await.handler.consumer_count(context)
    }

    pub async fn subscription_ids(&self, context: &BrokerContextKey, consumer: &Uri) -> Vec<String> {
        self.registry
            .lock()
            .await
            .handler
            .subscription_ids(context, consumer)
    }

    pub async fn binding_count(&self) -> usize {
        self.bindings.len().await
    }

    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.is_closed() {
            return Err(BrokerError::BrokerClosed(self.name.clone()));
        }
        Ok(())
    }

    /// Detaches `consumer` from `binding` unless another of its routes still
    /// uses it.
    async fn release_binding(&self, routes: &ConsumerRoutes, consumer: &Uri, binding: &Uri) {
        if !routes.routes_through(consumer, binding) {
            self.bindings.detach(binding, consumer).await;
        }
    }
}

/// Sends one notify set. Returns `true` if the NOTIFY went out.
async fn deliver(owner: Arc<BrokerBinding>, set: NotifyMessageSet, notify_error: bool) -> bool {
    let NotifyMessageSet {
        consumer,
        subscription_id,
        delivery,
        updates,
    } = set;

    let Err(err) = owner
        .send_notify(&consumer, &delivery, &subscription_id, updates)
        .await
    else {
        return true;
    };

    error!(
        event = events::NOTIFY_FAILED,
        component = COMPONENT,
        binding = %owner.uri(),
        consumer = %consumer,
        subscription_id = %subscription_id,
        err = %err,
        "notify delivery failed"
    );

    if notify_error && !matches!(err, BrokerError::BindingClosed(_)) {
        let report = MalError::new(MalErrorCode::DeliveryFailed, err.to_string());
        if let Err(report_err) = owner.send_notify_error(&consumer, &delivery, report).await {
            warn!(
                event = events::NOTIFY_FAILED,
                component = COMPONENT,
                binding = %owner.uri(),
                consumer = %consumer,
                err = %report_err,
                "notify error could not be delivered"
            );
        }
    }
    false
}

impl Debug for Broker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("name", &self.name)
            .field("instance_id", &self.instance_id)
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::message::{
        Attribute, InteractionStage, InteractionType, MalMessage, MessageBody, OperationIdentity,
        SessionType, UpdateHeader, UpdateValue,
    };
    use crate::routing::subscription_filter::{KeyFilter, SubscriptionFilter};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::SystemTime;

    #[derive(Default)]
    struct RecordingTransport {
        sent: std::sync::Mutex<Vec<MalMessage>>,
        unreachable: HashSet<Uri>,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<MalMessage> {
            self.sent.lock().expect("transport mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl MalTransport for RecordingTransport {
        async fn send(&self, message: MalMessage) -> Result<(), TransportError> {
            if self.unreachable.contains(&message.header.to) {
                return Err(TransportError::Unreachable(message.header.to));
            }
            self.sent
                .lock()
                .expect("transport mutex poisoned")
                .push(message);
            Ok(())
        }
    }

    fn header(from: &str, stage: InteractionStage) -> MessageHeader {
        MessageHeader {
            from: Uri::from(from),
            to: Uri::from("maltcp://broker"),
            authentication_id: vec![],
            timestamp: SystemTime::now(),
            qos: QosLevel::Assured,
            priority: 1,
            domain: vec!["esa".to_string(), "mission".to_string()],
            network_zone: "GROUND".to_string(),
            session: SessionType::Live,
            session_name: "LIVE".to_string(),
            interaction_type: InteractionType::PubSub,
            stage,
            transaction_id: 10,
            operation: OperationIdentity::new(2, 1, 1, 1),
            is_error: false,
        }
    }

    fn update(value: i32) -> Update {
        Update::new(
            UpdateHeader {
                source: "P".to_string(),
                domain: vec!["esa".to_string(), "mission".to_string()],
                key_values: vec![Some(Attribute::Integer(value))],
            },
            vec![UpdateValue::Decoded(Attribute::Integer(value))],
        )
    }

    fn k1_is(value: i32) -> Vec<Subscription> {
        vec![Subscription::new(
            "SUB1",
            SubscriptionFilter::new(vec![KeyFilter::any_of("K1", vec![Attribute::Integer(value)])]),
        )]
    }

    #[tokio::test]
    async fn unregistered_publish_is_rejected_without_side_effects() {
        let broker = Broker::new(BrokerConfig::default());
        let transport = Arc::new(RecordingTransport::default());
        let binding = broker
            .create_binding(Uri::from("maltcp://broker"), transport.clone())
            .await
            .expect("binding");

        broker
            .handle_register(&binding, &header("C1", InteractionStage::Register), k1_is(5))
            .await
            .expect("register");

        let result = broker
            .handle_publish(&header("P", InteractionStage::Publish), vec![update(5)])
            .await;
        assert!(matches!(result, Err(BrokerError::IncorrectState { .. })));
        assert!(transport.sent().is_empty());
        assert_eq!(broker.context_count().await, 1);
    }

    #[tokio::test]
    async fn failed_delivery_does_not_stop_other_consumers() {
        let broker = Broker::new(BrokerConfig {
            notify_error_on_delivery_failure: true,
            ..BrokerConfig::default()
        });
        let transport = Arc::new(RecordingTransport {
            unreachable: HashSet::from([Uri::from("C1")]),
            ..Default::default()
        });
        let binding = broker
            .create_binding(Uri::from("maltcp://broker"), transport.clone())
            .await
            .expect("binding");

        for consumer in ["C1", "C2"] {
            broker
                .handle_register(&binding, &header(consumer, InteractionStage::Register), k1_is(5))
                .await
                .expect("register");
        }
        broker
            .handle_publish_register(&header("P", InteractionStage::PublishRegister), vec![])
            .await
            .expect("publish register");

        let outcome = broker
            .handle_publish(&header("P", InteractionStage::Publish), vec![update(5)])
            .await
            .expect("publish");

        assert_eq!(
            outcome,
            PublishOutcome {
                notified: 1,
                skipped_unknown: 0,
                failed: 1
            }
        );
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header.to, Uri::from("C2"));
        assert!(matches!(sent[0].body, MessageBody::Notify { .. }));
    }

    #[tokio::test]
    async fn closed_broker_rejects_everything() {
        let broker = Broker::new(BrokerConfig::default());
        let binding = broker
            .create_binding(
                Uri::from("maltcp://broker"),
                Arc::new(RecordingTransport::default()),
            )
            .await
            .expect("binding");

        broker.close().await;
        assert!(binding.is_closed());
        assert!(matches!(
            broker
                .handle_publish_register(&header("P", InteractionStage::PublishRegister), vec![])
                .await,
            Err(BrokerError::BrokerClosed(name)) if name == broker.name()
        ));
        assert!(broker
            .create_binding(
                Uri::from("maltcp://other"),
                Arc::new(RecordingTransport::default())
            )
            .await
            .is_err());
    }
}
