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

//! Transport-facing endpoint of the broker.

use crate::data_plane::transport::MalTransport;
use crate::error::{BrokerError, MalError};
use crate::message::{
    InteractionStage, InteractionType, MalMessage, MessageBody, MessageHeader, Update, Uri,
};
use crate::observability::events;
use crate::routing::notify_set::DeliveryContext;
use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

const COMPONENT: &str = "broker_binding";

const STATE_BOUND: u8 = 1;
const STATE_CLOSED: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    Bound,
    Closed,
}

/// One local broker address bound to one transport.
///
/// Holds the set of consumers reachable through it. The set is swapped
/// copy-on-write so the delivery path reads it without locking.
pub struct BrokerBinding {
    uri: Uri,
    transport: Arc<dyn MalTransport>,
    authentication_id: Vec<u8>,
    subscribers: ArcSwap<HashSet<Uri>>,
    state: AtomicU8,
}

impl BrokerBinding {
    pub fn new(uri: Uri, transport: Arc<dyn MalTransport>) -> Self {
        Self::with_authentication_id(uri, transport, Vec::new())
    }

    pub fn with_authentication_id(
        uri: Uri,
        transport: Arc<dyn MalTransport>,
        authentication_id: Vec<u8>,
    ) -> Self {
        info!(
            event = events::BINDING_CREATED,
            component = COMPONENT,
            binding = %uri,
            "broker binding bound"
        );
        Self {
            uri,
            transport,
            authentication_id,
            subscribers: ArcSwap::from_pointee(HashSet::new()),
            state: AtomicU8::new(STATE_BOUND),
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn state(&self) -> BindingState {
        match self.state.load(Ordering::Acquire) {
            STATE_CLOSED => BindingState::Closed,
            _ => BindingState::Bound,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == BindingState::Closed
    }

    /// Moves the binding to `Closed`. Returns `false` if it already was.
    pub fn close(&self) -> bool {
        let was_open = self.state.swap(STATE_CLOSED, Ordering::AcqRel) != STATE_CLOSED;
        if was_open {
            self.subscribers.store(Arc::new(HashSet::new()));
            info!(
                event = events::BINDING_CLOSED,
                component = COMPONENT,
                binding = %self.uri,
                "broker binding closed"
            );
        }
        was_open
    }

    pub fn add_subscriber(&self, consumer: &Uri) {
        if self.has_subscriber(consumer) {
            return;
        }
        self.subscribers.rcu(|current| {
            let mut next = HashSet::clone(current);
            next.insert(consumer.clone());
            next
        });
    }

    pub fn remove_subscriber(&self, consumer: &Uri) -> bool {
        if !self.has_subscriber(consumer) {
            return false;
        }
        self.subscribers.rcu(|current| {
            let mut next = HashSet::clone(current);
            next.remove(consumer);
            next
        });
        true
    }

    pub fn has_subscriber(&self, consumer: &Uri) -> bool {
        self.subscribers.load().contains(consumer)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load().len()
    }

    /// Sends one NOTIFY carrying the updates matched for `subscription_id`.
    pub async fn send_notify(
        &self,
        destination: &Uri,
        delivery: &DeliveryContext,
        subscription_id: &str,
        updates: Vec<Update>,
    ) -> Result<(), BrokerError> {
        let header = self.outbound_header(destination, delivery, InteractionStage::Notify, false);
        let update_count = updates.len();
        self.send(MalMessage::new(
            header,
            MessageBody::Notify {
                subscription_id: subscription_id.to_string(),
                updates,
            },
        ))
        .await?;

        debug!(
            event = events::NOTIFY_SENT,
            component = COMPONENT,
            binding = %self.uri,
            consumer = %destination,
            subscription_id,
            update_count,
            transaction_id = delivery.transaction_id,
            "notify sent"
        );
        Ok(())
    }

    pub async fn send_notify_error(
        &self,
        destination: &Uri,
        delivery: &DeliveryContext,
        error: MalError,
    ) -> Result<(), BrokerError> {
        let header =
            self.outbound_header(destination, delivery, InteractionStage::NotifyError, true);
        let code = error.code;
        self.send(MalMessage::new(header, MessageBody::Error(error)))
            .await?;

        debug!(
            event = events::NOTIFY_ERROR_SENT,
            component = COMPONENT,
            binding = %self.uri,
            consumer = %destination,
            code = ?code,
            "notify error sent"
        );
        Ok(())
    }

    pub async fn send_publish_error(
        &self,
        publisher: &Uri,
        delivery: &DeliveryContext,
        error: MalError,
    ) -> Result<(), BrokerError> {
        let header =
            self.outbound_header(publisher, delivery, InteractionStage::PublishError, true);
        let code = error.code;
        self.send(MalMessage::new(header, MessageBody::Error(error)))
            .await?;

        debug!(
            event = events::PUBLISH_ERROR_SENT,
            component = COMPONENT,
            binding = %self.uri,
            publisher = %publisher,
            code = ?code,
            "publish error sent"
        );
        Ok(())
    }

    /// Answers `request` with the given stage, echoing its correlation fields.
    pub async fn send_reply(
        &self,
        request: &MessageHeader,
        stage: InteractionStage,
        body: MessageBody,
    ) -> Result<(), BrokerError> {
        let is_error = matches!(body, MessageBody::Error(_));
        let mut header = request.reply(stage, is_error);
        header.from = self.uri.clone();
        header.authentication_id = self.authentication_id.clone();
        self.send(MalMessage::new(header, body)).await
    }

    fn outbound_header(
        &self,
        destination: &Uri,
        delivery: &DeliveryContext,
        stage: InteractionStage,
        is_error: bool,
    ) -> MessageHeader {
        let context = &delivery.context;
        MessageHeader {
            from: self.uri.clone(),
            to: destination.clone(),
            authentication_id: self.authentication_id.clone(),
            timestamp: SystemTime::now(),
            qos: delivery.qos,
            priority: delivery.priority,
            domain: context.domain.clone(),
            network_zone: context.network_zone.clone(),
            session: context.session,
            session_name: context.session_name.clone(),
            interaction_type: InteractionType::PubSub,
            stage,
            transaction_id: delivery.transaction_id,
            operation: delivery.operation,
            is_error,
        }
    }

    async fn send(&self, message: MalMessage) -> Result<(), BrokerError> {
        let destination = message.header.to.clone();
        if self.is_closed() {
            warn!(
                event = events::BINDING_SEND_REJECTED,
                component = COMPONENT,
                binding = %self.uri,
                destination = %destination,
                stage = ?message.header.stage,
                "send on closed binding rejected"
            );
            return Err(BrokerError::BindingClosed(self.uri.clone()));
        }

        self.transport
            .send(message)
            .await
            .map_err(|source| BrokerError::Delivery {
                destination,
                source,
            })
    }
}

impl Debug for BrokerBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerBinding")
            .field("uri", &self.uri)
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
