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

//! Shared fixtures for `mal-broker` integration tests: a recording transport
//! with injectable failures, message builders and one-time log setup.

use async_trait::async_trait;
use mal_broker::{
    Attribute, BrokerContextKey, InteractionStage, InteractionType, KeyDeclaration, MalMessage,
    MalTransport, MessageBody, MessageHeader, OperationIdentity, QosLevel, SessionType,
    Subscription, TransportError, Update, UpdateHeader, UpdateValue, Uri,
};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, Once};
use std::time::SystemTime;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub const BROKER_URI: &str = "maltcp://broker";
pub const PROVIDER_URI: &str = "maltcp://provider";

static LOGGING: Once = Once::new();

/// Installs a fmt subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Transport that records every message handed to it. Destinations marked
/// unreachable fail with [`TransportError::Unreachable`] instead.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<MalMessage>>,
    unreachable: Mutex<HashSet<Uri>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_destination(&self, destination: &Uri) {
        lock(&self.unreachable).insert(destination.clone());
    }

    pub fn restore_destination(&self, destination: &Uri) {
        lock(&self.unreachable).remove(destination);
    }

    pub fn sent(&self) -> Vec<MalMessage> {
        lock(&self.sent).clone()
    }

    /// Drains the recorded messages.
    pub fn take(&self) -> Vec<MalMessage> {
        std::mem::take(&mut *lock(&self.sent))
    }

    pub fn sent_to(&self, destination: &Uri) -> Vec<MalMessage> {
        lock(&self.sent)
            .iter()
            .filter(|message| &message.header.to == destination)
            .cloned()
            .collect()
    }

    /// NOTIFY bodies delivered to `destination`, as (subscription id, updates).
    pub fn notifies_to(&self, destination: &Uri) -> Vec<(String, Vec<Update>)> {
        self.sent_to(destination)
            .into_iter()
            .filter_map(|message| match message.body {
                MessageBody::Notify {
                    subscription_id,
                    updates,
                } => Some((subscription_id, updates)),
                _ => None,
            })
            .collect()
    }

    pub fn count_stage(&self, stage: InteractionStage) -> usize {
        lock(&self.sent)
            .iter()
            .filter(|message| message.header.stage == stage)
            .count()
    }
}

#[async_trait]
impl MalTransport for RecordingTransport {
    async fn send(&self, message: MalMessage) -> Result<(), TransportError> {
        if lock(&self.unreachable).contains(&message.header.to) {
            debug!(destination = %message.header.to, "recording transport refusing send");
            return Err(TransportError::Unreachable(message.header.to));
        }
        lock(&self.sent).push(message);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `{["esa","mission"], "GROUND", LIVE, "LIVE"}`.
pub fn mission_context() -> BrokerContextKey {
    context(SessionType::Live, "LIVE")
}

pub fn context(session: SessionType, session_name: &str) -> BrokerContextKey {
    BrokerContextKey::new(
        vec!["esa".to_string(), "mission".to_string()],
        "GROUND",
        session,
        session_name,
    )
}

pub fn header(from: &str, context: &BrokerContextKey, stage: InteractionStage) -> MessageHeader {
    MessageHeader {
        from: Uri::from(from),
        to: Uri::from(BROKER_URI),
        authentication_id: vec![],
        timestamp: SystemTime::now(),
        qos: QosLevel::Assured,
        priority: 1,
        domain: context.domain.clone(),
        network_zone: context.network_zone.clone(),
        session: context.session,
        session_name: context.session_name.clone(),
        interaction_type: InteractionType::PubSub,
        stage,
        transaction_id: 1,
        operation: OperationIdentity::new(2, 1, 1, 1),
        is_error: false,
    }
}

pub fn register(from: &str, context: &BrokerContextKey, subscriptions: Vec<Subscription>) -> MalMessage {
    MalMessage::new(
        header(from, context, InteractionStage::Register),
        MessageBody::Register(subscriptions),
    )
}

pub fn deregister(from: &str, context: &BrokerContextKey, subscription_ids: &[&str]) -> MalMessage {
    MalMessage::new(
        header(from, context, InteractionStage::Deregister),
        MessageBody::Deregister(subscription_ids.iter().map(|id| id.to_string()).collect()),
    )
}

pub fn publish_register(
    from: &str,
    context: &BrokerContextKey,
    declared_keys: Vec<KeyDeclaration>,
) -> MalMessage {
    MalMessage::new(
        header(from, context, InteractionStage::PublishRegister),
        MessageBody::PublishRegister(declared_keys),
    )
}

pub fn publish_deregister(from: &str, context: &BrokerContextKey) -> MalMessage {
    MalMessage::new(
        header(from, context, InteractionStage::PublishDeregister),
        MessageBody::Empty,
    )
}

pub fn publish(
    from: &str,
    context: &BrokerContextKey,
    transaction_id: u64,
    updates: Vec<Update>,
) -> MalMessage {
    let mut header = header(from, context, InteractionStage::Publish);
    header.transaction_id = transaction_id;
    MalMessage::new(header, MessageBody::Publish(updates))
}

/// Update with a single integer key and a string body.
pub fn int_update(key: i32, body: &str) -> Update {
    Update::new(
        UpdateHeader {
            source: "provider".to_string(),
            domain: vec!["esa".to_string(), "mission".to_string()],
            key_values: vec![Some(Attribute::Integer(key))],
        },
        vec![UpdateValue::Decoded(Attribute::String(body.to_string()))],
    )
}
