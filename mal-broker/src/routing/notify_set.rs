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

//! Transient per-publish notification sets.

use crate::control_plane::context_key::BrokerContextKey;
use crate::message::{
    MessageHeader, OperationIdentity, QosLevel, Update, UpdateHeader, UpdateValue, Uri,
};
use std::collections::BTreeMap;

/// Updates one subscription of one consumer matched, in publish order.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionMatch {
    pub subscription_id: String,
    pub updates: Vec<Update>,
}

/// Result of matching one batch: consumer address to its non-empty matches.
pub type MatchPlan = BTreeMap<Uri, Vec<SubscriptionMatch>>;

/// Envelope fields a NOTIFY inherits from the PUBLISH that triggered it.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryContext {
    pub operation: OperationIdentity,
    pub transaction_id: u64,
    pub context: BrokerContextKey,
    pub qos: QosLevel,
    pub priority: u32,
}

impl DeliveryContext {
    pub fn from_header(header: &MessageHeader) -> Self {
        Self {
            operation: header.operation,
            transaction_id: header.transaction_id,
            context: header.context_key(),
            qos: header.qos,
            priority: header.priority,
        }
    }
}

/// Everything needed to send one NOTIFY to one consumer for one subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct NotifyMessageSet {
    pub consumer: Uri,
    pub subscription_id: String,
    pub delivery: DeliveryContext,
    pub updates: Vec<Update>,
}

impl NotifyMessageSet {
    pub fn headers(&self) -> impl Iterator<Item = &UpdateHeader> {
        self.updates.iter().map(|update| &update.header)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &[UpdateValue]> {
        self.updates.iter().map(|update| update.body.as_slice())
    }
}

/// Expands a match plan into one notify set per (consumer, subscription).
pub(crate) fn build_notify_sets(plan: MatchPlan, delivery: &DeliveryContext) -> Vec<NotifyMessageSet> {
    plan.into_iter()
        .flat_map(|(consumer, matches)| {
            matches.into_iter().map(move |subscription_match| NotifyMessageSet {
                consumer: consumer.clone(),
                subscription_id: subscription_match.subscription_id,
                delivery: delivery.clone(),
                updates: subscription_match.updates,
            })
        })
        .filter(|set| !set.updates.is_empty())
        .collect()
}
