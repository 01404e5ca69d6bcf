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

//! Field formatters used in structured log events.

use crate::control_plane::context_key::BrokerContextKey;
use crate::message::{MalMessage, MessageBody};

const NONE: &str = "none";

pub fn format_context(context: &BrokerContextKey) -> String {
    context.to_string()
}

pub fn format_stage(message: &MalMessage) -> String {
    if message.header.is_error {
        format!("{:?}(error)", message.header.stage)
    } else {
        format!("{:?}", message.header.stage)
    }
}

pub fn format_source(message: &MalMessage) -> String {
    message.header.from.to_string()
}

pub fn format_destination(message: &MalMessage) -> String {
    message.header.to.to_string()
}

pub fn body_len(message: &MalMessage) -> usize {
    match &message.body {
        MessageBody::Empty | MessageBody::Error(_) => 0,
        MessageBody::Register(subscriptions) => subscriptions.len(),
        MessageBody::PublishRegister(keys) => keys.len(),
        MessageBody::Publish(updates) => updates.len(),
        MessageBody::Deregister(ids) => ids.len(),
        MessageBody::Notify { updates, .. } => updates.len(),
    }
}

pub fn format_subscription_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let joined = ids.into_iter().collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        NONE.to_string()
    } else {
        joined
    }
}
