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

//! Message header fields populated by the transport/header layer.

use crate::control_plane::context_key::BrokerContextKey;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// Address of a provider, consumer or broker endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uri(String);

impl Uri {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uri {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Uri {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Declared delivery-guarantee class of a message or registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QosLevel {
    #[default]
    BestEffort,
    Assured,
    Queued,
    Timely,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionType {
    Live,
    Simulation,
    Replay,
}

impl Display for SessionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionType::Live => "LIVE",
            SessionType::Simulation => "SIMULATION",
            SessionType::Replay => "REPLAY",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionType {
    Send,
    Submit,
    Request,
    Invoke,
    Progress,
    PubSub,
}

/// Phase of an interaction. Only the publish/subscribe stages are listed;
/// the other interaction patterns never reach the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InteractionStage {
    Register,
    RegisterAck,
    RegisterError,
    PublishRegister,
    PublishRegisterAck,
    PublishRegisterError,
    Publish,
    PublishError,
    Notify,
    NotifyError,
    Deregister,
    DeregisterAck,
    PublishDeregister,
    PublishDeregisterAck,
}

impl InteractionStage {
    /// Returns `true` for the stages a provider or consumer sends to the broker.
    pub fn is_broker_inbound(self) -> bool {
        matches!(
            self,
            InteractionStage::Register
                | InteractionStage::PublishRegister
                | InteractionStage::Publish
                | InteractionStage::Deregister
                | InteractionStage::PublishDeregister
        )
    }
}

/// Service operation a message belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct OperationIdentity {
    pub area: u16,
    pub service: u16,
    pub operation: u16,
    pub area_version: u8,
}

impl OperationIdentity {
    pub fn new(area: u16, service: u16, operation: u16, area_version: u8) -> Self {
        Self {
            area,
            service,
            operation,
            area_version,
        }
    }
}

impl Display for OperationIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}v{}",
            self.area, self.service, self.operation, self.area_version
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageHeader {
    pub from: Uri,
    pub to: Uri,
    pub authentication_id: Vec<u8>,
    pub timestamp: SystemTime,
    pub qos: QosLevel,
    pub priority: u32,
    pub domain: Vec<String>,
    pub network_zone: String,
    pub session: SessionType,
    pub session_name: String,
    pub interaction_type: InteractionType,
    pub stage: InteractionStage,
    pub transaction_id: u64,
    pub operation: OperationIdentity,
    pub is_error: bool,
}

impl MessageHeader {
    /// Broker context this message is routed in.
    pub fn context_key(&self) -> BrokerContextKey {
        BrokerContextKey::new(
            self.domain.clone(),
            &self.network_zone,
            self.session,
            &self.session_name,
        )
    }

    /// Builds the header of a reply to this message, sent back to its source.
    pub fn reply(&self, stage: InteractionStage, is_error: bool) -> MessageHeader {
        MessageHeader {
            from: self.to.clone(),
            to: self.from.clone(),
            authentication_id: Vec::new(),
            timestamp: SystemTime::now(),
            stage,
            is_error,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_header() -> MessageHeader {
        MessageHeader {
            from: Uri::from("maltcp://consumer"),
            to: Uri::from("maltcp://broker"),
            authentication_id: vec![1, 2, 3],
            timestamp: SystemTime::UNIX_EPOCH,
            qos: QosLevel::Assured,
            priority: 4,
            domain: vec!["esa".to_string(), "mission".to_string()],
            network_zone: "GROUND".to_string(),
            session: SessionType::Live,
            session_name: "LIVE".to_string(),
            interaction_type: InteractionType::PubSub,
            stage: InteractionStage::Register,
            transaction_id: 42,
            operation: OperationIdentity::new(2, 1, 1, 1),
            is_error: false,
        }
    }

    #[test]
    fn reply_swaps_addresses_and_keeps_correlation() {
        let request = register_header();
        let reply = request.reply(InteractionStage::RegisterAck, false);

        assert_eq!(reply.from, request.to);
        assert_eq!(reply.to, request.from);
        assert_eq!(reply.transaction_id, 42);
        assert_eq!(reply.operation, request.operation);
        assert_eq!(reply.stage, InteractionStage::RegisterAck);
        assert!(reply.authentication_id.is_empty());
        assert_eq!(reply.context_key(), request.context_key());
    }

    #[test]
    fn only_request_stages_are_broker_inbound() {
        assert!(InteractionStage::Register.is_broker_inbound());
        assert!(InteractionStage::PublishDeregister.is_broker_inbound());
        assert!(!InteractionStage::Notify.is_broker_inbound());
        assert!(!InteractionStage::RegisterAck.is_broker_inbound());
        assert!(!InteractionStage::PublishError.is_broker_inbound());
    }
}
