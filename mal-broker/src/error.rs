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

//! Broker errors and the protocol error payload carried by `*_ERROR` replies.

use crate::message::{InteractionStage, InteractionType, Uri};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Standard MAL error numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MalErrorCode {
    DeliveryFailed = 65536,
    DeliveryTimedout = 65537,
    DeliveryDelayed = 65538,
    DestinationUnknown = 65539,
    DestinationTransient = 65540,
    DestinationLost = 65541,
    AuthenticationFail = 65542,
    AuthorisationFail = 65543,
    EncryptionFail = 65544,
    UnsupportedArea = 65545,
    UnsupportedAreaVersion = 65546,
    UnsupportedService = 65547,
    UnsupportedOperation = 65548,
    BadEncoding = 65549,
    Internal = 65550,
    Unknown = 65551,
    IncorrectState = 65552,
    TooMany = 65553,
    Shutdown = 65554,
}

impl MalErrorCode {
    pub fn value(self) -> u32 {
        self as u32
    }
}

/// Error payload of NOTIFY_ERROR, PUBLISH_ERROR and the registration error stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalError {
    pub code: MalErrorCode,
    pub extra_info: Option<String>,
}

impl MalError {
    pub fn new(code: MalErrorCode, extra_info: impl Into<String>) -> Self {
        Self {
            code,
            extra_info: Some(extra_info.into()),
        }
    }
}

impl Display for MalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.extra_info {
            Some(info) => write!(f, "{:?}({}): {}", self.code, self.code.value(), info),
            None => write!(f, "{:?}({})", self.code, self.code.value()),
        }
    }
}

/// Failure reported by the transport collaborator.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("destination {0} is unreachable")]
    Unreachable(Uri),
    #[error("transport is closed")]
    Closed,
    #[error("send failed: {0}")]
    Failed(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// PUBLISH from a provider without a live registration in the context.
    #[error("no live provider registration for {provider} in context {context}")]
    IncorrectState { provider: Uri, context: String },

    #[error("no binding can reach consumer {0}")]
    UnknownDestination(Uri),

    #[error("binding {0} is closed")]
    BindingClosed(Uri),

    #[error("broker {0} is closed")]
    BrokerClosed(String),

    #[error("a binding is already bound to {0}")]
    DuplicateBinding(Uri),

    #[error("delivery to {destination} failed: {source}")]
    Delivery {
        destination: Uri,
        #[source]
        source: TransportError,
    },

    #[error("interaction type {0:?} is not handled by the broker")]
    UnsupportedInteraction(InteractionType),

    #[error("interaction stage {0:?} is not an inbound broker stage")]
    UnsupportedStage(InteractionStage),

    #[error("{stage:?} message carried an unexpected body")]
    MalformedMessage { stage: InteractionStage },

    #[error("invalid broker configuration: {0}")]
    Config(String),
}

impl BrokerError {
    /// Maps the error onto the payload sent back to the peer.
    pub fn to_mal_error(&self) -> MalError {
        let code = match self {
            BrokerError::IncorrectState { .. } => MalErrorCode::IncorrectState,
            BrokerError::UnknownDestination(_) => MalErrorCode::DestinationUnknown,
            BrokerError::BindingClosed(_) | BrokerError::BrokerClosed(_) => {
                MalErrorCode::Shutdown
            }
            BrokerError::Delivery { .. } => MalErrorCode::DeliveryFailed,
            BrokerError::UnsupportedInteraction(_) | BrokerError::UnsupportedStage(_) => {
                MalErrorCode::UnsupportedOperation
            }
            BrokerError::MalformedMessage { .. } => MalErrorCode::BadEncoding,
            BrokerError::DuplicateBinding(_) | BrokerError::Config(_) => MalErrorCode::Internal,
        };
        MalError::new(code, self.to_string())
    }
}
