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

//! Contracts of the transport collaborator.

use crate::error::TransportError;
use crate::message::MalMessage;
use async_trait::async_trait;

/// Outbound side of a transport. Messages are already addressed through
/// their header; encoding happens behind this trait.
#[async_trait]
pub trait MalTransport: Send + Sync {
    async fn send(&self, message: MalMessage) -> Result<(), TransportError>;
}

/// Inbound side of a transport: receives decoded messages addressed to a
/// local endpoint.
#[async_trait]
pub trait MalListener: Send + Sync {
    async fn on_receive(&self, message: MalMessage);
}
