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

//! Message envelope and body model.
//!
//! Messages reach the broker already decoded: the codec that turns bytes into
//! [`MalMessage`] values lives with the transport. The broker only reads the
//! header fields it routes on and the key vectors it matches on.

mod body;
mod header;

pub use body::{
    Attribute, AttributeType, KeyDeclaration, MalMessage, MessageBody, Subscription, Update,
    UpdateHeader, UpdateValue,
};
pub use header::{
    InteractionStage, InteractionType, MessageHeader, OperationIdentity, QosLevel, SessionType,
    Uri,
};
