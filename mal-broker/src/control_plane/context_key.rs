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

//! Routing-namespace identity for registry partitioning.

use crate::message::{SessionType, Uri};
use std::fmt::{Display, Formatter};

/// Isolated routing namespace. Registrations and publishes in one context are
/// invisible to every other context.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrokerContextKey {
    pub domain: Vec<String>,
    pub network_zone: String,
    pub session: SessionType,
    pub session_name: String,
}

impl BrokerContextKey {
    pub fn new(
        domain: Vec<String>,
        network_zone: &str,
        session: SessionType,
        session_name: &str,
    ) -> Self {
        Self {
            domain,
            network_zone: network_zone.to_string(),
            session,
            session_name: session_name.to_string(),
        }
    }

    /// Signature distinguishing the same provider address across sessions.
    pub fn session_signature(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.session,
            self.session_name,
            self.network_zone,
            self.domain.join(".")
        )
    }
}

impl Display for BrokerContextKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}/{}:{}",
            self.domain.join("."),
            self.network_zone,
            self.session,
            self.session_name
        )
    }
}

/// Identity of a provider registration: its address plus the session it
/// registered in.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProviderIdentity {
    pub address: Uri,
    pub session_signature: String,
}

impl ProviderIdentity {
    pub fn new(address: Uri, context: &BrokerContextKey) -> Self {
        Self {
            address,
            session_signature: context.session_signature(),
        }
    }
}

impl Display for ProviderIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.address, self.session_signature)
    }
}
