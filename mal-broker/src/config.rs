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

//! Broker configuration, loadable from JSON5.

use crate::error::BrokerError;
use crate::routing::subscription_filter::KeyMatchStrictness;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_BROKER_NAME: &str = "mal-broker";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Label used in logs.
    pub name: String,
    /// Policy applied when filter and key-vector shapes differ.
    pub key_match: KeyMatchStrictness,
    /// Answer registration stages with their `*_ACK` stage.
    pub acknowledge: bool,
    /// After a failed NOTIFY, attempt one NOTIFY_ERROR to the same consumer.
    pub notify_error_on_delivery_failure: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_BROKER_NAME.to_string(),
            key_match: KeyMatchStrictness::default(),
            acknowledge: true,
            notify_error_on_delivery_failure: false,
        }
    }
}

impl BrokerConfig {
    pub fn from_json5_str(source: &str) -> Result<Self, BrokerError> {
        json5::from_str(source).map_err(|e| BrokerError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BrokerError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| BrokerError::Config(format!("unable to read {}: {e}", path.display())))?;
        Self::from_json5_str(&source)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_key_match(mut self, key_match: KeyMatchStrictness) -> Self {
        self.key_match = key_match;
        self
    }
}
