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

//! Provider publishing contracts and publish validation.

use crate::control_plane::context_key::{BrokerContextKey, ProviderIdentity};
use crate::error::BrokerError;
use crate::message::{KeyDeclaration, QosLevel, Update};
use std::collections::HashMap;
use tracing::trace;

#[derive(Clone, Debug, PartialEq)]
pub struct ProviderRegistration {
    pub identity: ProviderIdentity,
    pub qos: QosLevel,
    pub declared_keys: Vec<KeyDeclaration>,
}

/// Provider registrations of one broker context.
#[derive(Debug, Default)]
pub(crate) struct ProviderRegistry {
    registrations: HashMap<ProviderIdentity, ProviderRegistration>,
}

impl ProviderRegistry {
    /// Creates or replaces the registration. Returns `true` when it is new.
    pub(crate) fn register(
        &mut self,
        identity: &ProviderIdentity,
        qos: QosLevel,
        declared_keys: Vec<KeyDeclaration>,
    ) -> bool {
        self.registrations
            .insert(
                identity.clone(),
                ProviderRegistration {
                    identity: identity.clone(),
                    qos,
                    declared_keys,
                },
            )
            .is_none()
    }

    pub(crate) fn deregister(&mut self, identity: &ProviderIdentity) -> bool {
        self.registrations.remove(identity).is_some()
    }

    pub(crate) fn get(&self, identity: &ProviderIdentity) -> Option<&ProviderRegistration> {
        self.registrations.get(identity)
    }

    /// Only the existence of the registration is checked; the declared keys are
    /// metadata for matching and are not enforced per update.
    pub(crate) fn validate_publish(
        &self,
        context: &BrokerContextKey,
        identity: &ProviderIdentity,
        updates: &[Update],
    ) -> Result<&ProviderRegistration, BrokerError> {
        let registration = self
            .registrations
            .get(identity)
            .ok_or_else(|| BrokerError::IncorrectState {
                provider: identity.address.clone(),
                context: context.to_string(),
            })?;

        let declared_width = registration.declared_keys.len();
        for update in updates
            .iter()
            .filter(|update| update.header.key_values.len() != declared_width)
        {
            trace!(
                provider = %identity,
                source = %update.header.source,
                declared_width,
                update_width = update.header.key_values.len(),
                "update key vector differs from declared keys"
            );
        }

        Ok(registration)
    }

    pub(crate) fn len(&self) -> usize {
        self.registrations.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AttributeType, SessionType, Uri};

    fn context() -> BrokerContextKey {
        BrokerContextKey::new(
            vec!["esa".to_string(), "mission".to_string()],
            "GROUND",
            SessionType::Live,
            "LIVE",
        )
    }

    fn provider() -> ProviderIdentity {
        ProviderIdentity::new(Uri::from("maltcp://provider"), &context())
    }

    #[test]
    fn publish_without_registration_is_incorrect_state() {
        let registry = ProviderRegistry::default();

        let result = registry.validate_publish(&context(), &provider(), &[]);
        assert!(matches!(
            result,
            Err(BrokerError::IncorrectState { ref provider, .. })
                if provider == &Uri::from("maltcp://provider")
        ));
    }

    #[test]
    fn registration_is_replaced_on_repeat() {
        let mut registry = ProviderRegistry::default();

        assert!(registry.register(
            &provider(),
            QosLevel::Assured,
            vec![KeyDeclaration::new("K1", AttributeType::Integer)]
        ));
        assert!(!registry.register(
            &provider(),
            QosLevel::Timely,
            vec![
                KeyDeclaration::new("K1", AttributeType::Integer),
                KeyDeclaration::new("K2", AttributeType::String)
            ]
        ));

        assert_eq!(registry.len(), 1);
        let registration = registry
            .validate_publish(&context(), &provider(), &[])
            .expect("registered provider");
        assert_eq!(registration.qos, QosLevel::Timely);
        assert_eq!(registration.declared_keys.len(), 2);
    }

    #[test]
    fn deregistration_is_idempotent() {
        let mut registry = ProviderRegistry::default();
        registry.register(&provider(), QosLevel::BestEffort, vec![]);

        assert!(registry.deregister(&provider()));
        assert!(!registry.deregister(&provider()));
        assert!(registry.is_empty());
        assert!(registry.validate_publish(&context(), &provider(), &[]).is_err());
    }
}
