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

//! Local broker bindings keyed by their address.

use crate::binding::BrokerBinding;
use crate::error::BrokerError;
use crate::message::Uri;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub(crate) struct BindingDirectory {
    bindings: RwLock<HashMap<Uri, Arc<BrokerBinding>>>,
}

impl BindingDirectory {
    pub(crate) async fn insert(&self, binding: Arc<BrokerBinding>) -> Result<(), BrokerError> {
        let mut bindings = self.bindings.write().await;
        if bindings
            .get(binding.uri())
            .is_some_and(|existing| !existing.is_closed())
        {
            return Err(BrokerError::DuplicateBinding(binding.uri().clone()));
        }
        bindings.insert(binding.uri().clone(), binding);
        Ok(())
    }

    pub(crate) async fn get(&self, uri: &Uri) -> Option<Arc<BrokerBinding>> {
        self.bindings.read().await.get(uri).cloned()
    }

    /// The binding `consumer` registered through, if it is still open and
    /// still carries the consumer.
    pub(crate) async fn resolve_route(
        &self,
        binding: &Uri,
        consumer: &Uri,
    ) -> Option<Arc<BrokerBinding>> {
        self.bindings
            .read()
            .await
            .get(binding)
            .filter(|owner| !owner.is_closed() && owner.has_subscriber(consumer))
            .cloned()
    }

    /// Removes `consumer` from one binding. Returns `true` if it held it.
    pub(crate) async fn detach(&self, binding: &Uri, consumer: &Uri) -> bool {
        self.bindings
            .read()
            .await
            .get(binding)
            .is_some_and(|owner| owner.remove_subscriber(consumer))
    }

    pub(crate) async fn close_all(&self) -> usize {
        self.bindings
            .read()
            .await
            .values()
            .filter(|binding| binding.close())
            .count()
    }

    pub(crate) async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_plane::transport::MalTransport;
    use crate::error::TransportError;
    use crate::message::MalMessage;
    use async_trait::async_trait;

    struct NoopTransport;

    #[async_trait]
    impl MalTransport for NoopTransport {
        async fn send(&self, _message: MalMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn binding(uri: &str) -> Arc<BrokerBinding> {
        Arc::new(BrokerBinding::new(Uri::from(uri), Arc::new(NoopTransport)))
    }

    #[tokio::test]
    async fn duplicate_open_binding_is_rejected() {
        let directory = BindingDirectory::default();
        directory.insert(binding("maltcp://broker")).await.expect("first insert");

        let result = directory.insert(binding("maltcp://broker")).await;
        assert!(matches!(result, Err(BrokerError::DuplicateBinding(_))));
    }

    #[tokio::test]
    async fn closed_binding_can_be_replaced() {
        let directory = BindingDirectory::default();
        let first = binding("maltcp://broker");
        directory.insert(first.clone()).await.expect("first insert");
        first.close();

        directory
            .insert(binding("maltcp://broker"))
            .await
            .expect("closed binding should be replaceable");
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn route_resolution_follows_the_named_binding() {
        let directory = BindingDirectory::default();
        let consumer = Uri::from("maltcp://consumer");
        let a = binding("maltcp://broker-a");
        let b = binding("maltcp://broker-b");
        directory.insert(a.clone()).await.expect("insert a");
        directory.insert(b.clone()).await.expect("insert b");
        a.add_subscriber(&consumer);
        b.add_subscriber(&consumer);

        for _ in 0..16 {
            assert_eq!(
                directory
                    .resolve_route(a.uri(), &consumer)
                    .await
                    .map(|owner| owner.uri().clone()),
                Some(Uri::from("maltcp://broker-a"))
            );
        }

        assert!(directory.detach(b.uri(), &consumer).await);
        assert!(!directory.detach(b.uri(), &consumer).await);
        assert!(directory.resolve_route(b.uri(), &consumer).await.is_none());

        a.close();
        assert!(directory.resolve_route(a.uri(), &consumer).await.is_none());
        assert!(directory
            .resolve_route(&Uri::from("maltcp://unknown"), &consumer)
            .await
            .is_none());
    }
}
