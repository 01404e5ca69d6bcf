/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Data-plane layer.
//!
//! Owns the transport contracts, the directory of local broker bindings and
//! the dispatcher that classifies inbound messages by interaction stage.
//! Registration stages are acknowledged through the binding that received
//! them; a rejected PUBLISH is answered with PUBLISH_ERROR.
//!
//! ```
//! use std::sync::Arc;
//! use mal_broker::{Broker, BrokerConfig, BrokerDispatcher, MalMessage, MalTransport, TransportError, Uri};
//! use async_trait::async_trait;
//!
//! struct NoopTransport;
//!
//! #[async_trait]
//! impl MalTransport for NoopTransport {
//!     async fn send(&self, _message: MalMessage) -> Result<(), TransportError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = Arc::new(Broker::new(BrokerConfig::default()));
//! let binding = broker
//!     .create_binding(Uri::from("maltcp://broker"), Arc::new(NoopTransport))
//!     .await
//!     .unwrap();
//! let dispatcher = BrokerDispatcher::new(broker.clone(), binding);
//!
//! // A second binding on the same address is refused while the first is open.
//! assert!(broker
//!     .create_binding(Uri::from("maltcp://broker"), Arc::new(NoopTransport))
//!     .await
//!     .is_err());
//! # drop(dispatcher);
//! # });
//! ```

pub(crate) mod binding_directory;
pub(crate) mod consumer_routes;
pub(crate) mod dispatcher;
pub(crate) mod transport;
