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

//! # mal-broker
//!
//! `mal-broker` implements the broker side of the CCSDS MO MAL
//! publish/subscribe interaction pattern: providers register a publishing
//! contract, consumers register key filters, and every PUBLISH is validated,
//! matched and fanned out as one NOTIFY per (consumer, subscription).
//!
//! Typical usage is centered on [`Broker`], one [`BrokerBinding`] per local
//! broker address and a [`BrokerDispatcher`] that the transport feeds
//! received messages into.
//!
//! ## Fan-out
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::SystemTime;
//! use async_trait::async_trait;
//! use mal_broker::{
//!     Attribute, Broker, BrokerConfig, InteractionStage, InteractionType, KeyFilter,
//!     MalMessage, MalTransport, MessageBody, MessageHeader, OperationIdentity, QosLevel,
//!     SessionType, Subscription, SubscriptionFilter, TransportError, Update, UpdateHeader,
//!     UpdateValue, Uri,
//! };
//!
//! #[derive(Default)]
//! struct Outbox(Mutex<Vec<MalMessage>>);
//!
//! #[async_trait]
//! impl MalTransport for Outbox {
//!     async fn send(&self, message: MalMessage) -> Result<(), TransportError> {
//!         self.0.lock().unwrap().push(message);
//!         Ok(())
//!     }
//! }
//!
//! fn header(from: &str, stage: InteractionStage) -> MessageHeader {
//!     MessageHeader {
//!         from: Uri::from(from),
//!         to: Uri::from("maltcp://broker"),
//!         authentication_id: vec![],
//!         timestamp: SystemTime::now(),
//!         qos: QosLevel::BestEffort,
//!         priority: 0,
//!         domain: vec!["esa".to_string(), "mission".to_string()],
//!         network_zone: "GROUND".to_string(),
//!         session: SessionType::Live,
//!         session_name: "LIVE".to_string(),
//!         interaction_type: InteractionType::PubSub,
//!         stage,
//!         transaction_id: 1,
//!         operation: OperationIdentity::new(2, 1, 1, 1),
//!         is_error: false,
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = Broker::new(BrokerConfig::default());
//! let outbox = Arc::new(Outbox::default());
//! let binding = broker
//!     .create_binding(Uri::from("maltcp://broker"), outbox.clone())
//!     .await
//!     .unwrap();
//!
//! let filter = SubscriptionFilter::new(vec![KeyFilter::any_of("K1", vec![Attribute::Integer(5)])]);
//! broker
//!     .handle_register(
//!         &binding,
//!         &header("maltcp://consumer", InteractionStage::Register),
//!         vec![Subscription::new("SUB1", filter)],
//!     )
//!     .await
//!     .unwrap();
//! broker
//!     .handle_publish_register(&header("maltcp://provider", InteractionStage::PublishRegister), vec![])
//!     .await
//!     .unwrap();
//!
//! let update = Update::new(
//!     UpdateHeader {
//!         source: "provider".to_string(),
//!         domain: vec!["esa".to_string(), "mission".to_string()],
//!         key_values: vec![Some(Attribute::Integer(5))],
//!     },
//!     vec![UpdateValue::Decoded(Attribute::String("A".to_string()))],
//! );
//! let outcome = broker
//!     .handle_publish(&header("maltcp://provider", InteractionStage::Publish), vec![update])
//!     .await
//!     .unwrap();
//!
//! assert_eq!(outcome.notified, 1);
//! let sent = outbox.0.lock().unwrap();
//! assert!(matches!(&sent[0].body, MessageBody::Notify { subscription_id, .. } if subscription_id == "SUB1"));
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Message model: decoded envelope and body types
//! - Control plane: broker-context partitioning and the registration strategy
//! - Routing: provider contracts, consumer filters, match plans and notify sets
//! - Data plane: transport contracts, binding directory and inbound dispatch
//! - Broker: publish validation, matching and fan-out orchestration
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod binding;
pub use binding::{BindingState, BrokerBinding};

mod broker;
pub use broker::{Broker, PublishOutcome};

mod config;
pub use config::BrokerConfig;

mod control_plane;
pub use control_plane::context_key::{BrokerContextKey, ProviderIdentity};
pub use control_plane::handler::{BrokerHandler, DefaultBrokerHandler};

mod data_plane;
pub use data_plane::dispatcher::BrokerDispatcher;
pub use data_plane::transport::{MalListener, MalTransport};

mod error;
pub use error::{BrokerError, MalError, MalErrorCode, TransportError};

mod message;
pub use message::{
    Attribute, AttributeType, InteractionStage, InteractionType, KeyDeclaration, MalMessage,
    MessageBody, MessageHeader, OperationIdentity, QosLevel, SessionType, Subscription, Update,
    UpdateHeader, UpdateValue, Uri,
};

#[doc(hidden)]
pub mod observability;

mod routing;
pub use routing::consumer_registry::ConsumerRegistration;
pub use routing::notify_set::{DeliveryContext, MatchPlan, NotifyMessageSet, SubscriptionMatch};
pub use routing::provider_registry::ProviderRegistration;
pub use routing::subscription_filter::{KeyFilter, KeyMatchStrictness, SubscriptionFilter};
