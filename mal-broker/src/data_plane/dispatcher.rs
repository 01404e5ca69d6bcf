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

//! Inbound message classification for one broker binding.

use crate::binding::BrokerBinding;
use crate::broker::Broker;
use crate::data_plane::transport::MalListener;
use crate::error::BrokerError;
use crate::message::{InteractionStage, InteractionType, MalMessage, MessageBody, MessageHeader};
use crate::observability::{events, fields};
use crate::routing::notify_set::DeliveryContext;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

const COMPONENT: &str = "dispatcher";

/// Feeds messages received on one binding into the broker and replies
/// through the same binding.
#[derive(Clone, Debug)]
pub struct BrokerDispatcher {
    broker: Arc<Broker>,
    binding: Arc<BrokerBinding>,
}

impl BrokerDispatcher {
    pub fn new(broker: Arc<Broker>, binding: Arc<BrokerBinding>) -> Self {
        Self { broker, binding }
    }

    pub fn binding(&self) -> &Arc<BrokerBinding> {
        &self.binding
    }

    pub async fn dispatch(&self, message: MalMessage) -> Result<(), BrokerError> {
        let MalMessage { header, body } = message;
        if header.interaction_type != InteractionType::PubSub {
            return Err(BrokerError::UnsupportedInteraction(header.interaction_type));
        }
        if !header.stage.is_broker_inbound() {
            return Err(BrokerError::UnsupportedStage(header.stage));
        }

        match (header.stage, body) {
            (InteractionStage::Register, MessageBody::Register(subscriptions)) => {
                self.broker
                    .handle_register(&self.binding, &header, subscriptions)
                    .await?;
                self.acknowledge(&header, InteractionStage::RegisterAck).await
            }
            (InteractionStage::Register, _) => {
                self.reject_malformed(&header, InteractionStage::RegisterError)
                    .await
            }
            (InteractionStage::PublishRegister, MessageBody::PublishRegister(declared_keys)) => {
                self.broker
                    .handle_publish_register(&header, declared_keys)
                    .await?;
                self.acknowledge(&header, InteractionStage::PublishRegisterAck)
                    .await
            }
            (InteractionStage::PublishRegister, _) => {
                self.reject_malformed(&header, InteractionStage::PublishRegisterError)
                    .await
            }
            (InteractionStage::Publish, MessageBody::Publish(updates)) => {
                match self.broker.handle_publish(&header, updates).await {
                    Ok(_) => Ok(()),
                    Err(err @ BrokerError::IncorrectState { .. }) => {
                        self.send_publish_error(&header, &err).await?;
                        Err(err)
                    }
                    Err(err) => Err(err),
                }
            }
            (InteractionStage::Publish, _) => {
                let err = BrokerError::MalformedMessage {
                    stage: InteractionStage::Publish,
                };
                self.send_publish_error(&header, &err).await?;
                Err(err)
            }
            (InteractionStage::Deregister, MessageBody::Deregister(subscription_ids)) => {
                self.broker
                    .handle_deregister(&header, &subscription_ids)
                    .await?;
                self.acknowledge(&header, InteractionStage::DeregisterAck)
                    .await
            }
            // DEREGISTER has no error stage to answer with.
            (InteractionStage::Deregister, _) => Err(BrokerError::MalformedMessage {
                stage: InteractionStage::Deregister,
            }),
            (InteractionStage::PublishDeregister, _) => {
                self.broker.handle_publish_deregister(&header).await?;
                self.acknowledge(&header, InteractionStage::PublishDeregisterAck)
                    .await
            }
            (stage, _) => Err(BrokerError::UnsupportedStage(stage)),
        }
    }

    async fn acknowledge(
        &self,
        request: &MessageHeader,
        stage: InteractionStage,
    ) -> Result<(), BrokerError> {
        if !self.broker.config().acknowledge {
            return Ok(());
        }
        self.binding
            .send_reply(request, stage, MessageBody::Empty)
            .await?;
        debug!(
            event = events::ACK_SENT,
            component = COMPONENT,
            binding = %self.binding.uri(),
            destination = %request.from,
            stage = ?stage,
            transaction_id = request.transaction_id,
            "acknowledgement sent"
        );
        Ok(())
    }

    async fn reject_malformed(
        &self,
        request: &MessageHeader,
        error_stage: InteractionStage,
    ) -> Result<(), BrokerError> {
        let err = BrokerError::MalformedMessage {
            stage: request.stage,
        };
        self.binding
            .send_reply(request, error_stage, MessageBody::Error(err.to_mal_error()))
            .await?;
        Err(err)
    }

    async fn send_publish_error(
        &self,
        request: &MessageHeader,
        err: &BrokerError,
    ) -> Result<(), BrokerError> {
        let mut delivery = DeliveryContext::from_header(request);
        delivery.qos = self
            .broker
            .provider_qos_level(&delivery.context, &request.from)
            .await;
        self.binding
            .send_publish_error(&request.from, &delivery, err.to_mal_error())
            .await
    }
}

#[async_trait]
impl MalListener for BrokerDispatcher {
    async fn on_receive(&self, message: MalMessage) {
        debug!(
            event = events::DISPATCH_RECEIVE,
            component = COMPONENT,
            binding = %self.binding.uri(),
            stage = %fields::format_stage(&message),
            src = %fields::format_source(&message),
            sink = %fields::format_destination(&message),
            body_len = fields::body_len(&message),
            "received broker message"
        );

        match self.dispatch(message).await {
            Ok(()) => {}
            Err(
                err @ (BrokerError::UnsupportedStage(_)
                | BrokerError::UnsupportedInteraction(_)
                | BrokerError::IncorrectState { .. }
                | BrokerError::MalformedMessage { .. }),
            ) => {
                warn!(
                    event = events::DISPATCH_FAILED,
                    component = COMPONENT,
                    binding = %self.binding.uri(),
                    err = %err,
                    "message dropped"
                );
            }
            Err(err) => {
                error!(
                    event = events::DISPATCH_FAILED,
                    component = COMPONENT,
                    binding = %self.binding.uri(),
                    err = %err,
                    "message handling failed"
                );
            }
        }
    }
}
