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

//! Stable event names.

pub const CONTEXT_CREATED: &str = "context_created";
pub const CONTEXT_COLLECTED: &str = "context_collected";

pub const PROVIDER_REGISTERED: &str = "provider_registered";
pub const PROVIDER_DEREGISTERED: &str = "provider_deregistered";
pub const CONSUMER_REGISTERED: &str = "consumer_registered";
pub const CONSUMER_DEREGISTERED: &str = "consumer_deregistered";
pub const CONSUMER_REMOVED: &str = "consumer_removed";

pub const PUBLISH_REJECTED: &str = "publish_rejected";
pub const PUBLISH_MATCHED: &str = "publish_matched";
pub const NOTIFY_SENT: &str = "notify_sent";
pub const NOTIFY_SKIPPED_UNKNOWN_DESTINATION: &str = "notify_skipped_unknown_destination";
pub const NOTIFY_FAILED: &str = "notify_failed";
pub const NOTIFY_ERROR_SENT: &str = "notify_error_sent";
pub const PUBLISH_ERROR_SENT: &str = "publish_error_sent";

pub const BINDING_CREATED: &str = "binding_created";
pub const BINDING_CLOSED: &str = "binding_closed";
pub const BINDING_SEND_REJECTED: &str = "binding_send_rejected";

pub const DISPATCH_RECEIVE: &str = "dispatch_receive";
pub const DISPATCH_FAILED: &str = "dispatch_failed";
pub const ACK_SENT: &str = "ack_sent";

pub const BROKER_CREATED: &str = "broker_created";
pub const BROKER_CLOSED: &str = "broker_closed";
