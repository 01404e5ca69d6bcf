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

//! Decoded message bodies for the publish/subscribe stages.

use crate::error::MalError;
use crate::message::header::MessageHeader;
use crate::routing::subscription_filter::SubscriptionFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Blob,
    Boolean,
    Duration,
    Float,
    Double,
    Identifier,
    Octet,
    UOctet,
    Short,
    UShort,
    Integer,
    UInteger,
    Long,
    ULong,
    String,
    Time,
    FineTime,
    Uri,
}

/// A single typed key value. Equality is exact: both the type and the value
/// have to agree, so `Integer(5)` never equals `Long(5)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Blob(Vec<u8>),
    Boolean(bool),
    Duration(f64),
    Float(f32),
    Double(f64),
    Identifier(String),
    Octet(i8),
    UOctet(u8),
    Short(i16),
    UShort(u16),
    Integer(i32),
    UInteger(u32),
    Long(i64),
    ULong(u64),
    String(String),
    Time(u64),
    FineTime(u64),
    Uri(String),
}

impl Attribute {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Attribute::Blob(_) => AttributeType::Blob,
            Attribute::Boolean(_) => AttributeType::Boolean,
            Attribute::Duration(_) => AttributeType::Duration,
            Attribute::Float(_) => AttributeType::Float,
            Attribute::Double(_) => AttributeType::Double,
            Attribute::Identifier(_) => AttributeType::Identifier,
            Attribute::Octet(_) => AttributeType::Octet,
            Attribute::UOctet(_) => AttributeType::UOctet,
            Attribute::Short(_) => AttributeType::Short,
            Attribute::UShort(_) => AttributeType::UShort,
            Attribute::Integer(_) => AttributeType::Integer,
            Attribute::UInteger(_) => AttributeType::UInteger,
            Attribute::Long(_) => AttributeType::Long,
            Attribute::ULong(_) => AttributeType::ULong,
            Attribute::String(_) => AttributeType::String,
            Attribute::Time(_) => AttributeType::Time,
            Attribute::FineTime(_) => AttributeType::FineTime,
            Attribute::Uri(_) => AttributeType::Uri,
        }
    }
}

/// One key a provider declares at PUBLISH_REGISTER.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDeclaration {
    pub name: String,
    pub key_type: AttributeType,
}

impl KeyDeclaration {
    pub fn new(name: impl Into<String>, key_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }
}

/// Identity of one published item. A `None` key value means the provider left
/// that position absent.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateHeader {
    pub source: String,
    pub domain: Vec<String>,
    pub key_values: Vec<Option<Attribute>>,
}

/// One element of an update body.
///
/// A publish may carry several parallel body lists; each list contributes one
/// value per update, so values stay aligned with their header by position.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateValue {
    /// Still encoded; the broker forwards the payload untouched.
    Encoded { type_tag: u64, payload: Vec<u8> },
    Decoded(Attribute),
    Null,
}

/// A published item: its header together with its correlated body values.
#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    pub header: UpdateHeader,
    pub body: Vec<UpdateValue>,
}

impl Update {
    pub fn new(header: UpdateHeader, body: Vec<UpdateValue>) -> Self {
        Self { header, body }
    }
}

/// A named filter registered by a consumer.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub filter: SubscriptionFilter,
}

impl Subscription {
    pub fn new(id: impl Into<String>, filter: SubscriptionFilter) -> Self {
        Self {
            id: id.into(),
            filter,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    Empty,
    Register(Vec<Subscription>),
    PublishRegister(Vec<KeyDeclaration>),
    Publish(Vec<Update>),
    Deregister(Vec<String>),
    Notify {
        subscription_id: String,
        updates: Vec<Update>,
    },
    Error(MalError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MalMessage {
    pub header: MessageHeader,
    pub body: MessageBody,
}

impl MalMessage {
    pub fn new(header: MessageHeader, body: MessageBody) -> Self {
        Self { header, body }
    }
}
