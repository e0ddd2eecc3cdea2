// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bus message envelope.
//!
//! Messages are transient: they are created, published once, and dropped
//! after every matching subscriber has received its clone.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec;
use crate::descriptor::Descriptor;
use crate::error::PlexusError;
use crate::types::{Addressing, Category, ComponentAddress, Kind};

/// Message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    None,
    /// Serialized descriptor (IDENTIFY).
    Descriptor(BTreeMap<String, String>),
    /// CSV text (DATALIST / DATA).
    Csv(String),
}

/// One message on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub kind: Kind,
    pub category: Category,
    pub addressing: Addressing,
    /// Address of the component that published the message.
    pub sender: ComponentAddress,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a message with a fresh id and timestamp.
    pub fn new(
        kind: Kind,
        category: Category,
        addressing: Addressing,
        sender: ComponentAddress,
        payload: Payload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            category,
            addressing,
            sender,
            payload,
            created_at: Utc::now(),
        }
    }

    /// IDENTIFY/REQUEST carrying the requester's own descriptor.
    pub fn identify_request(requester: &Descriptor, addressing: Addressing) -> Self {
        Self::new(
            Kind::Identify,
            Category::Request,
            addressing,
            requester.component.clone(),
            Payload::Descriptor(requester.to_fields()),
        )
    }

    /// IDENTIFY/RESPONSE broadcast carrying the responder's descriptor.
    pub fn identify_response(responder: &Descriptor) -> Self {
        Self::new(
            Kind::Identify,
            Category::Response,
            Addressing::Broadcast,
            responder.component.clone(),
            Payload::Descriptor(responder.to_fields()),
        )
    }

    /// Explicit CONFIGURE/REQUEST without payload.
    pub fn configure(sender: ComponentAddress, target: ComponentAddress) -> Self {
        Self::new(
            Kind::Configure,
            Category::Request,
            Addressing::Explicit(target),
            sender,
            Payload::None,
        )
    }

    /// Explicit ACTION/REQUEST without payload.
    pub fn action(sender: ComponentAddress, target: ComponentAddress) -> Self {
        Self::new(
            Kind::Action,
            Category::Request,
            Addressing::Explicit(target),
            sender,
            Payload::None,
        )
    }

    /// DATALIST/REQUEST with an already-encoded CSV list.
    pub fn data_list(sender: ComponentAddress, addressing: Addressing, csv: String) -> Self {
        Self::new(
            Kind::DataList,
            Category::Request,
            addressing,
            sender,
            Payload::Csv(csv),
        )
    }

    /// DATA/REQUEST carrying one `key=value` update.
    pub fn data_update(
        sender: ComponentAddress,
        addressing: Addressing,
        key: &str,
        value: &str,
    ) -> Self {
        Self::new(
            Kind::Data,
            Category::Request,
            addressing,
            sender,
            Payload::Csv(codec::encode_data_update(key, value)),
        )
    }

    /// Target address for explicit messages.
    pub fn target(&self) -> Option<&ComponentAddress> {
        match &self.addressing {
            Addressing::Explicit(addr) => Some(addr),
            Addressing::Broadcast => None,
        }
    }

    pub fn is_request(&self) -> bool {
        self.category == Category::Request
    }

    /// Decode the IDENTIFY payload.
    pub fn descriptor(&self) -> Result<Descriptor, PlexusError> {
        match &self.payload {
            Payload::Descriptor(fields) => Descriptor::from_fields(fields),
            _ => Err(PlexusError::MalformedDescriptor(format!(
                "{} message carries no descriptor",
                self.kind
            ))),
        }
    }

    /// CSV text of a DATALIST/DATA payload.
    pub fn csv(&self) -> Result<&str, PlexusError> {
        match &self.payload {
            Payload::Csv(text) => Ok(text),
            _ => Err(PlexusError::MalformedPayload {
                kind: self.kind,
                reason: "payload is not CSV text".to_string(),
            }),
        }
    }
}
