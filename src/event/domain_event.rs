// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity events for clients and mesh nodes.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::client::{ClientIdentity, Transition};
use crate::mesh::Node;
use crate::types::{ConnectionType, MacAddress};

/// The kind of a connectivity event.
///
/// Every kind is emitted unless disabled in the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A client was tracked for the first time.
    DeviceConnected,
    /// A connected client exceeded the consider-home window.
    DeviceDisconnected,
    /// A disconnected client was seen again.
    DeviceReconnected,
    /// A mesh node was tracked for the first time.
    NodeConnected,
    /// A tracked mesh node went offline.
    NodeDisconnected,
    /// A tracked mesh node came back online.
    NodeReconnected,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [Self; 6] = [
        Self::DeviceConnected,
        Self::DeviceDisconnected,
        Self::DeviceReconnected,
        Self::NodeConnected,
        Self::NodeDisconnected,
        Self::NodeReconnected,
    ];

    /// Returns the event name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceConnected => "device_connected",
            Self::DeviceDisconnected => "device_disconnected",
            Self::DeviceReconnected => "device_reconnected",
            Self::NodeConnected => "node_connected",
            Self::NodeDisconnected => "node_disconnected",
            Self::NodeReconnected => "node_reconnected",
        }
    }

    pub(crate) const fn for_client(transition: Transition) -> Self {
        match transition {
            Transition::Reconnected => Self::DeviceReconnected,
            Transition::Disconnected => Self::DeviceDisconnected,
        }
    }

    pub(crate) const fn for_node(transition: Transition) -> Self {
        match transition {
            Transition::Reconnected => Self::NodeReconnected,
            Transition::Disconnected => Self::NodeDisconnected,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the entity an event is about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Hardware address, used by the client filter.
    pub mac: Option<MacAddress>,
    /// IP address.
    pub ip: Option<IpAddr>,
    /// Display name.
    pub name: Option<String>,
    /// Link type, for clients.
    pub connection_type: Option<ConnectionType>,
    /// Guest network flag, for clients.
    pub guest: bool,
    /// Hardware model, for nodes.
    pub model: Option<String>,
}

impl EventPayload {
    /// Builds the payload of a client event.
    #[must_use]
    pub fn from_client(identity: &ClientIdentity) -> Self {
        Self {
            mac: Some(identity.mac),
            ip: identity.ip,
            name: identity.name.clone(),
            connection_type: Some(identity.connection_type),
            guest: identity.guest,
            model: None,
        }
    }

    /// Builds the payload of a node event.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        Self {
            mac: Some(node.mac),
            ip: node.ip,
            name: Some(node.display_name()),
            connection_type: None,
            guest: false,
            model: node.model.clone(),
        }
    }
}

/// A connectivity event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Entity identity.
    pub payload: EventPayload,
}

impl DomainEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(kind: EventKind, payload: EventPayload) -> Self {
        Self { kind, payload }
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Returns the MAC the event is about, if any.
    #[must_use]
    pub fn mac(&self) -> Option<MacAddress> {
        self.payload.mac
    }
}
