// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Settled engine state, as seen by readers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::client::{Client, ClientIdentity, ClientSummary};
use crate::mesh::{Node, NodeSummary};
use crate::rules::Rule;
use crate::source::SensorValues;
use crate::types::MacAddress;

/// Immutable snapshot of the state at the end of the last pass.
///
/// A new value replaces the previous one atomically once a pass completes,
/// so readers never observe a half-reconciled registry.
#[derive(Debug, Clone, Default)]
pub struct PublishedState {
    /// Incremented on every publication.
    pub generation: u64,
    /// Active clients, including the ones in the disconnected state.
    pub clients: BTreeMap<MacAddress, Client>,
    /// Mesh nodes.
    pub nodes: BTreeMap<MacAddress, Node>,
    /// Parental-control rules by target MAC.
    pub rules: BTreeMap<MacAddress, Rule>,
    /// Client aggregates.
    pub client_summary: ClientSummary,
    /// Mesh aggregates.
    pub node_summary: NodeSummary,
    /// Recent connections, oldest first.
    pub recent: Vec<ClientIdentity>,
    /// Last values of each polled sensor group.
    pub groups: BTreeMap<String, SensorValues>,
    /// Whether the last pass could reach the device.
    pub available: bool,
    /// Time of the last successful reconciliation.
    pub last_reconciled: Option<DateTime<Utc>>,
}

impl PublishedState {
    /// Returns a tracked client.
    #[must_use]
    pub fn client(&self, mac: &MacAddress) -> Option<&Client> {
        self.clients.get(mac)
    }

    /// Returns a tracked node.
    #[must_use]
    pub fn node(&self, mac: &MacAddress) -> Option<&Node> {
        self.nodes.get(mac)
    }

    /// Returns the connected clients.
    pub fn connected_clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values().filter(|c| c.is_connected())
    }
}
