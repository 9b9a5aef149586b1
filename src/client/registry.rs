// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of tracked clients.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{
    Client, ClientFilter, ClientIdentity, PresenceTracker, RawClient, RecentHistory, Transition,
};
use crate::types::{ConnectionType, MacAddress};

/// A client snapshot as returned by one poll, keyed by MAC.
pub type ClientSnapshot = HashMap<MacAddress, RawClient>;

/// Aggregates over the connected clients.
///
/// This is the value tuple of the `devices` sensor group: a refresh is only
/// signalled downstream when it differs from the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    /// Number of connected clients.
    pub connected: usize,
    /// Connected clients on ethernet.
    pub wired: usize,
    /// Connected clients on a wireless radio.
    pub wireless: usize,
    /// Connected clients on any guest network.
    pub guest: usize,
    /// Connected clients per guest network index.
    pub guest_networks: BTreeMap<u8, usize>,
    /// Identities of connected clients, sorted by MAC.
    pub connected_list: Vec<ClientIdentity>,
}

/// Outcome of one client reconciliation pass.
///
/// Clients are never removed by reconciliation, so there is no removed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientReconcile {
    /// Newly materialized clients.
    pub added: Vec<MacAddress>,
    /// Tracked clients whose state or identity changed.
    pub updated: Vec<MacAddress>,
    /// Tracked clients that did not change.
    pub unchanged: Vec<MacAddress>,
    /// Presence edges produced by this pass.
    pub transitions: Vec<(MacAddress, Transition)>,
    /// Aggregates after the pass.
    pub summary: ClientSummary,
}

impl ClientReconcile {
    /// Returns `true` if the pass changed anything.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }
}

/// Owns the tracked clients and the recent-connection history.
///
/// The filter decides the active working set: tracked clients that do not
/// pass it are kept but neither observed, counted nor published, and
/// snapshot entries that do not pass it are never materialized.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<MacAddress, Client>,
    filter: ClientFilter,
    history: RecentHistory,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(filter: ClientFilter, history_cap: usize) -> Self {
        Self {
            clients: HashMap::new(),
            filter,
            history: RecentHistory::new(history_cap),
        }
    }

    /// Returns the active filter.
    #[must_use]
    pub fn filter(&self) -> &ClientFilter {
        &self.filter
    }

    /// Replaces the active filter. Tracked clients are kept.
    pub fn set_filter(&mut self, filter: ClientFilter) {
        self.filter = filter;
    }

    /// Returns an active client.
    #[must_use]
    pub fn get(&self, mac: &MacAddress) -> Option<&Client> {
        self.clients.get(mac).filter(|_| self.filter.allows(mac))
    }

    /// Iterates over the active working set.
    pub fn iter(&self) -> impl Iterator<Item = (&MacAddress, &Client)> {
        self.clients
            .iter()
            .filter(|(mac, _)| self.filter.allows(mac))
    }

    /// Returns the number of active clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if no client is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the recent-connection history.
    #[must_use]
    pub fn history(&self) -> &RecentHistory {
        &self.history
    }

    /// Recreates trackers known from a previous session.
    ///
    /// Restored clients start in the `Unknown` state. Already tracked MACs
    /// are left alone. Returns the number of restored trackers.
    pub fn restore(&mut self, identities: impl IntoIterator<Item = ClientIdentity>) -> usize {
        let mut restored = 0;
        for identity in identities {
            if let std::collections::hash_map::Entry::Vacant(slot) =
                self.clients.entry(identity.mac)
            {
                slot.insert(Client::restored(identity));
                restored += 1;
            }
        }
        restored
    }

    /// Removes a tracker on explicit request. History is not touched.
    pub fn remove(&mut self, mac: &MacAddress) -> Option<Client> {
        self.clients.remove(mac)
    }

    /// Merges a fresh snapshot into the registry.
    pub fn reconcile(
        &mut self,
        mut snapshot: ClientSnapshot,
        consider_home: Duration,
        now: Instant,
        wall_now: DateTime<Utc>,
    ) -> ClientReconcile {
        let tracker = PresenceTracker::new(consider_home);
        let Self {
            clients,
            filter,
            history,
        } = self;

        snapshot.retain(|mac, _| filter.allows(mac));

        let mut result = ClientReconcile::default();

        for (mac, client) in clients.iter_mut().filter(|(mac, _)| filter.allows(mac)) {
            let entry = snapshot.remove(mac);
            let previous = client.state();
            let observation = tracker.observe(client, entry.as_ref(), now);

            if let Some(transition) = observation.transition {
                result.transitions.push((*mac, transition));
            }
            if observation.identity_changed || observation.state != previous {
                result.updated.push(*mac);
            } else {
                result.unchanged.push(*mac);
            }
        }

        for (mac, raw) in snapshot {
            if let Some(client) = tracker.admit(mac, &raw, now) {
                clients.insert(mac, client);
                result.added.push(mac);
            }
        }

        result.added.sort_unstable();
        result.updated.sort_unstable();
        result.unchanged.sort_unstable();
        result.transitions.sort_unstable_by_key(|(mac, _)| *mac);

        let summary = Self::summarize(clients, filter);
        history.update(summary.connected_list.clone(), wall_now);
        result.summary = summary;

        tracing::debug!(
            added = result.added.len(),
            updated = result.updated.len(),
            connected = result.summary.connected,
            "Reconciled clients"
        );

        result
    }

    /// Computes the aggregates over the active working set.
    #[must_use]
    pub fn summary(&self) -> ClientSummary {
        Self::summarize(&self.clients, &self.filter)
    }

    fn summarize(clients: &HashMap<MacAddress, Client>, filter: &ClientFilter) -> ClientSummary {
        let mut summary = ClientSummary::default();

        for client in clients
            .iter()
            .filter(|(mac, c)| filter.allows(mac) && c.is_connected())
            .map(|(_, c)| c)
        {
            summary.connected += 1;
            match client.connection_type() {
                ConnectionType::Wired => summary.wired += 1,
                ConnectionType::Wlan => summary.wireless += 1,
                ConnectionType::Disconnected => {}
            }
            if client.is_guest() {
                summary.guest += 1;
                if let Some(id) = client.identity().guest_id {
                    *summary.guest_networks.entry(id).or_default() += 1;
                }
            }
            summary.connected_list.push(client.identity().clone());
        }

        summary.connected_list.sort_unstable_by_key(|c| c.mac);
        summary
    }
}
