// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client records: the raw snapshot entry and the tracked client.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::types::{ConnectionType, MacAddress, PresenceState};

/// A client entry as reported by one poll of the device.
///
/// Raw clients are produced by the boundary normalization layer
/// ([`source::snapshot`](crate::source::snapshot)) and are keyed by MAC in a
/// snapshot map, so the MAC itself is not repeated here.
///
/// # Examples
///
/// ```
/// use meshwatch_lib::client::RawClient;
/// use meshwatch_lib::types::ConnectionType;
///
/// let raw = RawClient::connected()
///     .with_name("Phone")
///     .with_ip("192.168.1.20".parse().unwrap())
///     .with_connection_type(ConnectionType::Wlan);
/// assert!(raw.state.is_connected());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawClient {
    /// IP address, if leased.
    pub ip: Option<IpAddr>,
    /// Host name or user-assigned nickname.
    pub name: Option<String>,
    /// Hardware vendor.
    pub vendor: Option<String>,
    /// Link type.
    pub connection_type: ConnectionType,
    /// Whether the client is on a guest network.
    pub guest: bool,
    /// Guest network index, when `guest` is set.
    pub guest_id: Option<u8>,
    /// Mesh node the client is attached to.
    pub node: Option<MacAddress>,
    /// Presence as reported by the device.
    pub state: PresenceState,
    /// Time the client joined its wireless network.
    pub connected_since: Option<DateTime<Utc>>,
}

impl RawClient {
    /// Creates an entry reported as connected.
    #[must_use]
    pub fn connected() -> Self {
        Self {
            state: PresenceState::Connected,
            ..Self::default()
        }
    }

    /// Creates an entry reported as disconnected.
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            state: PresenceState::Disconnected,
            ..Self::default()
        }
    }

    /// Sets the IP address.
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the vendor.
    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Sets the connection type.
    #[must_use]
    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    /// Marks the client as a member of guest network `guest_id`.
    #[must_use]
    pub fn with_guest_network(mut self, guest_id: u8) -> Self {
        self.guest = true;
        self.guest_id = Some(guest_id);
        self
    }

    /// Sets the mesh node the client is attached to.
    #[must_use]
    pub fn with_node(mut self, node: MacAddress) -> Self {
        self.node = Some(node);
        self
    }

    /// Sets the wireless association time.
    #[must_use]
    pub fn with_connected_since(mut self, since: DateTime<Utc>) -> Self {
        self.connected_since = Some(since);
        self
    }
}

/// Identity part of a client, detached from presence bookkeeping.
///
/// This is what event payloads, summaries and the recent-connection history
/// carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Hardware address.
    pub mac: MacAddress,
    /// IP address, if known.
    pub ip: Option<IpAddr>,
    /// Host name, if known.
    pub name: Option<String>,
    /// Hardware vendor, if known.
    pub vendor: Option<String>,
    /// Link type at the last positive observation.
    pub connection_type: ConnectionType,
    /// Guest network flag.
    pub guest: bool,
    /// Guest network index.
    pub guest_id: Option<u8>,
    /// Mesh node the client is attached to.
    pub node: Option<MacAddress>,
    /// Wireless association time.
    pub connected_since: Option<DateTime<Utc>>,
}

impl ClientIdentity {
    /// Creates a bare identity with only the MAC known.
    #[must_use]
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            ip: None,
            name: None,
            vendor: None,
            connection_type: ConnectionType::Disconnected,
            guest: false,
            guest_id: None,
            node: None,
            connected_since: None,
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn from_raw(mac: MacAddress, raw: &RawClient) -> Self {
        Self {
            mac,
            ip: raw.ip,
            name: raw.name.clone(),
            vendor: raw.vendor.clone(),
            connection_type: raw.connection_type,
            guest: raw.guest,
            guest_id: raw.guest_id,
            node: raw.node,
            connected_since: raw.connected_since,
        }
    }
}

/// A client tracked by the [`ClientRegistry`](super::ClientRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    identity: ClientIdentity,
    state: PresenceState,
    last_activity: Option<Instant>,
}

impl Client {
    /// Materializes a client from its first positive observation.
    pub(crate) fn from_raw(mac: MacAddress, raw: &RawClient, now: Instant) -> Self {
        Self {
            identity: ClientIdentity::from_raw(mac, raw),
            state: PresenceState::Connected,
            last_activity: Some(now),
        }
    }

    /// Recreates a tracker known from a previous session, not yet observed.
    pub(crate) fn restored(identity: ClientIdentity) -> Self {
        Self {
            identity,
            state: PresenceState::Unknown,
            last_activity: None,
        }
    }

    /// Returns the MAC address.
    #[must_use]
    pub fn mac(&self) -> MacAddress {
        self.identity.mac
    }

    /// Returns the identity fields.
    #[must_use]
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// Returns the IP address.
    #[must_use]
    pub fn ip(&self) -> Option<IpAddr> {
        self.identity.ip
    }

    /// Returns the host name if set, otherwise the MAC address.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.identity
            .name
            .clone()
            .unwrap_or_else(|| self.identity.mac.to_string())
    }

    /// Returns the connection type.
    #[must_use]
    pub fn connection_type(&self) -> ConnectionType {
        self.identity.connection_type
    }

    /// Returns `true` if the client is on a guest network.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.identity.guest
    }

    /// Returns the presence state.
    #[must_use]
    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Returns `true` if the client is considered connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Returns the instant of the last positive observation.
    #[must_use]
    pub fn last_activity(&self) -> Option<Instant> {
        self.last_activity
    }

    /// Returns the wireless association time.
    #[must_use]
    pub fn connected_since(&self) -> Option<DateTime<Utc>> {
        self.identity.connected_since
    }

    pub(crate) fn set_state(&mut self, state: PresenceState) {
        self.state = state;
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    pub(crate) fn clear_connected_since(&mut self) {
        self.identity.connected_since = None;
    }

    /// Copies identity fields from a positive observation.
    ///
    /// Returns `true` if anything changed.
    pub(crate) fn apply_identity(&mut self, raw: &RawClient) -> bool {
        let updated = ClientIdentity::from_raw(self.identity.mac, raw);
        if updated == self.identity {
            false
        } else {
            self.identity = updated;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        "aa:bb:cc:dd:ee:01".parse().unwrap()
    }

    #[test]
    fn from_raw_is_connected() {
        let now = Instant::now();
        let client = Client::from_raw(mac(), &RawClient::connected().with_name("tv"), now);

        assert!(client.is_connected());
        assert_eq!(client.last_activity(), Some(now));
        assert_eq!(client.display_name(), "tv");
    }

    #[test]
    fn display_name_falls_back_to_mac() {
        let client = Client::restored(ClientIdentity::new(mac()));
        assert_eq!(client.display_name(), "aa:bb:cc:dd:ee:01");
        assert_eq!(client.state(), PresenceState::Unknown);
    }

    #[test]
    fn apply_identity_reports_changes() {
        let raw = RawClient::connected().with_name("laptop");
        let mut client = Client::from_raw(mac(), &raw, Instant::now());

        assert!(!client.apply_identity(&raw));

        let moved = raw.with_ip("10.0.0.7".parse().unwrap());
        assert!(client.apply_identity(&moved));
        assert_eq!(client.ip(), Some("10.0.0.7".parse().unwrap()));
    }

    #[test]
    fn guest_network_builder() {
        let raw = RawClient::connected().with_guest_network(2);
        assert!(raw.guest);
        assert_eq!(raw.guest_id, Some(2));
    }
}
