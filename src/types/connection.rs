// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link and presence types reported for network clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// How a client is attached to the network.
///
/// # Examples
///
/// ```
/// use meshwatch_lib::types::ConnectionType;
///
/// let link: ConnectionType = "5ghz".parse().unwrap();
/// assert_eq!(link, ConnectionType::Wlan);
/// assert!(link.is_wireless());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Ethernet link.
    Wired,
    /// Wireless link on any band.
    Wlan,
    /// Not attached.
    #[default]
    Disconnected,
}

impl ConnectionType {
    /// Returns the lowercase name of the connection type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wired => "wired",
            Self::Wlan => "wlan",
            Self::Disconnected => "disconnected",
        }
    }

    /// Returns `true` for wireless links.
    #[must_use]
    pub const fn is_wireless(&self) -> bool {
        matches!(self, Self::Wlan)
    }

    /// Maps the numeric interface code used by router firmware.
    ///
    /// `0` is ethernet, `1`-`3` are the 2.4/5/6 GHz radios.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Wired,
            1..=3 => Self::Wlan,
            _ => Self::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wired" | "lan" | "ethernet" | "0" => Ok(Self::Wired),
            "wlan" | "wireless" | "wifi" | "2.4ghz" | "5ghz" | "5ghz2" | "6ghz" | "1" | "2"
            | "3" => Ok(Self::Wlan),
            "disconnected" | "none" | "" => Ok(Self::Disconnected),
            _ => Err(ValueError::InvalidConnectionType(s.to_string())),
        }
    }
}

/// Presence of a client as seen by the engine.
///
/// `Unknown` is the state of a tracker restored from a previous session
/// that has not been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    /// Never observed in this session.
    #[default]
    Unknown,
    /// Currently connected (or within the consider-home window).
    Connected,
    /// Absent for longer than the consider-home window.
    Disconnected,
}

impl PresenceState {
    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }

    /// Returns `true` if the state is [`PresenceState::Connected`].
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connected" | "online" | "on" | "1" | "true" => Ok(Self::Connected),
            "disconnected" | "offline" | "off" | "0" | "false" => Ok(Self::Disconnected),
            "unknown" | "" => Ok(Self::Unknown),
            _ => Err(ValueError::InvalidPresenceState(s.to_string())),
        }
    }
}

impl From<bool> for PresenceState {
    fn from(value: bool) -> Self {
        if value {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}
