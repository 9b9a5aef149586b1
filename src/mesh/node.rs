// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh node records.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::MacAddress;

/// Role of a node in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// The primary router.
    Router,
    /// A satellite node.
    #[default]
    Node,
}

impl NodeRole {
    /// Returns the role as a lowercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Node => "node",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeRole {
    type Err = crate::error::ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "router" | "main" | "cap" | "primary" => Ok(Self::Router),
            "node" | "satellite" | "re" | "" => Ok(Self::Node),
            other => Err(crate::error::ValueError::InvalidNodeRole(other.to_string())),
        }
    }
}

/// Uplink of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentLink {
    /// Ethernet backhaul.
    Wired,
    /// Wireless backhaul to the given node.
    Node(MacAddress),
}

/// A node entry as reported by one poll, keyed by MAC in the snapshot map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawNode {
    /// IP address.
    pub ip: Option<IpAddr>,
    /// User-assigned alias.
    pub alias: Option<String>,
    /// Hardware model.
    pub model: Option<String>,
    /// Role in the mesh.
    pub role: NodeRole,
    /// Uplink, if known.
    pub parent: Option<ParentLink>,
    /// Online flag.
    pub online: bool,
}

impl RawNode {
    /// Creates an online satellite entry.
    #[must_use]
    pub fn online() -> Self {
        Self {
            online: true,
            ..Self::default()
        }
    }

    /// Creates an offline satellite entry.
    #[must_use]
    pub fn offline() -> Self {
        Self::default()
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the IP address.
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the uplink.
    #[must_use]
    pub fn with_parent(mut self, parent: ParentLink) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// A tracked mesh node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Hardware address.
    pub mac: MacAddress,
    /// IP address.
    pub ip: Option<IpAddr>,
    /// User-assigned alias.
    pub alias: Option<String>,
    /// Hardware model.
    pub model: Option<String>,
    /// Role in the mesh.
    pub role: NodeRole,
    /// Uplink, if known.
    pub parent: Option<ParentLink>,
    /// Online flag as last reported.
    pub online: bool,
}

impl Node {
    pub(crate) fn from_raw(mac: MacAddress, raw: RawNode) -> Self {
        Self {
            mac,
            ip: raw.ip,
            alias: raw.alias,
            model: raw.model,
            role: raw.role,
            parent: raw.parent,
            online: raw.online,
        }
    }

    /// Returns the alias if set, then the model, then the MAC.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.alias
            .clone()
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| self.mac.to_string())
    }

    /// Returns `true` for the primary router.
    #[must_use]
    pub fn is_router(&self) -> bool {
        self.role == NodeRole::Router
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        "10:00:00:00:00:01".parse().unwrap()
    }

    #[test]
    fn role_from_str() {
        assert_eq!("Router".parse::<NodeRole>().unwrap(), NodeRole::Router);
        assert_eq!("satellite".parse::<NodeRole>().unwrap(), NodeRole::Node);
        assert!("toaster".parse::<NodeRole>().is_err());
    }

    #[test]
    fn display_name_fallbacks() {
        let node = Node::from_raw(mac(), RawNode::online().with_model("XT8"));
        assert_eq!(node.display_name(), "XT8");

        let node = Node::from_raw(mac(), RawNode::online().with_alias("Attic").with_model("XT8"));
        assert_eq!(node.display_name(), "Attic");

        let node = Node::from_raw(mac(), RawNode::online());
        assert_eq!(node.display_name(), "10:00:00:00:00:01");
    }

    #[test]
    fn parent_link_serializes() {
        let json = serde_json::to_string(&ParentLink::Wired).unwrap();
        assert_eq!(json, r#""wired""#);

        let json = serde_json::to_string(&ParentLink::Node(mac())).unwrap();
        assert_eq!(json, r#"{"node":"10:00:00:00:00:01"}"#);
    }
}
