// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of mesh nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Node, RawNode};
use crate::client::Transition;
use crate::types::MacAddress;

/// A node snapshot as returned by one poll, keyed by MAC.
pub type NodeSnapshot = HashMap<MacAddress, RawNode>;

/// Aggregates over the mesh.
///
/// This is the value tuple of the `aimesh` sensor group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    /// Number of tracked nodes.
    pub total: usize,
    /// Number of online nodes.
    pub online: usize,
    /// Online node MACs, sorted.
    pub online_list: Vec<MacAddress>,
}

/// Outcome of one node reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeReconcile {
    /// Newly tracked nodes.
    pub added: Vec<MacAddress>,
    /// Tracked nodes whose record changed.
    pub updated: Vec<MacAddress>,
    /// Online-flag edges on previously tracked nodes.
    pub transitions: Vec<(MacAddress, Transition)>,
    /// Aggregates after the pass.
    pub summary: NodeSummary,
}

impl NodeReconcile {
    /// Returns `true` if the pass changed anything.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty()
    }
}

/// Owns the tracked mesh nodes.
///
/// Nodes have no debounce: `online` mirrors the latest snapshot. Nodes
/// missing from a snapshot keep their last record.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<MacAddress, Node>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a tracked node.
    #[must_use]
    pub fn get(&self, mac: &MacAddress) -> Option<&Node> {
        self.nodes.get(mac)
    }

    /// Iterates over the tracked nodes.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns the number of tracked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Merges a fresh snapshot into the registry.
    ///
    /// A node seen for the first time is reported in `added` only, whatever
    /// its online flag. Online-flag edges are reported for nodes that were
    /// already tracked.
    pub fn reconcile(&mut self, snapshot: NodeSnapshot) -> NodeReconcile {
        let mut result = NodeReconcile::default();

        for (mac, raw) in snapshot {
            let fresh = Node::from_raw(mac, raw);
            match self.nodes.get_mut(&mac) {
                Some(node) => {
                    if *node == fresh {
                        continue;
                    }
                    if node.online != fresh.online {
                        let transition = if fresh.online {
                            Transition::Reconnected
                        } else {
                            Transition::Disconnected
                        };
                        result.transitions.push((mac, transition));
                    }
                    *node = fresh;
                    result.updated.push(mac);
                }
                None => {
                    self.nodes.insert(mac, fresh);
                    result.added.push(mac);
                }
            }
        }

        result.added.sort_unstable();
        result.updated.sort_unstable();
        result.transitions.sort_unstable_by_key(|(mac, _)| *mac);
        result.summary = self.summary();

        tracing::debug!(
            added = result.added.len(),
            updated = result.updated.len(),
            online = result.summary.online,
            "Reconciled mesh nodes"
        );

        result
    }

    /// Computes the mesh aggregates.
    #[must_use]
    pub fn summary(&self) -> NodeSummary {
        let mut online_list: Vec<MacAddress> = self
            .nodes
            .values()
            .filter(|n| n.online)
            .map(|n| n.mac)
            .collect();
        online_list.sort_unstable();

        NodeSummary {
            total: self.nodes.len(),
            online: online_list.len(),
            online_list,
        }
    }
}
