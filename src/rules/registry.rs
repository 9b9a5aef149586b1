// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of parental-control rules.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::{RawRule, Rule, RuleSnapshot};
use crate::types::MacAddress;

/// Outcome of one rule reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleReconcile {
    /// Whether the set of targeted MACs changed.
    pub changed: bool,
    /// Newly targeted MACs.
    pub added: Vec<MacAddress>,
    /// MACs no longer targeted.
    pub removed: Vec<MacAddress>,
    /// Rules whose policy changed.
    pub updated: Vec<MacAddress>,
}

/// Owns the rules, keyed by target MAC.
///
/// Membership strictly follows the latest snapshot: rules are created,
/// replaced and dropped without debounce.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<MacAddress, Rule>,
}

impl RuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rule targeting `mac`.
    #[must_use]
    pub fn get(&self, mac: &MacAddress) -> Option<&Rule> {
        self.rules.get(mac)
    }

    /// Iterates over the rules.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there is no rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the rules sorted by target MAC.
    #[must_use]
    pub fn sorted(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self.rules.values().cloned().collect();
        rules.sort_unstable_by_key(|r| r.mac);
        rules
    }

    /// Replaces the rule set with a fresh snapshot.
    ///
    /// Malformed entries are dropped. `changed` reports membership changes
    /// only; policy edits on existing targets land in `updated`.
    pub fn reconcile(&mut self, snapshot: RuleSnapshot) -> RuleReconcile {
        let mut entries: Vec<(String, RawRule)> = snapshot.rules.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        // Keys spelling the same MAC differently collide; the canonical
        // spelling wins, otherwise the smallest key.
        let mut next: HashMap<MacAddress, (Rule, bool)> = HashMap::with_capacity(entries.len());
        let mut dropped = 0usize;

        for (key, raw) in entries {
            let Some(rule) = Rule::from_raw(&key, raw) else {
                dropped += 1;
                continue;
            };
            let canonical = key == rule.mac.to_string();
            match next.entry(rule.mac) {
                Entry::Vacant(slot) => {
                    slot.insert((rule, canonical));
                }
                Entry::Occupied(mut slot) => {
                    tracing::debug!(mac = %rule.mac, key = %key, "Duplicate rule target");
                    dropped += 1;
                    if canonical && !slot.get().1 {
                        slot.insert((rule, true));
                    }
                }
            }
        }
        let next: HashMap<MacAddress, Rule> =
            next.into_iter().map(|(mac, (rule, _))| (mac, rule)).collect();

        let mut result = RuleReconcile::default();
        for (mac, rule) in &next {
            match self.rules.get(mac) {
                None => result.added.push(*mac),
                Some(previous) if previous != rule => result.updated.push(*mac),
                Some(_) => {}
            }
        }
        result.removed = self
            .rules
            .keys()
            .filter(|mac| !next.contains_key(mac))
            .copied()
            .collect();

        result.added.sort_unstable();
        result.removed.sort_unstable();
        result.updated.sort_unstable();
        result.changed = !result.added.is_empty() || !result.removed.is_empty();

        self.rules = next;

        tracing::debug!(
            rules = self.rules.len(),
            added = result.added.len(),
            removed = result.removed.len(),
            dropped,
            "Reconciled parental-control rules"
        );

        result
    }
}
