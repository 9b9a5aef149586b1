// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded history of recently connected clients.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::ClientIdentity;
use crate::types::MacAddress;

/// Default number of entries kept in the history.
pub const DEFAULT_HISTORY_CAP: usize = 5;

/// Recently connected clients, oldest connection first.
///
/// Entries for currently connected clients always win over entries for
/// clients that have since left: when the cap is exceeded the oldest
/// disconnected entry goes first, and a connected entry is only displaced
/// once no disconnected entry is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentHistory {
    cap: usize,
    entries: Vec<ClientIdentity>,
}

impl RecentHistory {
    /// Creates an empty history holding at most `cap` entries.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: Vec::new(),
        }
    }

    /// Returns the configured cap.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Returns the entries, oldest connection first.
    #[must_use]
    pub fn entries(&self) -> &[ClientIdentity] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges the currently connected clients into the history.
    ///
    /// Entries without a connection time sort as `now`.
    pub fn update(&mut self, connected: Vec<ClientIdentity>, now: DateTime<Utc>) {
        let live: HashSet<MacAddress> = connected.iter().map(|c| c.mac).collect();

        let mut merged = connected;
        merged.extend(self.entries.drain(..).filter(|e| !live.contains(&e.mac)));
        merged.sort_by_key(|e| e.connected_since.unwrap_or(now));

        while merged.len() > self.cap {
            let victim = merged
                .iter()
                .position(|e| !live.contains(&e.mac))
                .unwrap_or(0);
            merged.remove(victim);
        }

        self.entries = merged;
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}
