// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debounced presence state machine.
//!
//! A client that disappears from a poll is not immediately considered gone:
//! it stays connected until it has been absent for longer than the
//! consider-home window. This absorbs transient poll gaps and radio roaming.
//!
//! | previous       | observation       | elapsed > window | next           | transition     |
//! |----------------|-------------------|------------------|----------------|----------------|
//! | any            | connected         | -                | `Connected`    | `Reconnected` if previous was `Disconnected` |
//! | `Connected`    | absent / negative | yes              | `Disconnected` | `Disconnected` |
//! | `Connected`    | absent / negative | no               | `Connected`    | -              |
//! | other          | absent / negative | -                | unchanged      | -              |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{Client, RawClient};
use crate::types::{MacAddress, PresenceState};

/// A presence edge produced by an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transition {
    /// A disconnected client was seen again.
    Reconnected,
    /// A connected client exceeded the consider-home window.
    Disconnected,
}

/// Result of observing one tracked client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// State after the observation.
    pub state: PresenceState,
    /// Presence edge, if any.
    pub transition: Option<Transition>,
    /// Whether identity fields changed.
    pub identity_changed: bool,
}

/// Applies the consider-home debounce to client observations.
#[derive(Debug, Clone, Copy)]
pub struct PresenceTracker {
    consider_home: Duration,
}

impl PresenceTracker {
    /// Creates a tracker with the given consider-home window.
    #[must_use]
    pub const fn new(consider_home: Duration) -> Self {
        Self { consider_home }
    }

    /// Returns the consider-home window.
    #[must_use]
    pub const fn consider_home(&self) -> Duration {
        self.consider_home
    }

    /// Handles the first-ever observation of a MAC.
    ///
    /// Only connected entries are materialized. Clients first seen offline
    /// are part of the device's history, not of the live network.
    #[must_use]
    pub fn admit(&self, mac: MacAddress, entry: &RawClient, now: Instant) -> Option<Client> {
        entry
            .state
            .is_connected()
            .then(|| Client::from_raw(mac, entry, now))
    }

    /// Observes a tracked client against its snapshot entry (or its absence).
    ///
    /// The outcome depends only on the previous state, whether the entry
    /// reports the client connected, and the time since the last positive
    /// observation.
    pub fn observe(
        &self,
        client: &mut Client,
        entry: Option<&RawClient>,
        now: Instant,
    ) -> Observation {
        let previous = client.state();

        if let Some(raw) = entry.filter(|raw| raw.state.is_connected()) {
            let identity_changed = client.apply_identity(raw);
            client.touch(now);
            client.set_state(PresenceState::Connected);

            return Observation {
                state: PresenceState::Connected,
                transition: (previous == PresenceState::Disconnected)
                    .then_some(Transition::Reconnected),
                identity_changed,
            };
        }

        let expired = client
            .last_activity()
            .is_none_or(|last| now.saturating_duration_since(last) > self.consider_home);

        if previous == PresenceState::Connected && expired {
            client.set_state(PresenceState::Disconnected);
            client.clear_connected_since();
            return Observation {
                state: PresenceState::Disconnected,
                transition: Some(Transition::Disconnected),
                identity_changed: false,
            };
        }

        Observation {
            state: previous,
            transition: None,
            identity_changed: false,
        }
    }
}
