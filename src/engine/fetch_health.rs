// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge detection for fetch failures.

/// An availability edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    /// Fetches started failing.
    Lost,
    /// Fetches succeed again after failing.
    Recovered {
        /// Number of failed passes in the outage.
        failures: u32,
    },
}

/// Tracks whether the device source is currently failing.
///
/// Only edges are reported so that an unreachable device logs once, not
/// once per tick.
#[derive(Debug, Clone, Default)]
pub struct FetchHealth {
    failures: u32,
}

impl FetchHealth {
    /// Creates a tracker in the healthy state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while fetches are failing.
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.failures > 0
    }

    /// Returns the number of consecutive failed passes.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Records a failed pass. Returns [`HealthEvent::Lost`] on the first one.
    pub fn record_failure(&mut self) -> Option<HealthEvent> {
        self.failures = self.failures.saturating_add(1);
        (self.failures == 1).then_some(HealthEvent::Lost)
    }

    /// Records a successful pass. Returns [`HealthEvent::Recovered`] if the
    /// previous passes failed.
    pub fn record_success(&mut self) -> Option<HealthEvent> {
        let failures = std::mem::take(&mut self.failures);
        (failures > 0).then_some(HealthEvent::Recovered { failures })
    }
}
