// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gate for outbound connectivity events.

use std::collections::HashMap;

use super::{DomainEvent, EventKind};
use crate::client::ClientFilter;

/// Decides which connectivity events leave the engine.
///
/// The MAC filter is evaluated first: an event about a filtered-out MAC is
/// suppressed whatever its enable flag. Events without a MAC, or whose MAC
/// passes, are then emitted if their enable flag is set. Every kind without
/// an explicit flag is enabled.
///
/// # Examples
///
/// ```
/// use meshwatch_lib::client::{ClientFilter, FilterMode, ClientIdentity};
/// use meshwatch_lib::event::{DomainEvent, EventKind, EventPayload, EventRouter};
///
/// let mac = "aa:bb:cc:dd:ee:ff".parse().unwrap();
/// let router = EventRouter::new(ClientFilter::new(FilterMode::Exclude, [mac]));
///
/// let event = DomainEvent::new(
///     EventKind::DeviceConnected,
///     EventPayload::from_client(&ClientIdentity::new(mac)),
/// );
/// assert!(!router.emit(&event));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    filter: ClientFilter,
    enabled: HashMap<EventKind, bool>,
}

impl EventRouter {
    /// Creates a router with every event enabled.
    #[must_use]
    pub fn new(filter: ClientFilter) -> Self {
        Self {
            filter,
            enabled: HashMap::new(),
        }
    }

    /// Sets the enable flags.
    #[must_use]
    pub fn with_enabled(mut self, enabled: HashMap<EventKind, bool>) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enables or disables one event kind.
    pub fn set_enabled(&mut self, kind: EventKind, enabled: bool) {
        self.enabled.insert(kind, enabled);
    }

    /// Replaces the MAC filter.
    pub fn set_filter(&mut self, filter: ClientFilter) {
        self.filter = filter;
    }

    /// Returns `true` if `kind` is enabled.
    #[must_use]
    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.enabled
            .get(&kind)
            .copied()
            .unwrap_or(true)
    }

    /// Returns `true` if `event` should be emitted.
    #[must_use]
    pub fn emit(&self, event: &DomainEvent) -> bool {
        if let Some(mac) = event.payload.mac
            && !self.filter.allows(&mac)
        {
            return false;
        }
        self.is_enabled(event.kind)
    }
}
