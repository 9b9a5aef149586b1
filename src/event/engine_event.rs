// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events published on the engine bus.

use serde::{Deserialize, Serialize};

use super::{DomainEvent, EngineId, Signal};

/// Events published by a synchronization engine.
///
/// # Examples
///
/// ```
/// use meshwatch_lib::event::{EngineEvent, EngineId, Signal};
///
/// let engine_id = EngineId::new();
/// let event = EngineEvent::signal(engine_id, Signal::DeviceUpdate);
/// assert_eq!(event.engine_id(), engine_id);
/// assert!(event.is_signal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A refresh signal.
    Signal {
        /// The engine that produced the signal.
        engine_id: EngineId,
        /// The signal.
        signal: Signal,
    },

    /// A connectivity event that passed the event router.
    Domain {
        /// The engine that produced the event.
        engine_id: EngineId,
        /// The event.
        event: DomainEvent,
    },

    /// The device source became reachable or unreachable.
    ///
    /// Published only on edges, not on every failed fetch.
    Availability {
        /// The engine whose source changed availability.
        engine_id: EngineId,
        /// Whether the source is reachable.
        available: bool,
        /// Error that made the source unreachable.
        error: Option<String>,
    },
}

impl EngineEvent {
    /// Returns the engine id associated with this event.
    #[must_use]
    pub fn engine_id(&self) -> EngineId {
        match self {
            Self::Signal { engine_id, .. }
            | Self::Domain { engine_id, .. }
            | Self::Availability { engine_id, .. } => *engine_id,
        }
    }

    /// Returns `true` if this is a refresh signal.
    #[must_use]
    pub fn is_signal(&self) -> bool {
        matches!(self, Self::Signal { .. })
    }

    /// Returns `true` if this is a connectivity event.
    #[must_use]
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    /// Returns the signal, if this is one.
    #[must_use]
    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Self::Signal { signal, .. } => Some(signal),
            _ => None,
        }
    }

    /// Returns the connectivity event, if this is one.
    #[must_use]
    pub fn as_domain(&self) -> Option<&DomainEvent> {
        match self {
            Self::Domain { event, .. } => Some(event),
            _ => None,
        }
    }

    /// Creates a signal event.
    #[must_use]
    pub fn signal(engine_id: EngineId, signal: Signal) -> Self {
        Self::Signal { engine_id, signal }
    }

    /// Creates a connectivity event.
    #[must_use]
    pub fn domain(engine_id: EngineId, event: DomainEvent) -> Self {
        Self::Domain { engine_id, event }
    }

    /// Creates an availability event.
    #[must_use]
    pub fn availability(engine_id: EngineId, available: bool, error: Option<String>) -> Self {
        Self::Availability {
            engine_id,
            available,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, EventPayload};

    #[test]
    fn accessors() {
        let id = EngineId::new();
        let domain = EngineEvent::domain(
            id,
            DomainEvent::new(EventKind::NodeConnected, EventPayload::default()),
        );
        assert!(domain.is_domain());
        assert!(domain.as_signal().is_none());
        assert_eq!(
            domain.as_domain().map(|e| e.kind),
            Some(EventKind::NodeConnected)
        );

        let lost = EngineEvent::availability(id, false, Some("timeout".into()));
        assert_eq!(lost.engine_id(), id);
        assert!(!lost.is_signal());
    }

    #[test]
    fn serializes_tagged() {
        let event = EngineEvent::signal(EngineId::new(), Signal::AimeshNew);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "signal");
        assert_eq!(json["signal"], "aimesh-new");
    }
}
