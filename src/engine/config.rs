// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::{ClientFilter, DEFAULT_HISTORY_CAP};
use crate::error::ConfigError;
use crate::event::{DEFAULT_CHANNEL_CAPACITY, EventKind};
use crate::scheduler::group;

/// Configuration of a synchronization engine.
///
/// Durations are given in seconds when deserialized.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use meshwatch_lib::engine::EngineConfig;
/// use meshwatch_lib::event::EventKind;
///
/// let config = EngineConfig::new()
///     .with_poll_interval(Duration::from_secs(30))
///     .with_group_interval("cpu", Duration::from_secs(10))
///     .with_consider_home(Duration::from_secs(45))
///     .with_event(EventKind::DeviceReconnected, false);
/// assert!(config.validate().is_ok());
///
/// let config: EngineConfig = serde_json::from_str(
///     r#"{"poll_interval": 60, "group_intervals": {"wan": 15}, "consider_home": 90}"#,
/// ).unwrap();
/// assert_eq!(config.interval_for("wan"), Duration::from_secs(15));
/// assert_eq!(config.interval_for("cpu"), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Interval of the main reconciliation loop and default group interval.
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    /// Per-group refresh intervals.
    #[serde(with = "duration_map_secs")]
    pub group_intervals: HashMap<String, Duration>,
    /// How long a client may be absent before it counts as disconnected.
    #[serde(with = "duration_secs")]
    pub consider_home: Duration,
    /// Client filter.
    pub client_filter: ClientFilter,
    /// Maximum number of recent-connection entries.
    pub recent_history_cap: usize,
    /// Per-event enable flags. Missing kinds use their default.
    pub events: HashMap<EventKind, bool>,
    /// Capacity of the event bus.
    pub event_capacity: usize,
}

impl EngineConfig {
    /// Default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
    /// Default consider-home window.
    pub const DEFAULT_CONSIDER_HOME: Duration = Duration::from_secs(45);

    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            group_intervals: HashMap::new(),
            consider_home: Self::DEFAULT_CONSIDER_HOME,
            client_filter: ClientFilter::disabled(),
            recent_history_cap: DEFAULT_HISTORY_CAP,
            events: HashMap::new(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Sets the main poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the refresh interval of one sensor group.
    #[must_use]
    pub fn with_group_interval(mut self, group: impl Into<String>, interval: Duration) -> Self {
        self.group_intervals.insert(group.into(), interval);
        self
    }

    /// Sets the consider-home window.
    #[must_use]
    pub fn with_consider_home(mut self, consider_home: Duration) -> Self {
        self.consider_home = consider_home;
        self
    }

    /// Sets the client filter.
    #[must_use]
    pub fn with_client_filter(mut self, filter: ClientFilter) -> Self {
        self.client_filter = filter;
        self
    }

    /// Sets the recent-connection history cap.
    #[must_use]
    pub fn with_recent_history_cap(mut self, cap: usize) -> Self {
        self.recent_history_cap = cap;
        self
    }

    /// Enables or disables one event kind.
    #[must_use]
    pub fn with_event(mut self, kind: EventKind, enabled: bool) -> Self {
        self.events.insert(kind, enabled);
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Returns the refresh interval of `group`, falling back to the poll
    /// interval.
    #[must_use]
    pub fn interval_for(&self, group: &str) -> Duration {
        self.group_intervals
            .get(group)
            .copied()
            .unwrap_or(self.poll_interval)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInterval`] for a zero interval and
    /// [`ConfigError::UnpolledSensorGroup`] for an interval set on a group
    /// that has no timer of its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidInterval("poll_interval".to_string()));
        }
        for (name, interval) in &self.group_intervals {
            if !group::is_polled(name) {
                return Err(ConfigError::UnpolledSensorGroup(name.clone()));
            }
            if interval.is_zero() {
                return Err(ConfigError::InvalidInterval(name.clone()));
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod duration_map_secs {
    use std::collections::HashMap;
    use std::time::Duration;

    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        map: &HashMap<String, Duration>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let mut out = s.serialize_map(Some(map.len()))?;
        for (k, v) in map {
            out.serialize_entry(k, &v.as_secs())?;
        }
        out.end()
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<HashMap<String, Duration>, D::Error> {
        let raw = HashMap::<String, u64>::deserialize(d)?;
        Ok(raw
            .into_iter()
            .map(|(k, v)| (k, Duration::from_secs(v)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FilterMode;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.consider_home, Duration::from_secs(45));
        assert_eq!(config.recent_history_cap, 5);
        assert_eq!(config.event_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_intervals() {
        let config = EngineConfig::new().with_poll_interval(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidInterval("poll_interval".to_string()))
        );

        let config = EngineConfig::new().with_group_interval("cpu", Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidInterval("cpu".to_string()))
        );
    }

    #[test]
    fn validate_rejects_unpolled_group_interval() {
        let config = EngineConfig::new().with_group_interval("devices", Duration::from_secs(5));
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnpolledSensorGroup("devices".to_string()))
        );
    }

    #[test]
    fn deserializes_full_document() {
        let config: EngineConfig = serde_json::from_str(
            r#"{
                "poll_interval": 20,
                "group_intervals": {"cpu": 5},
                "consider_home": 120,
                "client_filter": {"mode": "include", "list": ["aa:bb:cc:dd:ee:ff"]},
                "recent_history_cap": 10,
                "events": {"device_reconnected": false},
                "event_capacity": 64
            }"#,
        )
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_secs(20));
        assert_eq!(config.interval_for("cpu"), Duration::from_secs(5));
        assert_eq!(config.consider_home, Duration::from_secs(120));
        assert_eq!(config.client_filter.mode, FilterMode::Include);
        assert_eq!(config.recent_history_cap, 10);
        assert_eq!(config.events.get(&EventKind::DeviceReconnected), Some(&false));
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn serializes_durations_as_seconds() {
        let config = EngineConfig::new().with_group_interval("wan", Duration::from_secs(15));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["poll_interval"], 30);
        assert_eq!(json["group_intervals"]["wan"], 15);
    }
}
