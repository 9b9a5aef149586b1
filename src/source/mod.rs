// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device sources.
//!
//! The engine never talks to a router directly. It asks a [`DeviceSource`]
//! for the current raw snapshots and reconciles whatever comes back.
//!
//! # Sources
//!
//! - [`HttpSource`]: fetches JSON documents from an HTTP bridge (feature `http`)
//!
//! Any other transport only needs to produce the raw snapshot types;
//! [`snapshot`] turns loosely typed JSON documents into them.

#[cfg(feature = "http")]
mod http;
pub mod snapshot;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::client::ClientSnapshot;
use crate::error::FetchError;
use crate::mesh::NodeSnapshot;
use crate::rules::RuleSnapshot;

#[cfg(feature = "http")]
pub use http::{HttpSource, HttpSourceBuilder, HttpSourceConfig};

/// Values of one sensor group, keyed by sensor key.
pub type SensorValues = BTreeMap<String, serde_json::Value>;

/// Sensor groups offered by a device, keyed by group name.
pub type SensorGroups = HashMap<String, SensorGroupInfo>;

/// Description of one sensor group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorGroupInfo {
    /// Keys of the sensors in the group.
    #[serde(default)]
    pub sensor_keys: Vec<String>,
    /// Opaque method name passed back to [`DeviceSource::fetch_sensor_group`].
    #[serde(default)]
    pub poll_method: String,
}

impl SensorGroupInfo {
    /// Creates a group description.
    #[must_use]
    pub fn new<I, S>(sensor_keys: I, poll_method: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sensor_keys: sensor_keys.into_iter().map(Into::into).collect(),
            poll_method: poll_method.into(),
        }
    }

    /// Keeps only the values of sensors declared by this group.
    #[must_use]
    pub fn restrict(&self, mut values: SensorValues) -> SensorValues {
        values.retain(|key, _| self.sensor_keys.iter().any(|k| k == key));
        values
    }
}

/// Collaborator providing raw snapshots of one device.
///
/// Implementations own their connection and authentication state. Every
/// method is a point-in-time read; the engine never mutates the source.
pub trait DeviceSource: Send + Sync + 'static {
    /// Fetches the client list.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the device cannot be reached or answers
    /// with something unusable.
    fn fetch_clients(&self) -> impl Future<Output = Result<ClientSnapshot, FetchError>> + Send;

    /// Fetches the mesh node list.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on failure.
    fn fetch_nodes(&self) -> impl Future<Output = Result<NodeSnapshot, FetchError>> + Send;

    /// Fetches the parental-control rules.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on failure.
    fn fetch_rules(&self) -> impl Future<Output = Result<RuleSnapshot, FetchError>> + Send;

    /// Lists the sensor groups the device offers.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on failure.
    fn fetch_available_sensor_groups(
        &self,
    ) -> impl Future<Output = Result<SensorGroups, FetchError>> + Send;

    /// Fetches the current values of one sensor group.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on failure.
    fn fetch_sensor_group(
        &self,
        group: &str,
        poll_method: &str,
    ) -> impl Future<Output = Result<SensorValues, FetchError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restrict_drops_undeclared_keys() {
        let info = SensorGroupInfo::new(["load_1", "load_5"], "get_load");
        let values = SensorValues::from([
            ("load_1".to_string(), serde_json::json!(0.5)),
            ("load_15".to_string(), serde_json::json!(0.1)),
        ]);

        let restricted = info.restrict(values);
        assert_eq!(restricted.len(), 1);
        assert!(restricted.contains_key("load_1"));
    }

    #[test]
    fn group_info_serde_round_trip() {
        let info = SensorGroupInfo::new(["rx", "tx"], "get_traffic");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(serde_json::from_str::<SensorGroupInfo>(&json).unwrap(), info);
    }
}
