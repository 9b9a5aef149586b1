// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted device source shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use meshwatch_lib::client::{ClientSnapshot, RawClient};
use meshwatch_lib::error::FetchError;
use meshwatch_lib::event::EngineEvent;
use meshwatch_lib::mesh::{NodeSnapshot, RawNode};
use meshwatch_lib::rules::RuleSnapshot;
use meshwatch_lib::source::{DeviceSource, SensorGroupInfo, SensorGroups, SensorValues};
use meshwatch_lib::types::MacAddress;
use parking_lot::Mutex;
use tokio::sync::broadcast;

#[derive(Default)]
struct Script {
    clients: ClientSnapshot,
    nodes: NodeSnapshot,
    rules: RuleSnapshot,
    groups: SensorGroups,
    group_values: HashMap<String, SensorValues>,
    failing: bool,
    discovery_failing: bool,
    fetch_delay: Duration,
    client_fetches: usize,
    group_fetches: HashMap<String, usize>,
}

/// A device source whose snapshots are set by the test.
///
/// Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_clients(&self, clients: impl IntoIterator<Item = (MacAddress, RawClient)>) {
        self.script.lock().clients = clients.into_iter().collect();
    }

    pub fn set_nodes(&self, nodes: impl IntoIterator<Item = (MacAddress, RawNode)>) {
        self.script.lock().nodes = nodes.into_iter().collect();
    }

    pub fn set_rules(&self, rules: RuleSnapshot) {
        self.script.lock().rules = rules;
    }

    pub fn add_group(&self, name: &str, info: SensorGroupInfo) {
        self.script.lock().groups.insert(name.to_string(), info);
    }

    pub fn set_group_values(&self, name: &str, values: SensorValues) {
        self.script
            .lock()
            .group_values
            .insert(name.to_string(), values);
    }

    pub fn set_failing(&self, failing: bool) {
        self.script.lock().failing = failing;
    }

    pub fn set_discovery_failing(&self, failing: bool) {
        self.script.lock().discovery_failing = failing;
    }

    /// Makes every client fetch wait `delay` before answering.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.script.lock().fetch_delay = delay;
    }

    pub fn client_fetches(&self) -> usize {
        self.script.lock().client_fetches
    }

    pub fn group_fetches(&self, name: &str) -> usize {
        self.script
            .lock()
            .group_fetches
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

impl DeviceSource for ScriptedSource {
    async fn fetch_clients(&self) -> Result<ClientSnapshot, FetchError> {
        let delay = {
            let mut script = self.script.lock();
            script.client_fetches += 1;
            script.fetch_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let script = self.script.lock();
        if script.failing {
            return Err(FetchError::Unavailable);
        }
        Ok(script.clients.clone())
    }

    async fn fetch_nodes(&self) -> Result<NodeSnapshot, FetchError> {
        let script = self.script.lock();
        if script.failing {
            return Err(FetchError::Unavailable);
        }
        Ok(script.nodes.clone())
    }

    async fn fetch_rules(&self) -> Result<RuleSnapshot, FetchError> {
        let script = self.script.lock();
        if script.failing {
            return Err(FetchError::Unavailable);
        }
        Ok(script.rules.clone())
    }

    async fn fetch_available_sensor_groups(&self) -> Result<SensorGroups, FetchError> {
        let script = self.script.lock();
        if script.discovery_failing {
            return Err(FetchError::ConnectionFailed("discovery".to_string()));
        }
        Ok(script.groups.clone())
    }

    async fn fetch_sensor_group(
        &self,
        group: &str,
        _poll_method: &str,
    ) -> Result<SensorValues, FetchError> {
        let mut script = self.script.lock();
        *script.group_fetches.entry(group.to_string()).or_default() += 1;
        if script.failing {
            return Err(FetchError::Unavailable);
        }
        Ok(script.group_values.get(group).cloned().unwrap_or_default())
    }
}

pub fn mac(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, 0, n])
}

/// Collects every event already published on the bus.
pub fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Returns the names of the signals among `events`.
pub fn signal_names(events: &[EngineEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(EngineEvent::as_signal)
        .map(|s| s.name().into_owned())
        .collect()
}

/// Returns the names of the connectivity events among `events`.
pub fn event_names(events: &[EngineEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter_map(EngineEvent::as_domain)
        .map(|e| e.name())
        .collect()
}
