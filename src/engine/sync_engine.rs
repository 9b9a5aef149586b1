// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The device state synchronization engine.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::time::Instant;

use super::config::EngineConfig;
use super::fetch_health::{FetchHealth, HealthEvent};
use super::published::PublishedState;
use crate::client::{
    Client, ClientFilter, ClientIdentity, ClientReconcile, ClientRegistry, ClientSnapshot,
    ClientSummary,
};
use crate::error::{ConfigError, FetchError, Result};
use crate::event::{
    DomainEvent, EngineEvent, EngineId, EventBus, EventKind, EventPayload, EventRouter, Signal,
};
use crate::mesh::{Node, NodeReconcile, NodeRegistry, NodeSnapshot, NodeSummary};
use crate::rules::{Rule, RuleReconcile, RuleRegistry, RuleSnapshot};
use crate::scheduler::{GroupCoordinator, group};
use crate::source::{DeviceSource, SensorGroupInfo, SensorValues};
use crate::types::MacAddress;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Client reconciliation result.
    pub clients: ClientReconcile,
    /// Node reconciliation result.
    pub nodes: NodeReconcile,
    /// Rule reconciliation result.
    pub rules: RuleReconcile,
    /// Signals published after the pass.
    pub signals: Vec<Signal>,
    /// Connectivity events that passed the event router.
    pub events: Vec<DomainEvent>,
}

/// Outcome of [`SyncEngine::poll`].
#[derive(Debug)]
pub enum PassOutcome {
    /// All snapshots were fetched and reconciled.
    Reconciled(PassReport),
    /// A fetch failed; nothing was reconciled.
    FetchFailed(FetchError),
}

impl PassOutcome {
    /// Returns `true` if the pass reconciled fresh snapshots.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        matches!(self, Self::Reconciled(_))
    }

    /// Returns the pass report, if the pass reconciled.
    #[must_use]
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            Self::Reconciled(report) => Some(report),
            Self::FetchFailed(_) => None,
        }
    }
}

#[derive(Debug)]
struct PolledGroup {
    info: SensorGroupInfo,
    coordinator: GroupCoordinator<SensorValues>,
    health: FetchHealth,
}

impl PolledGroup {
    fn new(info: SensorGroupInfo) -> Self {
        Self {
            info,
            coordinator: GroupCoordinator::new(),
            health: FetchHealth::new(),
        }
    }
}

#[derive(Debug)]
struct EngineState {
    clients: ClientRegistry,
    nodes: NodeRegistry,
    rules: RuleRegistry,
    router: EventRouter,
    health: FetchHealth,
    devices: GroupCoordinator<ClientSummary>,
    aimesh: GroupCoordinator<NodeSummary>,
    pc_rules: GroupCoordinator<Vec<Rule>>,
    groups: BTreeMap<String, PolledGroup>,
    generation: u64,
    last_reconciled: Option<DateTime<Utc>>,
}

struct EngineInner<S> {
    id: EngineId,
    source: S,
    config: EngineConfig,
    bus: EventBus,
    state: Mutex<EngineState>,
    published: watch::Sender<Arc<PublishedState>>,
}

/// Synchronizes the state of one router with its mesh.
///
/// The engine owns the client, node and rule registries. Every call to
/// [`poll`](Self::poll) fetches fresh snapshots from the [`DeviceSource`],
/// reconciles them, publishes the settled state and broadcasts the
/// resulting signals and connectivity events on the event bus.
///
/// Passes are serialized: a pass, including registry mutation and event
/// emission, completes before the next one starts. Read accessors never
/// wait for a pass in flight; they return the state published by the last
/// completed one.
///
/// The engine is cheap to clone; clones share the same state.
///
/// # Examples
///
/// ```no_run
/// use meshwatch_lib::engine::{EngineConfig, SyncEngine};
/// use meshwatch_lib::source::HttpSourceBuilder;
///
/// # async fn example() -> meshwatch_lib::Result<()> {
/// let source = HttpSourceBuilder::new().base_url("http://192.168.1.1:8080").build()?;
/// let engine = SyncEngine::new(source, EngineConfig::default())?;
///
/// let mut events = engine.subscribe();
/// engine.poll().await;
///
/// for client in engine.current_clients() {
///     println!("{} {:?}", client.display_name(), client.state());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SyncEngine<S> {
    inner: Arc<EngineInner<S>>,
}

impl<S> Clone for SyncEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl<S: DeviceSource> SyncEngine<S> {
    /// Creates an engine polling `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is invalid.
    pub fn new(source: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let id = EngineId::new();
        let router =
            EventRouter::new(config.client_filter.clone()).with_enabled(config.events.clone());
        let state = EngineState {
            clients: ClientRegistry::new(config.client_filter.clone(), config.recent_history_cap),
            nodes: NodeRegistry::new(),
            rules: RuleRegistry::new(),
            router,
            health: FetchHealth::new(),
            devices: GroupCoordinator::new(),
            aimesh: GroupCoordinator::new(),
            pc_rules: GroupCoordinator::new(),
            groups: BTreeMap::new(),
            generation: 0,
            last_reconciled: None,
        };
        let (published, _) = watch::channel(Arc::new(PublishedState::default()));

        tracing::debug!(engine_id = %id, "Created sync engine");

        Ok(Self {
            inner: Arc::new(EngineInner {
                id,
                source,
                bus: EventBus::with_capacity(config.event_capacity),
                config,
                state: Mutex::new(state),
                published,
            }),
        })
    }

    /// Returns the engine id.
    #[must_use]
    pub fn id(&self) -> EngineId {
        self.inner.id
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the device source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Subscribes to engine events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.inner.bus.subscribe()
    }

    /// Returns a receiver notified whenever new state is published.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<PublishedState>> {
        self.inner.published.subscribe()
    }

    /// Returns the last published state.
    #[must_use]
    pub fn published(&self) -> Arc<PublishedState> {
        Arc::clone(&self.inner.published.borrow())
    }

    /// Returns the active clients, sorted by MAC.
    #[must_use]
    pub fn current_clients(&self) -> Vec<Client> {
        self.published().clients.values().cloned().collect()
    }

    /// Returns the mesh nodes, sorted by MAC.
    #[must_use]
    pub fn current_nodes(&self) -> Vec<Node> {
        self.published().nodes.values().cloned().collect()
    }

    /// Returns the parental-control rules, sorted by target MAC.
    #[must_use]
    pub fn current_rules(&self) -> Vec<Rule> {
        self.published().rules.values().cloned().collect()
    }

    /// Returns the recent connections, oldest first.
    #[must_use]
    pub fn recent_clients(&self) -> Vec<ClientIdentity> {
        self.published().recent.clone()
    }

    /// Returns the client aggregates.
    #[must_use]
    pub fn client_summary(&self) -> ClientSummary {
        self.published().client_summary.clone()
    }

    /// Returns the mesh aggregates.
    #[must_use]
    pub fn node_summary(&self) -> NodeSummary {
        self.published().node_summary.clone()
    }

    /// Returns the last values of a polled sensor group.
    #[must_use]
    pub fn group_values(&self, group: &str) -> Option<SensorValues> {
        self.published().groups.get(group).cloned()
    }

    /// Returns `true` if the last pass reached the device.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.published().available
    }

    /// Runs one reconciliation pass.
    ///
    /// Clients, nodes and rules are fetched first. If any fetch fails the
    /// registries are left untouched and [`PassOutcome::FetchFailed`] is
    /// returned. Failures are logged once when the source starts failing
    /// and once when it recovers.
    pub async fn poll(&self) -> PassOutcome {
        let mut state = self.inner.state.lock().await;
        let source = &self.inner.source;

        let fetched = tokio::try_join!(
            source.fetch_clients(),
            source.fetch_nodes(),
            source.fetch_rules()
        );

        let (clients, nodes, rules) = match fetched {
            Ok(snapshots) => snapshots,
            Err(error) => {
                self.on_fetch_failure(&mut state, &error);
                return PassOutcome::FetchFailed(error);
            }
        };

        let mut outbound = Vec::new();
        if let Some(HealthEvent::Recovered { failures }) = state.health.record_success() {
            tracing::info!(engine_id = %self.inner.id, failures, "Device source recovered");
            outbound.push(EngineEvent::availability(self.inner.id, true, None));
        }

        let report = self.reconcile(&mut state, clients, nodes, rules);
        self.publish(&mut state);
        drop(state);

        outbound.extend(
            report
                .signals
                .iter()
                .cloned()
                .map(|signal| EngineEvent::signal(self.inner.id, signal)),
        );
        outbound.extend(
            report
                .events
                .iter()
                .cloned()
                .map(|event| EngineEvent::domain(self.inner.id, event)),
        );
        for event in outbound {
            self.inner.bus.publish(event);
        }

        PassOutcome::Reconciled(report)
    }

    /// Refreshes one polled sensor group.
    ///
    /// Returns `true` if the group's values changed, in which case
    /// `<group>-update` is published.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnpolledSensorGroup`] for `devices` and
    /// `aimesh`, [`ConfigError::UnknownSensorGroup`] for a group that was
    /// not discovered, and [`Error::Fetch`](crate::Error::Fetch) if the
    /// values cannot be fetched.
    pub async fn refresh_group(&self, group: &str) -> Result<bool> {
        if !group::is_polled(group) {
            return Err(ConfigError::UnpolledSensorGroup(group.to_string()).into());
        }

        let mut state = self.inner.state.lock().await;
        let entry = state
            .groups
            .get_mut(group)
            .ok_or_else(|| ConfigError::UnknownSensorGroup(group.to_string()))?;

        let fetched = self
            .inner
            .source
            .fetch_sensor_group(group, &entry.info.poll_method)
            .await;

        let values = match fetched {
            Ok(values) => {
                if let Some(HealthEvent::Recovered { failures }) = entry.health.record_success() {
                    tracing::info!(
                        engine_id = %self.inner.id,
                        group = %group,
                        failures,
                        "Sensor group recovered"
                    );
                }
                entry.info.restrict(values)
            }
            Err(error) => {
                if entry.health.record_failure() == Some(HealthEvent::Lost) {
                    tracing::warn!(
                        engine_id = %self.inner.id,
                        group = %group,
                        error = %error,
                        "Failed to refresh sensor group"
                    );
                }
                return Err(error.into());
            }
        };

        let changed = entry.coordinator.maybe_refresh(values);
        if changed {
            tracing::debug!(engine_id = %self.inner.id, group = %group, "Sensor group changed");
            self.publish(&mut state);
            drop(state);
            self.inner.bus.publish(EngineEvent::signal(
                self.inner.id,
                Signal::GroupUpdate(group.to_string()),
            ));
        }
        Ok(changed)
    }

    /// Fetches the sensor groups offered by the device and registers the
    /// polled ones.
    ///
    /// Returns the names of the polled groups, sorted. Groups no longer
    /// offered are forgotten; groups still offered keep their last values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`](crate::Error::Fetch) if the list cannot be
    /// fetched.
    pub async fn discover_groups(&self) -> Result<Vec<String>> {
        let mut state = self.inner.state.lock().await;
        let available = self.inner.source.fetch_available_sensor_groups().await?;

        state.groups.retain(|name, _| available.contains_key(name));
        for (name, info) in available {
            if !group::is_polled(&name) {
                continue;
            }
            match state.groups.entry(name) {
                Entry::Occupied(mut slot) => slot.get_mut().info = info,
                Entry::Vacant(slot) => {
                    slot.insert(PolledGroup::new(info));
                }
            }
        }

        let names: Vec<String> = state.groups.keys().cloned().collect();
        tracing::debug!(engine_id = %self.inner.id, groups = ?names, "Discovered sensor groups");
        Ok(names)
    }

    /// Recreates client trackers known from a previous session.
    ///
    /// Restored clients are in the `Unknown` state until seen connected.
    /// Returns the number of restored trackers.
    pub async fn restore_clients(
        &self,
        identities: impl IntoIterator<Item = ClientIdentity>,
    ) -> usize {
        let mut state = self.inner.state.lock().await;
        let restored = state.clients.restore(identities);
        if restored > 0 {
            tracing::debug!(engine_id = %self.inner.id, restored, "Restored client trackers");
            self.publish(&mut state);
        }
        restored
    }

    /// Removes a client tracker on user request.
    ///
    /// Returns `true` if the client was tracked. The recent-connection
    /// history is not touched.
    pub async fn remove_client(&self, mac: &MacAddress) -> bool {
        let mut state = self.inner.state.lock().await;
        let removed = state.clients.remove(mac).is_some();
        if removed {
            tracing::debug!(engine_id = %self.inner.id, mac = %mac, "Removed client tracker");
            self.publish(&mut state);
        }
        removed
    }

    /// Replaces the client filter of both the working set and the event
    /// router. Filtered-out clients are kept and reappear if the filter is
    /// relaxed.
    pub async fn set_client_filter(&self, filter: ClientFilter) {
        let mut state = self.inner.state.lock().await;
        state.router.set_filter(filter.clone());
        state.clients.set_filter(filter);
        self.publish(&mut state);
    }

    fn on_fetch_failure(&self, state: &mut EngineState, error: &FetchError) {
        if state.health.record_failure() == Some(HealthEvent::Lost) {
            tracing::warn!(
                engine_id = %self.inner.id,
                error = %error,
                "Device source unavailable"
            );
            self.publish(state);
            self.inner.bus.publish(EngineEvent::availability(
                self.inner.id,
                false,
                Some(error.to_string()),
            ));
        } else {
            tracing::debug!(
                engine_id = %self.inner.id,
                failures = state.health.consecutive_failures(),
                "Device source still unavailable"
            );
        }
    }

    fn reconcile(
        &self,
        state: &mut EngineState,
        clients: ClientSnapshot,
        nodes: NodeSnapshot,
        rules: RuleSnapshot,
    ) -> PassReport {
        let now = Instant::now();
        let wall_now = Utc::now();

        let client_result =
            state
                .clients
                .reconcile(clients, self.inner.config.consider_home, now, wall_now);
        let node_result = state.nodes.reconcile(nodes);
        let rule_result = state.rules.reconcile(rules);

        let mut events = Vec::new();
        let client_event = |kind, mac: &MacAddress| {
            state
                .clients
                .get(mac)
                .map(|c| DomainEvent::new(kind, EventPayload::from_client(c.identity())))
        };
        events.extend(
            client_result
                .added
                .iter()
                .filter_map(|mac| client_event(EventKind::DeviceConnected, mac)),
        );
        events.extend(
            client_result
                .transitions
                .iter()
                .filter_map(|(mac, t)| client_event(EventKind::for_client(*t), mac)),
        );

        let node_event = |kind, mac: &MacAddress| {
            state
                .nodes
                .get(mac)
                .map(|n| DomainEvent::new(kind, EventPayload::from_node(n)))
        };
        events.extend(
            node_result
                .added
                .iter()
                .filter_map(|mac| node_event(EventKind::NodeConnected, mac)),
        );
        events.extend(
            node_result
                .transitions
                .iter()
                .filter_map(|(mac, t)| node_event(EventKind::for_node(*t), mac)),
        );

        events.retain(|event| state.router.emit(event));

        let mut signals = Vec::new();
        let devices_changed = state.devices.maybe_refresh(client_result.summary.clone());
        if devices_changed || !client_result.updated.is_empty() {
            signals.push(Signal::DeviceUpdate);
        }
        if !client_result.added.is_empty() {
            signals.push(Signal::DeviceNew);
        }
        let aimesh_changed = state.aimesh.maybe_refresh(node_result.summary.clone());
        if aimesh_changed || !node_result.updated.is_empty() {
            signals.push(Signal::AimeshUpdate);
        }
        if !node_result.added.is_empty() {
            signals.push(Signal::AimeshNew);
        }
        if state.pc_rules.maybe_refresh(state.rules.sorted()) {
            signals.push(Signal::PcRulesUpdate);
        }
        if !rule_result.added.is_empty() {
            signals.push(Signal::PcRulesNew);
        }

        state.last_reconciled = Some(wall_now);

        tracing::debug!(
            engine_id = %self.inner.id,
            clients = client_result.summary.connected,
            nodes = node_result.summary.total,
            rules = state.rules.len(),
            signals = signals.len(),
            events = events.len(),
            "Reconciliation pass complete"
        );

        PassReport {
            clients: client_result,
            nodes: node_result,
            rules: rule_result,
            signals,
            events,
        }
    }

    fn publish(&self, state: &mut EngineState) {
        state.generation += 1;

        let published = PublishedState {
            generation: state.generation,
            clients: state
                .clients
                .iter()
                .map(|(mac, client)| (*mac, client.clone()))
                .collect(),
            nodes: state.nodes.iter().map(|n| (n.mac, n.clone())).collect(),
            rules: state.rules.iter().map(|r| (r.mac, r.clone())).collect(),
            client_summary: state.clients.summary(),
            node_summary: state.nodes.summary(),
            recent: state.clients.history().entries().to_vec(),
            groups: state
                .groups
                .iter()
                .filter_map(|(name, g)| g.coordinator.last().map(|v| (name.clone(), v.clone())))
                .collect(),
            available: !state.health.is_failing(),
            last_reconciled: state.last_reconciled,
        };

        self.inner.published.send_replace(Arc::new(published));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::client::RawClient;
    use crate::source::SensorGroups;

    #[derive(Default)]
    struct StaticSource {
        clients: ClientSnapshot,
    }

    impl DeviceSource for StaticSource {
        async fn fetch_clients(&self) -> std::result::Result<ClientSnapshot, FetchError> {
            Ok(self.clients.clone())
        }

        async fn fetch_nodes(&self) -> std::result::Result<NodeSnapshot, FetchError> {
            Ok(NodeSnapshot::new())
        }

        async fn fetch_rules(&self) -> std::result::Result<RuleSnapshot, FetchError> {
            Ok(RuleSnapshot::default())
        }

        async fn fetch_available_sensor_groups(
            &self,
        ) -> std::result::Result<SensorGroups, FetchError> {
            Ok(HashMap::from([
                ("devices".to_string(), SensorGroupInfo::default()),
                ("cpu".to_string(), SensorGroupInfo::new(["cpu1"], "get_cpu")),
            ]))
        }

        async fn fetch_sensor_group(
            &self,
            _group: &str,
            _poll_method: &str,
        ) -> std::result::Result<SensorValues, FetchError> {
            Ok(SensorValues::from([(
                "cpu1".to_string(),
                serde_json::json!(10),
            )]))
        }
    }

    fn mac(n: u8) -> MacAddress {
        MacAddress::new([2, 0, 0, 0, 0, n])
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = EngineConfig::new().with_poll_interval(std::time::Duration::ZERO);
        assert!(SyncEngine::new(StaticSource::default(), config).is_err());
    }

    #[tokio::test]
    async fn first_pass_signals_everything_once() {
        let source = StaticSource {
            clients: ClientSnapshot::from([(mac(1), RawClient::connected())]),
        };
        let engine = SyncEngine::new(source, EngineConfig::default()).unwrap();

        let first = engine.poll().await;
        let report = first.report().unwrap();
        assert!(report.signals.contains(&Signal::DeviceNew));
        assert!(report.signals.contains(&Signal::DeviceUpdate));
        assert_eq!(report.events.len(), 1);

        let second = engine.poll().await;
        assert!(second.report().unwrap().signals.is_empty());
        assert!(second.report().unwrap().events.is_empty());
    }

    #[tokio::test]
    async fn accessors_read_published_state() {
        let source = StaticSource {
            clients: ClientSnapshot::from([(mac(1), RawClient::connected().with_name("tv"))]),
        };
        let engine = SyncEngine::new(source, EngineConfig::default()).unwrap();
        assert!(engine.current_clients().is_empty());
        assert!(!engine.is_available());

        engine.poll().await;

        assert_eq!(engine.current_clients().len(), 1);
        assert_eq!(engine.client_summary().connected, 1);
        assert_eq!(engine.recent_clients().len(), 1);
        assert!(engine.is_available());
        assert_eq!(engine.published().generation, 1);
    }

    #[tokio::test]
    async fn refresh_group_rejects_unpolled_and_unknown() {
        let engine = SyncEngine::new(StaticSource::default(), EngineConfig::default()).unwrap();

        let err = engine.refresh_group("devices").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::UnpolledSensorGroup(_))
        ));

        let err = engine.refresh_group("cpu").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Config(ConfigError::UnknownSensorGroup(_))
        ));
    }

    #[tokio::test]
    async fn discovered_group_refreshes_on_change_only() {
        let engine = SyncEngine::new(StaticSource::default(), EngineConfig::default()).unwrap();

        let groups = engine.discover_groups().await.unwrap();
        assert_eq!(groups, vec!["cpu".to_string()]);

        assert!(engine.refresh_group("cpu").await.unwrap());
        assert!(!engine.refresh_group("cpu").await.unwrap());
        assert_eq!(
            engine.group_values("cpu").and_then(|v| v.get("cpu1").cloned()),
            Some(serde_json::json!(10))
        );
    }
}
