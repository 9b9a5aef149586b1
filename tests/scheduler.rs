// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the refresh scheduler on paused time.

mod common;

use std::time::Duration;

use common::{ScriptedSource, drain, mac, signal_names};
use meshwatch_lib::Error;
use meshwatch_lib::client::RawClient;
use meshwatch_lib::engine::{EngineConfig, SyncEngine};
use meshwatch_lib::scheduler::RefreshScheduler;
use meshwatch_lib::source::{SensorGroupInfo, SensorValues};
use serde_json::json;

const SETTLE: Duration = Duration::from_millis(1);

fn source_with_groups() -> ScriptedSource {
    let source = ScriptedSource::new();
    source.add_group("devices", SensorGroupInfo::new(["count"], "get_devices"));
    source.add_group("cpu", SensorGroupInfo::new(["cpu1_usage"], "get_cpu_usage"));
    source.add_group("wan", SensorGroupInfo::new(["status"], "get_wan_state"));
    source.set_group_values(
        "cpu",
        SensorValues::from([
            ("cpu1_usage".to_string(), json!(12)),
            ("cpu9_usage".to_string(), json!(99)),
        ]),
    );
    source
}

fn config() -> EngineConfig {
    EngineConfig::new()
        .with_poll_interval(Duration::from_secs(30))
        .with_group_interval("cpu", Duration::from_secs(10))
}

// ============================================================================
// Timer Tests
// ============================================================================

mod timers {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn main_loop_polls_on_interval() {
        let engine = SyncEngine::new(ScriptedSource::new(), config()).unwrap();
        engine.source().set_clients([(mac(1), RawClient::connected())]);

        let _scheduler = RefreshScheduler::start(engine.clone()).await;

        tokio::time::sleep(SETTLE).await;
        assert_eq!(engine.source().client_fetches(), 1);
        assert_eq!(engine.current_clients().len(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.source().client_fetches(), 2);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(engine.source().client_fetches(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn polled_groups_run_on_their_own_intervals() {
        let engine = SyncEngine::new(source_with_groups(), config()).unwrap();

        let scheduler = RefreshScheduler::start(engine.clone()).await;
        assert_eq!(scheduler.groups(), ["cpu".to_string(), "wan".to_string()]);

        tokio::time::sleep(Duration::from_secs(25)).await;

        assert_eq!(engine.source().group_fetches("cpu"), 3);
        assert_eq!(engine.source().group_fetches("wan"), 1);
        assert_eq!(engine.source().group_fetches("devices"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn group_signals_only_on_change() {
        let engine = SyncEngine::new(source_with_groups(), config()).unwrap();
        let mut rx = engine.subscribe();

        let _scheduler = RefreshScheduler::start(engine.clone()).await;
        tokio::time::sleep(Duration::from_secs(25)).await;

        let cpu_updates = signal_names(&drain(&mut rx))
            .into_iter()
            .filter(|s| s == "cpu-update")
            .count();
        assert_eq!(cpu_updates, 1);

        let values = engine.group_values("cpu").unwrap();
        assert_eq!(values.get("cpu1_usage"), Some(&json!(12)));
        assert!(!values.contains_key("cpu9_usage"));

        engine.source().set_group_values(
            "cpu",
            SensorValues::from([("cpu1_usage".to_string(), json!(40))]),
        );
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(signal_names(&drain(&mut rx)), vec!["cpu-update"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failures_keep_timers_running() {
        let engine = SyncEngine::new(source_with_groups(), config()).unwrap();
        engine.source().set_failing(true);

        let _scheduler = RefreshScheduler::start(engine.clone()).await;
        tokio::time::sleep(Duration::from_secs(65)).await;

        assert_eq!(engine.source().client_fetches(), 3);
        assert_eq!(engine.source().group_fetches("cpu"), 7);
        assert!(!engine.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_failure_runs_main_loop_only() {
        let source = source_with_groups();
        source.set_discovery_failing(true);
        let engine = SyncEngine::new(source, config()).unwrap();

        let scheduler = RefreshScheduler::start(engine.clone()).await;
        tokio::time::sleep(Duration::from_secs(35)).await;

        assert!(scheduler.groups().is_empty());
        assert_eq!(engine.source().client_fetches(), 2);
        assert_eq!(engine.source().group_fetches("cpu"), 0);
    }
}

// ============================================================================
// Shutdown Tests
// ============================================================================

mod shutdown {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_every_timer() {
        let engine = SyncEngine::new(source_with_groups(), config()).unwrap();
        let scheduler = RefreshScheduler::start(engine.clone()).await;
        tokio::time::sleep(SETTLE).await;
        assert!(scheduler.is_running());

        scheduler.shutdown();
        assert!(!scheduler.is_running());
        let polls = engine.source().client_fetches();
        let refreshes = engine.source().group_fetches("cpu");

        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(engine.source().client_fetches(), polls);
        assert_eq!(engine.source().group_fetches("cpu"), refreshes);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pass_waiting_on_fetch() {
        let engine = SyncEngine::new(ScriptedSource::new(), config()).unwrap();
        engine.source().set_clients([(mac(1), RawClient::connected())]);
        engine.source().set_fetch_delay(Duration::from_secs(10));

        let scheduler = RefreshScheduler::start(engine.clone()).await;
        tokio::time::sleep(SETTLE).await;
        assert_eq!(engine.source().client_fetches(), 1);

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(engine.published().generation, 0);
        assert!(engine.current_clients().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_now_after_shutdown_fails() {
        let engine = SyncEngine::new(ScriptedSource::new(), config()).unwrap();
        let scheduler = RefreshScheduler::start(engine).await;

        assert!(scheduler.poll_now().await.unwrap().is_reconciled());

        scheduler.shutdown();
        assert!(matches!(scheduler.poll_now().await, Err(Error::ShutDown)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_stops_timers() {
        let engine = SyncEngine::new(ScriptedSource::new(), config()).unwrap();
        let scheduler = RefreshScheduler::start(engine.clone()).await;
        tokio::time::sleep(SETTLE).await;

        drop(scheduler);
        let polls = engine.source().client_fetches();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(engine.source().client_fetches(), polls);
    }
}
