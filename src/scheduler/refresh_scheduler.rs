// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timers driving an engine.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::{PassOutcome, SyncEngine};
use crate::error::{Error, Result};
use crate::source::DeviceSource;

/// Runs the refresh timers of one engine.
///
/// On start the scheduler discovers the device's sensor groups, then spawns
/// one task for the main reconciliation loop and one per polled group, each
/// on its own interval. All timers funnel through the engine, so their
/// passes never overlap. A failed fetch changes nothing about the schedule:
/// the next tick simply tries again.
///
/// Dropping the scheduler, or calling [`shutdown`](Self::shutdown), aborts
/// every timer. A pass already past its fetches still completes.
///
/// # Examples
///
/// ```no_run
/// use meshwatch_lib::engine::{EngineConfig, SyncEngine};
/// use meshwatch_lib::scheduler::RefreshScheduler;
/// use meshwatch_lib::source::HttpSourceBuilder;
///
/// # async fn example() -> meshwatch_lib::Result<()> {
/// let source = HttpSourceBuilder::new().base_url("http://192.168.1.1:8080").build()?;
/// let engine = SyncEngine::new(source, EngineConfig::default())?;
///
/// let scheduler = RefreshScheduler::start(engine.clone()).await;
/// // ...
/// scheduler.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct RefreshScheduler<S> {
    engine: SyncEngine<S>,
    groups: Vec<String>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: DeviceSource> RefreshScheduler<S> {
    /// Discovers sensor groups and starts all timers.
    ///
    /// If discovery fails the failure is logged and only the main loop runs.
    pub async fn start(engine: SyncEngine<S>) -> Self {
        let engine_id = engine.id();
        let groups = match engine.discover_groups().await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!(
                    engine_id = %engine_id,
                    error = %e,
                    "Sensor group discovery failed, polling main loop only"
                );
                Vec::new()
            }
        };

        let mut handles = Vec::with_capacity(groups.len() + 1);
        handles.push(tokio::spawn(run_main_loop(
            engine.clone(),
            engine.config().poll_interval,
        )));
        for group in &groups {
            let period = engine.config().interval_for(group);
            handles.push(tokio::spawn(run_group_loop(
                engine.clone(),
                group.clone(),
                period,
            )));
        }

        tracing::info!(
            engine_id = %engine_id,
            groups = groups.len(),
            "Refresh scheduler started"
        );

        Self {
            engine,
            groups,
            handles: Mutex::new(handles),
        }
    }

    /// Returns the polled sensor groups that got a timer.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns the driven engine.
    #[must_use]
    pub fn engine(&self) -> &SyncEngine<S> {
        &self.engine
    }

    /// Returns `true` until [`shutdown`](Self::shutdown) is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handles.lock().is_empty()
    }

    /// Runs a reconciliation pass now, outside the schedule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutDown`] after [`shutdown`](Self::shutdown).
    pub async fn poll_now(&self) -> Result<PassOutcome> {
        if !self.is_running() {
            return Err(Error::ShutDown);
        }
        Ok(self.engine.poll().await)
    }

    /// Aborts every timer.
    ///
    /// No new pass starts once this returns. A pass still waiting on its
    /// fetches is cancelled there; a pass already past its fetches runs to
    /// completion and may publish after this returns.
    pub fn shutdown(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        if handles.is_empty() {
            return;
        }
        for handle in &handles {
            handle.abort();
        }
        tracing::info!(engine_id = %self.engine.id(), "Refresh scheduler stopped");
    }
}

impl<S> Drop for RefreshScheduler<S> {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().drain(..) {
            handle.abort();
        }
    }
}

impl<S> std::fmt::Debug for RefreshScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("engine", &self.engine)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

async fn run_main_loop<S: DeviceSource>(engine: SyncEngine<S>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        // Failures are logged by the engine
        let _outcome = engine.poll().await;
    }
}

async fn run_group_loop<S: DeviceSource>(engine: SyncEngine<S>, group: String, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match engine.refresh_group(&group).await {
            Ok(_) | Err(Error::Fetch(_)) => {}
            Err(e) => {
                tracing::warn!(
                    engine_id = %engine.id(),
                    group = %group,
                    error = %e,
                    "Stopping sensor group timer"
                );
                break;
            }
        }
    }
}

