// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The synchronization engine.
//!
//! One [`SyncEngine`] runs per monitored router. It is constructed with an
//! injected [`DeviceSource`](crate::source::DeviceSource) and an
//! [`EngineConfig`], and is usually driven by a
//! [`RefreshScheduler`](crate::scheduler::RefreshScheduler).

mod config;
mod fetch_health;
mod published;
mod sync_engine;

pub use config::EngineConfig;
pub use fetch_health::{FetchHealth, HealthEvent};
pub use published::PublishedState;
pub use sync_engine::{PassOutcome, PassReport, SyncEngine};
