// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `MeshWatch` Lib - State synchronization for home routers and their mesh.
//!
//! This library periodically polls a router for its connected clients, mesh
//! nodes and parental-control rules, reconciles every snapshot against the
//! known state, and notifies observers of what changed.
//!
//! # Features
//!
//! - **Presence tracking**: Debounced "consider home" disconnect detection
//! - **Mesh tracking**: Satellite nodes going online and offline
//! - **Parental control**: Rule set follows the router exactly
//! - **Change-gated refresh**: Each sensor group on its own timer, signalled
//!   only when its values change
//! - **Filtered events**: Per-event enable flags and a MAC allow/deny list
//!
//! # Quick Start
//!
//! ```no_run
//! use meshwatch_lib::engine::{EngineConfig, SyncEngine};
//! use meshwatch_lib::event::EngineEvent;
//! use meshwatch_lib::scheduler::RefreshScheduler;
//! use meshwatch_lib::source::HttpSourceBuilder;
//!
//! #[tokio::main]
//! async fn main() -> meshwatch_lib::Result<()> {
//!     let source = HttpSourceBuilder::new()
//!         .base_url("http://192.168.1.1:8080")
//!         .credentials("admin", "secret")
//!         .build()?;
//!
//!     let engine = SyncEngine::new(source, EngineConfig::default())?;
//!     let mut events = engine.subscribe();
//!     let _scheduler = RefreshScheduler::start(engine.clone()).await;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let EngineEvent::Domain { event, .. } = event {
//!             println!("{}: {:?}", event.name(), event.payload.name);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Custom Sources
//!
//! Any transport can feed the engine by implementing
//! [`DeviceSource`](source::DeviceSource). The
//! [`snapshot`](source::snapshot) module turns loosely typed JSON documents
//! into the raw snapshot types.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpSource`](source::HttpSource), built on `reqwest`

pub mod client;
pub mod engine;
pub mod error;
pub mod event;
pub mod mesh;
pub mod rules;
pub mod scheduler;
pub mod source;
pub mod types;

pub use client::{Client, ClientFilter, ClientIdentity, FilterMode, RawClient};
pub use engine::{EngineConfig, PassOutcome, SyncEngine};
pub use error::{ConfigError, Error, FetchError, ParseError, Result, ValueError};
pub use event::{DomainEvent, EngineEvent, EngineId, EventKind, Signal};
pub use mesh::{Node, RawNode};
pub use rules::{RawRule, Rule, RuleType};
pub use scheduler::RefreshScheduler;
pub use source::DeviceSource;
pub use types::{ConnectionType, MacAddress, PresenceState};
