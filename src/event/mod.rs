// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine events.
//!
//! A reconciliation pass produces two kinds of output:
//!
//! - [`Signal`]s, coarse "re-read this group" notifications
//! - [`DomainEvent`]s, per-entity connectivity events gated by the
//!   [`EventRouter`]
//!
//! Both are published on the [`EventBus`] wrapped in an [`EngineEvent`].
//!
//! # Examples
//!
//! ```
//! use meshwatch_lib::event::{EngineEvent, EngineId, EventBus, Signal};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(EngineEvent::signal(EngineId::new(), Signal::PcRulesUpdate));
//! ```

mod domain_event;
mod engine_event;
mod engine_id;
mod event_bus;
mod event_router;
mod signal;

pub use domain_event::{DomainEvent, EventKind, EventPayload};
pub use engine_event::EngineEvent;
pub use engine_id::EngineId;
pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
pub use event_router::EventRouter;
pub use signal::Signal;
