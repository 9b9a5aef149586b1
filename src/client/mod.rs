// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client tracking.
//!
//! - [`ClientRegistry`] owns the tracked clients and reconciles them against
//!   each fresh snapshot
//! - [`PresenceTracker`] applies the consider-home debounce
//! - [`ClientFilter`] scopes the working set and outbound events
//! - [`RecentHistory`] keeps the most recent connections

mod filter;
mod history;
mod presence;
mod record;
mod registry;

pub use filter::{ClientFilter, FilterMode};
pub use history::{DEFAULT_HISTORY_CAP, RecentHistory};
pub use presence::{Observation, PresenceTracker, Transition};
pub use record::{Client, ClientIdentity, RawClient};
pub use registry::{ClientReconcile, ClientRegistry, ClientSnapshot, ClientSummary};
