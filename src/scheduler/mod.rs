// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Refresh scheduling.
//!
//! Every sensor group is refreshed on its own timer, except `devices` and
//! `aimesh`, which are derived from each reconciliation pass. Whatever the
//! trigger, a [`GroupCoordinator`] compares the new value with the previous
//! one and only a difference is signalled downstream.

mod coordinator;
pub mod group;
mod refresh_scheduler;

pub use coordinator::GroupCoordinator;
pub use refresh_scheduler::RefreshScheduler;
