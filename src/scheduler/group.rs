// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor group names.

/// Group refreshed from the client reconciliation.
pub const DEVICES_GROUP: &str = "devices";

/// Group refreshed from the mesh reconciliation.
pub const AIMESH_GROUP: &str = "aimesh";

/// Groups refreshed on demand after each reconciliation pass rather than by
/// their own timer.
pub const UNPOLLED_GROUPS: [&str; 2] = [DEVICES_GROUP, AIMESH_GROUP];

/// Returns `true` if `group` has its own refresh timer.
#[must_use]
pub fn is_polled(group: &str) -> bool {
    !UNPOLLED_GROUPS.contains(&group)
}
