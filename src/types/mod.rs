// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the registries.
//!
//! # Types
//!
//! - [`MacAddress`] - Normalized hardware address, the key of every registry
//! - [`ConnectionType`] - Wired / wireless / disconnected link
//! - [`PresenceState`] - Unknown / connected / disconnected presence

mod connection;
mod mac;

pub use connection::{ConnectionType, PresenceState};
pub use mac::MacAddress;
