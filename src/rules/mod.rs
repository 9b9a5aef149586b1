// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parental-control rule tracking.

mod registry;
mod rule;

pub use registry::{RuleReconcile, RuleRegistry};
pub use rule::{RawRule, Rule, RuleSnapshot, RuleType};
