// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Refresh signals.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A coarse notification telling observers to re-read published state.
///
/// Signals carry no payload: consumers pull what they need from the engine
/// accessors once notified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    /// The client set or its aggregates changed.
    DeviceUpdate,
    /// At least one client was tracked for the first time.
    DeviceNew,
    /// The mesh changed.
    AimeshUpdate,
    /// At least one mesh node was tracked for the first time.
    AimeshNew,
    /// The parental-control rule set changed.
    PcRulesUpdate,
    /// At least one MAC gained a parental-control rule.
    PcRulesNew,
    /// A polled sensor group produced new values.
    GroupUpdate(String),
}

impl Signal {
    /// Returns the signal name, e.g. `device-update` or `cpu-update`.
    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::DeviceUpdate => Cow::Borrowed("device-update"),
            Self::DeviceNew => Cow::Borrowed("device-new"),
            Self::AimeshUpdate => Cow::Borrowed("aimesh-update"),
            Self::AimeshNew => Cow::Borrowed("aimesh-new"),
            Self::PcRulesUpdate => Cow::Borrowed("pc-rules-update"),
            Self::PcRulesNew => Cow::Borrowed("pc-rules-new"),
            Self::GroupUpdate(group) => Cow::Owned(format!("{group}-update")),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Signal::DeviceUpdate.name(), "device-update");
        assert_eq!(Signal::PcRulesNew.name(), "pc-rules-new");
        assert_eq!(Signal::GroupUpdate("cpu".into()).to_string(), "cpu-update");
    }
}
