// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MAC allow-list / deny-list filter.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::MacAddress;

/// How the filter list is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every MAC passes.
    #[default]
    Disabled,
    /// Only listed MACs pass.
    Include,
    /// Listed MACs are rejected.
    Exclude,
}

/// Client filter applied to the tracked working set and to outbound events.
///
/// # Examples
///
/// ```
/// use meshwatch_lib::client::{ClientFilter, FilterMode};
///
/// let filter = ClientFilter::parse(FilterMode::Exclude, ["aa:bb:cc:dd:ee:ff"]).unwrap();
/// assert!(!filter.allows(&"AA-BB-CC-DD-EE-FF".parse().unwrap()));
/// assert!(filter.allows(&"00:11:22:33:44:55".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFilter {
    /// Filter mode.
    pub mode: FilterMode,
    /// MACs the mode applies to.
    pub list: HashSet<MacAddress>,
}

impl ClientFilter {
    /// Creates a filter that lets everything through.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Creates a filter from already parsed MACs.
    #[must_use]
    pub fn new(mode: FilterMode, list: impl IntoIterator<Item = MacAddress>) -> Self {
        Self {
            mode,
            list: list.into_iter().collect(),
        }
    }

    /// Creates a filter from MAC strings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilterEntry`] for the first entry that is
    /// not a MAC address.
    pub fn parse<I, S>(mode: FilterMode, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = entries
            .into_iter()
            .map(|entry| {
                entry
                    .as_ref()
                    .parse::<MacAddress>()
                    .map_err(|_| ConfigError::InvalidFilterEntry(entry.as_ref().to_string()))
            })
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self { mode, list })
    }

    /// Returns `true` if `mac` passes the filter.
    #[must_use]
    pub fn allows(&self, mac: &MacAddress) -> bool {
        match self.mode {
            FilterMode::Disabled => true,
            FilterMode::Include => self.list.contains(mac),
            FilterMode::Exclude => !self.list.contains(mac),
        }
    }
}
