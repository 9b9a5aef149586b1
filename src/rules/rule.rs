// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parental-control rule records.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::types::MacAddress;

/// Policy applied by a parental-control rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Rule present but not enforced.
    #[default]
    Disable,
    /// Internet access limited to a time map.
    Time,
    /// Internet access blocked.
    Block,
}

impl RuleType {
    /// Returns the rule type as a lowercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Time => "time",
            Self::Block => "block",
        }
    }

    /// Maps the numeric code used by router firmware.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidRuleType`] for unknown codes.
    pub fn from_code(code: i64) -> Result<Self, ValueError> {
        match code {
            0 => Ok(Self::Disable),
            1 => Ok(Self::Time),
            2 => Ok(Self::Block),
            other => Err(ValueError::InvalidRuleType(other.to_string())),
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" | "disabled" | "off" | "0" => Ok(Self::Disable),
            "time" | "timed" | "schedule" | "1" => Ok(Self::Time),
            "block" | "blocked" | "2" => Ok(Self::Block),
            other => Err(ValueError::InvalidRuleType(other.to_string())),
        }
    }
}

/// A rule entry as reported by one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRule {
    /// Target MAC as reported. When present it must match the snapshot key.
    pub mac: Option<String>,
    /// Rule name.
    pub name: Option<String>,
    /// Policy.
    pub rule_type: RuleType,
    /// Encoded weekly schedule for [`RuleType::Time`].
    pub timemap: Option<String>,
}

impl RawRule {
    /// Creates a rule entry targeting `mac`.
    #[must_use]
    pub fn new(mac: impl Into<String>, rule_type: RuleType) -> Self {
        Self {
            mac: Some(mac.into()),
            rule_type,
            ..Self::default()
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the time map.
    #[must_use]
    pub fn with_timemap(mut self, timemap: impl Into<String>) -> Self {
        self.timemap = Some(timemap.into());
        self
    }
}

/// A rule snapshot as returned by one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSnapshot {
    /// Rules keyed by the device's own key.
    pub rules: HashMap<String, RawRule>,
}

impl RuleSnapshot {
    /// Creates a snapshot from `(key, rule)` pairs.
    #[must_use]
    pub fn from_rules(rules: impl IntoIterator<Item = (String, RawRule)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }
}

/// A tracked parental-control rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Target client.
    pub mac: MacAddress,
    /// Rule name.
    pub name: Option<String>,
    /// Policy.
    pub rule_type: RuleType,
    /// Encoded weekly schedule.
    pub timemap: Option<String>,
}

impl Rule {
    /// Validates a raw entry.
    ///
    /// The key must be a MAC address. An explicit target MAC, when present,
    /// must name the same device. Anything else yields `None`.
    #[must_use]
    pub fn from_raw(key: &str, raw: RawRule) -> Option<Self> {
        let mac = key.trim().parse::<MacAddress>().ok()?;
        if let Some(target) = raw.mac.as_deref()
            && target.parse::<MacAddress>().ok() != Some(mac)
        {
            return None;
        }

        Some(Self {
            mac,
            name: raw.name,
            rule_type: raw.rule_type,
            timemap: raw.timemap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_type_parsing() {
        assert_eq!("BLOCK".parse::<RuleType>().unwrap(), RuleType::Block);
        assert_eq!("1".parse::<RuleType>().unwrap(), RuleType::Time);
        assert_eq!(RuleType::from_code(0).unwrap(), RuleType::Disable);
        assert!(RuleType::from_code(9).is_err());
        assert!("sometimes".parse::<RuleType>().is_err());
    }

    #[test]
    fn from_raw_accepts_matching_mac() {
        let raw = RawRule::new("AA-BB-CC-DD-EE-01", RuleType::Block).with_name("kid");
        let rule = Rule::from_raw("aa:bb:cc:dd:ee:01", raw).unwrap();
        assert_eq!(rule.mac.to_string(), "aa:bb:cc:dd:ee:01");
        assert_eq!(rule.name.as_deref(), Some("kid"));
    }

    #[test]
    fn from_raw_without_mac_uses_key() {
        let raw = RawRule {
            rule_type: RuleType::Time,
            ..RawRule::default()
        };
        let rule = Rule::from_raw("aa:bb:cc:dd:ee:02", raw).unwrap();
        assert_eq!(rule.mac.to_string(), "aa:bb:cc:dd:ee:02");
    }

    #[test]
    fn from_raw_rejects_malformed_entries() {
        assert!(Rule::from_raw("", RawRule::new("aa:bb:cc:dd:ee:01", RuleType::Block)).is_none());
        assert!(Rule::from_raw("k", RawRule::new("nope", RuleType::Block)).is_none());
        assert!(Rule::from_raw("not-a-mac", RawRule::default()).is_none());
        assert!(
            Rule::from_raw("not-a-mac", RawRule::new("aa:bb:cc:dd:ee:01", RuleType::Block))
                .is_none()
        );
    }

    #[test]
    fn from_raw_rejects_key_target_mismatch() {
        let raw = RawRule::new("aa:bb:cc:dd:ee:02", RuleType::Block);
        assert!(Rule::from_raw("aa:bb:cc:dd:ee:01", raw).is_none());

        let raw = RawRule::new("garbage", RuleType::Block);
        assert!(Rule::from_raw("aa:bb:cc:dd:ee:01", raw).is_none());
    }
}
