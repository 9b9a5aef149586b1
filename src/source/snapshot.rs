// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalization of loosely typed snapshot documents.
//!
//! Router firmware reports the same field in many shapes: booleans as
//! `true`, `1` or `"1"`, link types as names or numeric codes, timestamps as
//! unix seconds or RFC 3339 strings. This module accepts all of them and
//! produces the typed raw snapshots the registries consume.
//!
//! Every document is a JSON object keyed by MAC. A record whose key is not a
//! MAC address, or whose shape cannot be read, is dropped; the rest of the
//! document is still used.
//!
//! # Examples
//!
//! ```
//! use meshwatch_lib::source::snapshot;
//!
//! let json = r#"{
//!     "AA-BB-CC-DD-EE-01": {"ip": "192.168.1.20", "name": "phone",
//!                           "connection_type": "5ghz", "online": "1"},
//!     "not-a-mac": {"online": true}
//! }"#;
//!
//! let clients = snapshot::parse_clients(json).unwrap();
//! assert_eq!(clients.len(), 1);
//! ```

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{SensorGroupInfo, SensorGroups, SensorValues};
use crate::client::{ClientSnapshot, RawClient};
use crate::error::ParseError;
use crate::mesh::{NodeRole, NodeSnapshot, ParentLink, RawNode};
use crate::rules::{RawRule, RuleSnapshot, RuleType};
use crate::types::{ConnectionType, MacAddress, PresenceState};

// Firmware variants name the same field differently and some send several
// spellings at once, so every spelling is its own field and the first
// present one wins.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClientRecord {
    ip: Option<String>,
    name: Option<String>,
    nickname: Option<String>,
    hostname: Option<String>,
    vendor: Option<String>,
    connection_type: Option<Value>,
    conn_type: Option<Value>,
    #[serde(rename = "isWL")]
    is_wl: Option<Value>,
    guest: Option<Value>,
    #[serde(rename = "isGN")]
    is_gn: Option<Value>,
    guest_id: Option<Value>,
    node: Option<String>,
    parent: Option<String>,
    online: Option<Value>,
    #[serde(rename = "isOnline")]
    is_online: Option<Value>,
    state: Option<Value>,
    connected_since: Option<Value>,
    #[serde(rename = "wlConnectTime")]
    wl_connect_time: Option<Value>,
    since: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeRecord {
    ip: Option<String>,
    alias: Option<String>,
    name: Option<String>,
    model: Option<String>,
    model_name: Option<String>,
    role: Option<Value>,
    parent: Option<String>,
    parent_mac: Option<String>,
    online: Option<Value>,
    #[serde(rename = "isOnline")]
    is_online: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RuleRecord {
    mac: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<Value>,
    rule_type: Option<Value>,
    timemap: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroupRecord {
    sensor_keys: Option<Vec<String>>,
    sensors: Option<Vec<String>>,
    poll_method: Option<String>,
    method: Option<String>,
}

/// Parses a client document.
///
/// # Errors
///
/// Returns [`ParseError`] if the document is not a JSON object.
pub fn parse_clients(json: &str) -> Result<ClientSnapshot, ParseError> {
    let records = parse_keyed::<ClientRecord>(json, "clients")?;
    Ok(records
        .into_iter()
        .filter_map(|(key, record)| Some((parse_mac(&key)?, client_from_record(record))))
        .collect())
}

/// Parses a mesh node document.
///
/// # Errors
///
/// Returns [`ParseError`] if the document is not a JSON object.
pub fn parse_nodes(json: &str) -> Result<NodeSnapshot, ParseError> {
    let records = parse_keyed::<NodeRecord>(json, "nodes")?;
    Ok(records
        .into_iter()
        .filter_map(|(key, record)| Some((parse_mac(&key)?, node_from_record(record))))
        .collect())
}

/// Parses a parental-control rule document.
///
/// Keys are kept as reported; the rule registry validates them.
///
/// # Errors
///
/// Returns [`ParseError`] if the document is not a JSON object.
pub fn parse_rules(json: &str) -> Result<RuleSnapshot, ParseError> {
    let records = parse_keyed::<RuleRecord>(json, "rules")?;
    Ok(RuleSnapshot::from_rules(records.into_iter().filter_map(
        |(key, record)| rule_from_record(record).map(|rule| (key, rule)),
    )))
}

/// Parses a sensor group listing.
///
/// # Errors
///
/// Returns [`ParseError`] if the document is not a JSON object.
pub fn parse_groups(json: &str) -> Result<SensorGroups, ParseError> {
    let records = parse_keyed::<GroupRecord>(json, "groups")?;
    Ok(records
        .into_iter()
        .map(|(name, record)| {
            let info = SensorGroupInfo {
                sensor_keys: record.sensor_keys.or(record.sensors).unwrap_or_default(),
                poll_method: record.poll_method.or(record.method).unwrap_or_default(),
            };
            (name, info)
        })
        .collect())
}

/// Parses the values of one sensor group.
///
/// # Errors
///
/// Returns [`ParseError`] if the document is not a JSON object.
pub fn parse_group_values(json: &str) -> Result<SensorValues, ParseError> {
    let map = parse_object(json, None)?;
    Ok(map.into_iter().collect())
}

/// Parses a MAC-keyed document, dropping records that cannot be read.
///
/// The document may be wrapped in a single-key object named `wrapper`.
fn parse_keyed<T: DeserializeOwned>(
    json: &str,
    wrapper: &str,
) -> Result<HashMap<String, T>, ParseError> {
    let map = parse_object(json, Some(wrapper))?;
    let mut records = HashMap::with_capacity(map.len());

    for (key, value) in map {
        match serde_json::from_value::<T>(value) {
            Ok(record) => {
                records.insert(key, record);
            }
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Dropping malformed {wrapper} record");
            }
        }
    }
    Ok(records)
}

fn parse_object(json: &str, wrapper: Option<&str>) -> Result<Map<String, Value>, ParseError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(mut map) = value else {
        return Err(ParseError::UnexpectedFormat(
            "expected a JSON object".to_string(),
        ));
    };

    if let Some(name) = wrapper
        && map.len() == 1
        && map.get(name).is_some_and(Value::is_object)
        && let Some(Value::Object(inner)) = map.remove(name)
    {
        return Ok(inner);
    }
    Ok(map)
}

fn parse_mac(key: &str) -> Option<MacAddress> {
    match key.parse() {
        Ok(mac) => Some(mac),
        Err(_) => {
            tracing::debug!(key = %key, "Dropping record with invalid MAC");
            None
        }
    }
}

fn client_from_record(record: ClientRecord) -> RawClient {
    let guest_flag = record.guest.or(record.is_gn);
    let (guest, guest_id) = guest_network(guest_flag.as_ref(), record.guest_id.as_ref());

    RawClient {
        ip: record.ip.as_deref().and_then(parse_ip),
        name: non_empty(record.name)
            .or_else(|| non_empty(record.nickname))
            .or_else(|| non_empty(record.hostname)),
        vendor: non_empty(record.vendor),
        connection_type: record
            .connection_type
            .or(record.conn_type)
            .or(record.is_wl)
            .as_ref()
            .map(connection_type)
            .unwrap_or_default(),
        guest,
        guest_id,
        node: record
            .node
            .or(record.parent)
            .as_deref()
            .and_then(|s| s.parse().ok()),
        // Being listed without a state means being connected.
        state: record
            .online
            .or(record.is_online)
            .or(record.state)
            .as_ref()
            .map_or(PresenceState::Connected, presence),
        connected_since: record
            .connected_since
            .or(record.wl_connect_time)
            .or(record.since)
            .as_ref()
            .and_then(timestamp),
    }
}

fn node_from_record(record: NodeRecord) -> RawNode {
    RawNode {
        ip: record.ip.as_deref().and_then(parse_ip),
        alias: non_empty(record.alias).or_else(|| non_empty(record.name)),
        model: non_empty(record.model).or_else(|| non_empty(record.model_name)),
        role: record.role.as_ref().map(node_role).unwrap_or_default(),
        parent: record
            .parent
            .or(record.parent_mac)
            .as_deref()
            .and_then(parent_link),
        online: record
            .online
            .or(record.is_online)
            .as_ref()
            .and_then(bool_like)
            .unwrap_or(true),
    }
}

fn rule_from_record(record: RuleRecord) -> Option<RawRule> {
    let rule_type = match record.kind.or(record.rule_type) {
        None => RuleType::default(),
        Some(Value::Number(n)) => RuleType::from_code(n.as_i64()?).ok()?,
        Some(Value::String(s)) => s.parse().ok()?,
        Some(_) => return None,
    };

    Some(RawRule {
        mac: non_empty(record.mac),
        name: non_empty(record.name),
        rule_type,
        timemap: non_empty(record.timemap),
    })
}

/// Reads a boolean from a bool, a number or a string.
fn bool_like(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn presence(value: &Value) -> PresenceState {
    match value {
        Value::String(s) => s.parse().unwrap_or_default(),
        other => bool_like(other).map(PresenceState::from).unwrap_or_default(),
    }
}

fn connection_type(value: &Value) -> ConnectionType {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map_or(ConnectionType::Disconnected, ConnectionType::from_code),
        Value::String(s) => s.parse().unwrap_or_default(),
        _ => ConnectionType::Disconnected,
    }
}

fn node_role(value: &Value) -> NodeRole {
    match value {
        // Mesh level 0 is the router itself.
        Value::Number(n) if n.as_i64() == Some(0) => NodeRole::Router,
        Value::Number(_) => NodeRole::Node,
        Value::String(s) => s.parse().unwrap_or_default(),
        _ => NodeRole::Node,
    }
}

fn parent_link(value: &str) -> Option<ParentLink> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("wired") || value.eq_ignore_ascii_case("ethernet") {
        return Some(ParentLink::Wired);
    }
    value.parse().ok().map(ParentLink::Node)
}

/// Reads the guest flag and network index.
///
/// A numeric guest field doubles as the network index.
fn guest_network(guest: Option<&Value>, guest_id: Option<&Value>) -> (bool, Option<u8>) {
    let explicit_id = guest_id.and_then(small_int);
    match guest {
        Some(Value::Number(_) | Value::String(_))
            if guest.and_then(small_int).is_some_and(|n| n > 0) =>
        {
            (true, explicit_id.or(guest.and_then(small_int)))
        }
        Some(value) => {
            let flag = bool_like(value).unwrap_or(false);
            (flag, explicit_id.filter(|_| flag))
        }
        None => (explicit_id.is_some_and(|n| n > 0), explicit_id.filter(|n| *n > 0)),
    }
}

fn small_int(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reads a timestamp from unix seconds or an RFC 3339 string.
///
/// Zero and negative values mean "not set".
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let from_secs = |secs: i64| {
        (secs > 0)
            .then(|| Utc.timestamp_opt(secs, 0).single())
            .flatten()
    };

    match value {
        Value::Number(n) => n.as_i64().and_then(from_secs),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().map_or_else(
                || {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                },
                from_secs,
            )
        }
        _ => None,
    }
}

fn parse_ip(s: &str) -> Option<IpAddr> {
    s.trim().parse().ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
