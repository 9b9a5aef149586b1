// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `MeshWatch` library.
//!
//! The hierarchy mirrors the three failure classes of the engine:
//!
//! - [`FetchError`]: the device collaborator could not deliver a snapshot.
//!   Always recovered locally; registries are left untouched.
//! - [`ConfigError`]: a caller asked for something the configuration or the
//!   device does not provide (e.g. an unknown sensor group). Fatal to that
//!   call only.
//! - [`ParseError`] / [`ValueError`]: boundary normalization failures.
//!   Malformed individual entries are dropped rather than surfaced.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while fetching a snapshot from the device.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The request is invalid for the current configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred while parsing a snapshot document.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The engine has been shut down.
    #[error("engine has been shut down")]
    ShutDown,
}

/// Errors raised by a [`DeviceSource`](crate::source::DeviceSource) while
/// fetching a snapshot.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication was rejected by the device.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device is not reachable at all.
    #[error("device unavailable")]
    Unavailable,

    /// The device answered with a document that could not be read.
    #[error("invalid snapshot: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to engine configuration and sensor group requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested sensor group is not offered by the device.
    #[error("unknown sensor group: {0}")]
    UnknownSensorGroup(String),

    /// The requested sensor group is refreshed by reconciliation passes only.
    #[error("sensor group {0} has no timer of its own")]
    UnpolledSensorGroup(String),

    /// An interval must be greater than zero.
    #[error("invalid interval for {0}: must be greater than zero")]
    InvalidInterval(String),

    /// A client filter entry is not a MAC address.
    #[error("invalid client filter entry: {0}")]
    InvalidFilterEntry(String),
}

/// Errors related to parsing snapshot documents.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unexpected document format.
    #[error("unexpected document format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A string is not a valid MAC address.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    /// Unrecognized connection type.
    #[error("invalid connection type: {0}")]
    InvalidConnectionType(String),

    /// Unrecognized parental-control rule type.
    #[error("invalid rule type: {0}")]
    InvalidRuleType(String),

    /// Unrecognized presence state.
    #[error("invalid presence state: {0}")]
    InvalidPresenceState(String),

    /// Unrecognized mesh node role.
    #[error("invalid node role: {0}")]
    InvalidNodeRole(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidMac("zz:zz".to_string());
        assert_eq!(err.to_string(), "invalid MAC address: zz:zz");
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::UnknownSensorGroup("cpu".to_string()).into();
        assert!(matches!(
            err,
            Error::Config(ConfigError::UnknownSensorGroup(ref g)) if g == "cpu"
        ));
    }

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::Timeout(500).to_string(), "request timed out after 500 ms");
        assert_eq!(
            FetchError::AuthenticationFailed.to_string(),
            "authentication failed"
        );
    }

    #[test]
    fn fetch_error_from_parse_error() {
        let err: FetchError = ParseError::UnexpectedFormat("array".to_string()).into();
        assert_eq!(
            err.to_string(),
            "invalid snapshot: unexpected document format: array"
        );
    }
}
