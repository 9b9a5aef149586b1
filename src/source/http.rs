// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP snapshot source.

use std::time::Duration;

use reqwest::Client;

use super::{DeviceSource, SensorGroups, SensorValues, snapshot};
use crate::client::ClientSnapshot;
use crate::error::FetchError;
use crate::mesh::NodeSnapshot;
use crate::rules::RuleSnapshot;

// ============================================================================
// HttpSourceConfig - Connection parameters
// ============================================================================

/// Configuration for an HTTP snapshot bridge.
///
/// The bridge serves one JSON document per snapshot kind:
///
/// | Path | Document |
/// |------|----------|
/// | `/clients` | clients keyed by MAC |
/// | `/nodes` | mesh nodes keyed by MAC |
/// | `/rules` | parental-control rules |
/// | `/groups` | available sensor groups |
/// | `/groups/{name}?method={poll_method}` | values of one group |
///
/// # Examples
///
/// ```
/// use meshwatch_lib::source::HttpSourceConfig;
/// use std::time::Duration;
///
/// let config = HttpSourceConfig::new("192.168.1.1")
///     .with_port(8080)
///     .with_credentials("admin", "password")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url(), "http://192.168.1.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    host: String,
    port: u16,
    use_https: bool,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpSourceConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the bridge at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            credentials: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If the port hasn't been set explicitly, it changes to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates an [`HttpSource`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_source(self) -> Result<HttpSource, FetchError> {
        let base_url = self.base_url();
        let client = Client::builder().timeout(self.timeout).build()?;

        Ok(HttpSource {
            base_url,
            client,
            credentials: self.credentials,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// HttpSource - DeviceSource over HTTP
// ============================================================================

/// Device source reading snapshot documents from an HTTP bridge.
///
/// # Examples
///
/// ```no_run
/// use meshwatch_lib::source::{DeviceSource, HttpSourceBuilder};
///
/// # async fn example() -> meshwatch_lib::Result<()> {
/// let source = HttpSourceBuilder::new()
///     .base_url("http://192.168.1.1:8080")
///     .build()?;
/// let clients = source.fetch_clients().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: Client,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpSource {
    /// Returns the base URL of the bridge.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn group_url(&self, group: &str, poll_method: &str) -> String {
        format!(
            "{}/groups/{}?method={}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(poll_method)
        )
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "Fetching snapshot document");

        let mut request = self.client.get(url);
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::AuthenticationFailed);
        }

        if !response.status().is_success() {
            return Err(FetchError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        Ok(response.text().await?)
    }

    fn map_send_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            FetchError::Http(error)
        }
    }
}

impl DeviceSource for HttpSource {
    async fn fetch_clients(&self) -> Result<ClientSnapshot, FetchError> {
        let body = self.get(&format!("{}/clients", self.base_url)).await?;
        Ok(snapshot::parse_clients(&body)?)
    }

    async fn fetch_nodes(&self) -> Result<NodeSnapshot, FetchError> {
        let body = self.get(&format!("{}/nodes", self.base_url)).await?;
        Ok(snapshot::parse_nodes(&body)?)
    }

    async fn fetch_rules(&self) -> Result<RuleSnapshot, FetchError> {
        let body = self.get(&format!("{}/rules", self.base_url)).await?;
        Ok(snapshot::parse_rules(&body)?)
    }

    async fn fetch_available_sensor_groups(&self) -> Result<SensorGroups, FetchError> {
        let body = self.get(&format!("{}/groups", self.base_url)).await?;
        Ok(snapshot::parse_groups(&body)?)
    }

    async fn fetch_sensor_group(
        &self,
        group: &str,
        poll_method: &str,
    ) -> Result<SensorValues, FetchError> {
        let body = self.get(&self.group_url(group, poll_method)).await?;
        Ok(snapshot::parse_group_values(&body)?)
    }
}

/// Builder for an [`HttpSource`] from a full base URL.
#[derive(Debug, Default)]
pub struct HttpSourceBuilder {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
}

impl HttpSourceBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL, or a bare host which then gets `http://`.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets basic authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the source.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not set or client creation fails.
    pub fn build(self) -> Result<HttpSource, FetchError> {
        let base = self
            .base_url
            .ok_or_else(|| FetchError::ConnectionFailed("base URL is required".to_string()))?;

        let base_url = if base.starts_with("http://") || base.starts_with("https://") {
            base.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base.trim_end_matches('/'))
        };

        let timeout = self.timeout.unwrap_or(HttpSourceConfig::DEFAULT_TIMEOUT);
        let client = Client::builder().timeout(timeout).build()?;

        let credentials = match (self.username, self.password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        };

        Ok(HttpSource {
            base_url,
            client,
            credentials,
            timeout,
        })
    }
}
