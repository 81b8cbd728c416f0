//! Bridge configuration.
//!
//! Configuration is layered: [`BridgeConfig::default`] supplies the values in
//! [`constants`](crate::constants), an optional TOML file and then command
//! line flags are applied on top as [`ConfigOverrides`], and the result is
//! checked once with [`BridgeConfig::validate`] before the bridge starts.
//!
//! # File Format
//!
//! ```toml
//! device_id = "/dev/ttyACM0"
//! baud_rate = 9600
//! backend_url = "http://localhost:3001"
//! request_timeout_ms = 5000
//! poll_interval_ms = 100
//!
//! [reconnect]
//! max_attempts = 3
//! delay_ms = 2000
//! ```
//!
//! `backend_url` derives both endpoints; `numeric_endpoint` and
//! `diagnostics_endpoint` override them individually.
//!
//! # Examples
//!
//! ```
//! use scanbridge_core::{BridgeConfig, ConfigOverrides};
//!
//! let overrides = ConfigOverrides::from_toml_str(r#"backend_url = "http://10.0.0.5:8080""#)?;
//! let config = BridgeConfig::default().apply(overrides);
//! config.validate()?;
//!
//! assert_eq!(config.numeric_endpoint, "http://10.0.0.5:8080/api/arduino/number");
//! # Ok::<(), scanbridge_core::Error>(())
//! ```

use crate::constants::*;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete, validated-on-demand configuration of one bridge process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Serial device identifier (e.g. `/dev/ttyACM0`, `COM14`).
    pub device_id: String,

    /// Serial baud rate.
    pub baud_rate: u32,

    /// Absolute URL receiving numeric readings.
    pub numeric_endpoint: String,

    /// Absolute URL receiving diagnostic frames.
    pub diagnostics_endpoint: String,

    /// Per-request timeout for forwarding calls.
    #[serde(rename = "request_timeout_ms", with = "duration_ms")]
    pub request_timeout: Duration,

    /// TCP connect timeout for forwarding calls.
    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    pub connect_timeout: Duration,

    /// Reader polling tick.
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,

    /// Connection retry policy.
    pub reconnect: ReconnectPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            numeric_endpoint: endpoint(DEFAULT_BACKEND_URL, NUMERIC_READING_PATH),
            diagnostics_endpoint: endpoint(DEFAULT_BACKEND_URL, DIAGNOSTICS_PATH),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Point both endpoints at the standard routes of `base_url`.
    #[must_use]
    pub fn with_backend_url(mut self, base_url: &str) -> Self {
        self.numeric_endpoint = endpoint(base_url, NUMERIC_READING_PATH);
        self.diagnostics_endpoint = endpoint(base_url, DIAGNOSTICS_PATH);
        self
    }

    /// Layer `overrides` on top of this configuration.
    ///
    /// `backend_url` is applied before the explicit endpoints so that an
    /// explicit endpoint always wins.
    #[must_use]
    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(device_id) = overrides.device_id {
            self.device_id = device_id;
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.baud_rate = baud_rate;
        }
        if let Some(base_url) = overrides.backend_url {
            self = self.with_backend_url(&base_url);
        }
        if let Some(url) = overrides.numeric_endpoint {
            self.numeric_endpoint = url;
        }
        if let Some(url) = overrides.diagnostics_endpoint {
            self.diagnostics_endpoint = url;
        }
        if let Some(ms) = overrides.request_timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.connect_timeout_ms {
            self.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Some(reconnect) = overrides.reconnect {
            if let Some(max_attempts) = reconnect.max_attempts {
                self.reconnect.max_attempts = max_attempts;
            }
            if let Some(ms) = reconnect.delay_ms {
                self.reconnect.delay = Duration::from_millis(ms);
            }
        }
        self
    }

    /// Check the configuration before the bridge starts.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            return Err(Error::config("device_id must not be empty"));
        }
        if !(MIN_BAUD_RATE..=MAX_BAUD_RATE).contains(&self.baud_rate) {
            return Err(Error::config(format!(
                "baud_rate must be {MIN_BAUD_RATE}-{MAX_BAUD_RATE}, got {}",
                self.baud_rate
            )));
        }
        validate_endpoint("numeric_endpoint", &self.numeric_endpoint)?;
        validate_endpoint("diagnostics_endpoint", &self.diagnostics_endpoint)?;
        for (name, value) in [
            ("request_timeout_ms", self.request_timeout),
            ("connect_timeout_ms", self.connect_timeout),
            ("poll_interval_ms", self.poll_interval),
        ] {
            if value.is_zero() {
                return Err(Error::config(format!("{name} must be greater than zero")));
            }
        }
        if self.poll_interval >= self.request_timeout {
            return Err(Error::config(
                "poll_interval_ms must be shorter than request_timeout_ms",
            ));
        }
        Ok(())
    }

    /// Render the configuration as TOML (loadable again as overrides).
    ///
    /// # Errors
    /// Returns `Error::Config` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::config(e.to_string()))
    }
}

/// Retry policy applied when the device cannot be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Extra attempts after the first failed open. Zero disables retrying.
    pub max_attempts: u32,

    /// Delay between attempts.
    #[serde(rename = "delay_ms", with = "duration_ms")]
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
        }
    }
}

impl ReconnectPolicy {
    /// Whether another attempt is allowed after `failed_attempts` failures.
    #[must_use]
    pub fn allows_retry(&self, failed_attempts: u32) -> bool {
        failed_attempts <= self.max_attempts
    }
}

/// Partial configuration layered onto [`BridgeConfig`].
///
/// Every field is optional; unset fields keep the value underneath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub device_id: Option<String>,
    pub baud_rate: Option<u32>,
    pub backend_url: Option<String>,
    pub numeric_endpoint: Option<String>,
    pub diagnostics_endpoint: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub reconnect: Option<ReconnectOverrides>,
}

/// Partial `[reconnect]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectOverrides {
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Parse overrides from TOML text.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` on malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load overrides from a TOML file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read and
    /// `Error::ConfigParse` if it is not valid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn validate_endpoint(name: &str, value: &str) -> Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| Error::config(format!("{name} is not a valid URL ({value}): {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "{name} must use http or https, got {}",
            url.scheme()
        )));
    }
    Ok(())
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
