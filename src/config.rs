//! Host configuration.
//!
//! Every field has a default, so an empty TOML file is a valid configuration.
//!
//! ```toml
//! [server]
//! notify_interval_ms = 2000
//! notify_mode = "list_of_observers"
//!
//! [platform]
//! request_timeout_ms = 5000
//!
//! [provisioning]
//! readiness_timeout_ms = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the notification loop delivers updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// `notify_all_observers`: the platform re-reads the resource and fans out.
    #[default]
    All,
    /// `notify_list_of_observers` with the resource's own observer list.
    ListOfObservers,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

/// Resource server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Notification loop tick (milliseconds).
    #[serde(default = "default_notify_interval")]
    pub notify_interval_ms: u64,

    #[serde(default)]
    pub notify_mode: NotifyMode,

    /// Capacity of each resource actor's request channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

/// Platform runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// How long a client waits for a response (milliseconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// Client-side settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Interval between discovery polls (milliseconds).
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval_ms: u64,
}

/// Provisioning chain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Timeout handed to device discovery calls (milliseconds).
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_ms: u64,

    /// Interval between readiness polls after ownership transfer (milliseconds).
    #[serde(default = "default_readiness_poll_interval")]
    pub readiness_poll_interval_ms: u64,

    /// Give up waiting for a device to become ready after this long (milliseconds).
    #[serde(default = "default_readiness_timeout")]
    pub readiness_timeout_ms: u64,
}

fn default_notify_interval() -> u64 {
    2000
}

fn default_channel_buffer() -> usize {
    32
}

fn default_request_timeout() -> u64 {
    5000
}

fn default_discovery_interval() -> u64 {
    1000
}

fn default_discovery_timeout() -> u64 {
    5000
}

fn default_readiness_poll_interval() -> u64 {
    200
}

fn default_readiness_timeout() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            notify_interval_ms: default_notify_interval(),
            notify_mode: NotifyMode::default(),
            channel_buffer: default_channel_buffer(),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            discovery_interval_ms: default_discovery_interval(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: default_discovery_timeout(),
            readiness_poll_interval_ms: default_readiness_poll_interval(),
            readiness_timeout_ms: default_readiness_timeout(),
        }
    }
}

impl ServerConfig {
    pub fn notify_interval(&self) -> Duration {
        Duration::from_millis(self.notify_interval_ms)
    }
}

impl PlatformConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ClientConfig {
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }
}

impl ProvisioningConfig {
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

impl HostConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("server.notify_interval_ms", self.server.notify_interval_ms),
            ("server.channel_buffer", self.server.channel_buffer as u64),
            ("platform.request_timeout_ms", self.platform.request_timeout_ms),
            ("client.discovery_interval_ms", self.client.discovery_interval_ms),
            (
                "provisioning.discovery_timeout_ms",
                self.provisioning.discovery_timeout_ms,
            ),
            (
                "provisioning.readiness_poll_interval_ms",
                self.provisioning.readiness_poll_interval_ms,
            ),
            (
                "provisioning.readiness_timeout_ms",
                self.provisioning.readiness_timeout_ms,
            ),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }

        if self.provisioning.readiness_poll_interval_ms > self.provisioning.readiness_timeout_ms {
            return Err(ConfigError::Invalid(
                "provisioning.readiness_poll_interval_ms exceeds readiness_timeout_ms".into(),
            ));
        }
        Ok(())
    }
}
