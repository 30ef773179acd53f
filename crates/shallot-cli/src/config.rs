//! Configuration system for the shallot CLI.

use serde::{Deserialize, Serialize};
use shallot_core::NetworkPlan;
use std::fs;
use std::net::IpAddr;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// shallot configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Network layout
    #[serde(default)]
    pub network: NetworkConfig,
    /// Routing configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Host every service binds on
    #[serde(default = "default_host")]
    pub host: String,
    /// Port of relay 0
    #[serde(default = "default_base_relay_port")]
    pub base_relay_port: u16,
    /// Port of user 0
    #[serde(default = "default_base_user_port")]
    pub base_user_port: u16,
    /// Directory port
    #[serde(default = "default_registry_port")]
    pub registry_port: u16,
    /// Ids per range; relay and user ids must be below this
    #[serde(default = "default_max_nodes")]
    pub max_nodes: u16,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Relays per circuit
    #[serde(default = "default_circuit_length")]
    pub circuit_length: usize,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_base_relay_port() -> u16 {
    shallot_core::config::DEFAULT_BASE_RELAY_PORT
}

fn default_base_user_port() -> u16 {
    shallot_core::config::DEFAULT_BASE_USER_PORT
}

fn default_registry_port() -> u16 {
    shallot_discovery::DEFAULT_REGISTRY_PORT
}

fn default_max_nodes() -> u16 {
    1000
}

fn default_circuit_length() -> usize {
    shallot_core::config::DEFAULT_CIRCUIT_LENGTH
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            base_relay_port: default_base_relay_port(),
            base_user_port: default_base_user_port(),
            registry_port: default_registry_port(),
            max_nodes: default_max_nodes(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            circuit_length: default_circuit_length(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("shallot/config.toml")
    }

    /// Load config from default path, or create default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if reading or creating the config fails.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            let config = Self::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Network plan described by this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not an IP address.
    pub fn plan(&self) -> anyhow::Result<NetworkPlan> {
        let host: IpAddr = self
            .network
            .host
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid host: {}", self.network.host))?;

        Ok(NetworkPlan {
            host,
            base_relay_port: self.network.base_relay_port,
            base_user_port: self.network.base_user_port,
            registry_port: self.network.registry_port,
            circuit_length: self.routing.circuit_length,
            request_timeout: Duration::from_millis(self.routing.request_timeout_ms),
        })
    }

    /// Check that `id` falls inside the configured id range
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is too large.
    pub fn check_id(&self, kind: &str, id: u32) -> anyhow::Result<()> {
        if id >= u32::from(self.network.max_nodes) {
            anyhow::bail!(
                "{kind} id {id} out of range (max_nodes = {})",
                self.network.max_nodes
            );
        }
        Ok(())
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.plan()?;

        let network = &self.network;
        if network.base_relay_port == 0
            || network.base_user_port == 0
            || network.registry_port == 0
        {
            anyhow::bail!("Ports must be non-zero");
        }

        if network.max_nodes == 0 {
            anyhow::bail!("max_nodes must be at least 1");
        }

        let relays = port_range("Relay", network.base_relay_port, network.max_nodes)?;
        let users = port_range("User", network.base_user_port, network.max_nodes)?;

        if relays.start < users.end && users.start < relays.end {
            anyhow::bail!("Relay ports {relays:?} overlap user ports {users:?}");
        }
        if relays.contains(&u32::from(network.registry_port))
            || users.contains(&u32::from(network.registry_port))
        {
            anyhow::bail!(
                "Registry port {} falls inside a relay or user port range",
                network.registry_port
            );
        }

        if self.routing.circuit_length == 0 {
            anyhow::bail!("Circuit length must be at least 1");
        }

        if self.routing.request_timeout_ms == 0 {
            anyhow::bail!("Request timeout must be greater than zero");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }
}

/// Ports `[base, base + count)`, checked against the port space.
fn port_range(name: &str, base: u16, count: u16) -> anyhow::Result<Range<u32>> {
    let start = u32::from(base);
    let end = start + u32::from(count);
    if end > u32::from(u16::MAX) + 1 {
        anyhow::bail!("{name} ports starting at {base} exceed the port range");
    }
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let plan = config.plan().unwrap();
        assert_eq!(plan, NetworkPlan::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.routing.circuit_length = 0;
        assert!(config.validate().is_err());
        config.routing.circuit_length = 3;

        config.routing.request_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.routing.request_timeout_ms = 5000;

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.network.host = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let mut config = Config::default();
        config.network.base_user_port = 4500;
        assert!(config.validate().is_err());

        config.network.base_user_port = 5000;
        assert!(config.validate().is_ok());

        config.network.registry_port = 5001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_range_past_port_space_rejected() {
        let mut config = Config::default();
        config.network.base_relay_port = 65000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_check_id() {
        let config = Config::default();
        assert!(config.check_id("relay", 999).is_ok());
        assert!(config.check_id("relay", 1000).is_err());
    }

    #[test]
    fn test_toml_roundtrip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.routing.circuit_length = 4;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.routing.circuit_length, 4);
        assert_eq!(loaded.network.host, "127.0.0.1");

        let partial: Config = toml::from_str("[routing]\ncircuit_length = 2\n").unwrap();
        assert_eq!(partial.routing.circuit_length, 2);
        assert_eq!(partial.network.registry_port, 8080);
    }
}
