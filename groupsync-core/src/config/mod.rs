//! Configuration management for a groupsync node
//!
//! Two layers:
//! - [`NodeConfig`]: process-level settings (node identity, logging, event
//!   channel, local groups), loaded from TOML or `GROUPSYNC_*` variables.
//! - [`GroupProperties`]: the group-scoped property space read by the sync
//!   policy resolver and the access filter.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

mod error;
mod properties;

pub use error::{ConfigError, ConfigResult};
pub use properties::{property_key, GroupProperties, PropertySource, KEY_SEPARATOR, SYNC};

/// Main node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub logging: LoggingConfig,
    pub events: EventsConfig,
    pub groups: GroupsConfig,
}

/// Identity of the local node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    pub host: String,
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub json_format: bool,
    pub with_timestamp: bool,
    pub with_target: bool,
}

/// Outbound cluster event channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast buffer size
    pub capacity: usize,

    /// Initial producer switch position
    pub producer_enabled: bool,
}

/// Local group membership and the property file backing it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    /// Groups this node joins at startup
    pub local: Vec<String>,

    /// Default category synchronized by this node
    pub category: String,

    pub properties_file: Option<PathBuf>,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5701,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            producer_enabled: true,
        }
    }
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            local: vec!["default".to_string()],
            category: "features".to_string(),
            properties_file: None,
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables
    ///
    /// Variables follow `GROUPSYNC_<SECTION>_<KEY>`, e.g.
    /// `GROUPSYNC_NODE_PORT=5702` or `GROUPSYNC_GROUPS_LOCAL=default,edge`.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("GROUPSYNC_NODE_HOST") {
            config.node.host = host;
        }
        if let Ok(port) = env::var("GROUPSYNC_NODE_PORT") {
            config.node.port = port
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid node port: {}", e)))?;
        }

        if let Ok(level) = env::var("GROUPSYNC_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("GROUPSYNC_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        if let Ok(capacity) = env::var("GROUPSYNC_EVENTS_CAPACITY") {
            config.events.capacity = capacity
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid event capacity: {}", e)))?;
        }
        if let Ok(enabled) = env::var("GROUPSYNC_EVENTS_PRODUCER_ENABLED") {
            config.events.producer_enabled = enabled
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid producer flag: {}", e)))?;
        }

        if let Ok(groups) = env::var("GROUPSYNC_GROUPS_LOCAL") {
            config.groups.local = groups
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(category) = env::var("GROUPSYNC_GROUPS_CATEGORY") {
            config.groups.category = category;
        }
        if let Ok(path) = env::var("GROUPSYNC_GROUPS_PROPERTIES_FILE") {
            config.groups.properties_file = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ConfigResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.node.host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("node host must not be empty".to_string()));
        }
        if self.node.port == 0 {
            return Err(ConfigError::ValidationFailed(
                "node port must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        if self.events.capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "event capacity must be greater than 0".to_string(),
            ));
        }

        validate_segment("category", &self.groups.category)?;
        for group in &self.groups.local {
            validate_segment("group name", group)?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> ConfigResult<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }

    /// `host:port` identifier of the local node
    pub fn node_id(&self) -> String {
        format!("{}:{}", self.node.host, self.node.port)
    }
}

/// Group names and categories become key segments, so they may not contain
/// the property separator or the store namespace separator.
fn validate_segment(what: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(format!("{} must not be empty", what)));
    }
    if value.contains(KEY_SEPARATOR) || value.contains("::") || value.contains('/') {
        return Err(ConfigError::ValidationFailed(format!(
            "{} '{}' contains a reserved separator",
            what, value
        )));
    }
    Ok(())
}
