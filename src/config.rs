//! Configuration management.
//!
//! Values come from, in increasing precedence:
//! - built-in defaults
//! - a TOML config file
//! - `PEERTRADE_*` environment variables
//! - CLI flags (applied by the binary)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TradeError};
use crate::types::Position;

/// Default lifetime of a pending trade request, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 10.0;

/// Default maximum distance between two avatars for an interaction to count
pub const DEFAULT_MAX_INTERACT_DISTANCE: f32 = 5.0;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node identity and transport settings
    #[serde(default)]
    pub node: NodeSettings,

    /// Negotiation protocol settings
    #[serde(default)]
    pub negotiation: NegotiationConfig,
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            TradeError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PEERTRADE_*` environment variables (unparseable values are ignored)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = std::env::var("PEERTRADE_NAME") {
            self.node.name = name;
        }
        if let Some(port) = env_parse("PEERTRADE_PORT") {
            self.node.port = port;
        }
        if let Some(tick) = env_parse("PEERTRADE_TICK_MS") {
            self.node.tick_interval_ms = tick;
        }
        if let Some(timeout) = env_parse("PEERTRADE_REQUEST_TIMEOUT") {
            self.negotiation.request_timeout_secs = timeout;
        }
        if let Some(distance) = env_parse("PEERTRADE_MAX_DISTANCE") {
            self.negotiation.max_interact_distance = distance;
        }
        self
    }

    /// Reject values the negotiation protocol cannot run with
    pub fn validate(&self) -> Result<()> {
        self.negotiation.validate()?;

        if self.node.tick_interval_ms == 0 {
            return Err(TradeError::InvalidConfig(
                "node.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if !self.node.position().is_finite() {
            return Err(TradeError::InvalidConfig(format!(
                "node.position must be finite, got {:?}",
                self.node.position
            )));
        }
        if self.node.name.trim().is_empty() {
            return Err(TradeError::InvalidConfig(
                "node.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TradeError::Configuration(format!("Failed to render config: {}", e)))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Node identity and transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Display name announced to peers
    pub name: String,

    /// Port to listen on
    pub port: u16,

    /// Initial avatar position
    pub position: [f32; 3],

    /// Peer addresses to dial at startup
    pub connect: Vec<String>,

    /// Frame tick interval in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            name: "peer".to_string(),
            port: 9000,
            position: [0.0, 0.0, 0.0],
            connect: Vec::new(),
            tick_interval_ms: 100,
        }
    }
}

impl NodeSettings {
    /// Get the listen address
    pub fn listen_addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn position(&self) -> Position {
        self.position.into()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Negotiation protocol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// How long a sent or received request stays pending
    pub request_timeout_secs: f64,

    /// Maximum avatar distance for a trade interaction
    pub max_interact_distance: f32,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_interact_distance: DEFAULT_MAX_INTERACT_DISTANCE,
        }
    }
}

impl NegotiationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.request_timeout_secs.is_finite() && self.request_timeout_secs > 0.0) {
            return Err(TradeError::InvalidConfig(format!(
                "negotiation.request_timeout_secs must be positive, got {}",
                self.request_timeout_secs
            )));
        }
        if !(self.max_interact_distance.is_finite() && self.max_interact_distance > 0.0) {
            return Err(TradeError::InvalidConfig(format!(
                "negotiation.max_interact_distance must be positive, got {}",
                self.max_interact_distance
            )));
        }
        Ok(())
    }
}
