//! Broker configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! overall_verbosity = "minor-steps"
//! shutdown_timeout_ms = 100
//! color = false
//!
//! [sources]
//! Net = "errors"
//! Indexer = "everything"
//! ```

use crate::broker::error::ConfigError;
use crate::broker::severity::Severity;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default wait for the consumer to acknowledge shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Global ceiling applied to every source
    pub overall_verbosity: Severity,
    /// Bounded wait for the consumer during shutdown
    pub shutdown_timeout_ms: u64,
    /// Colour severity labels
    pub color: bool,
    /// Per-source ceilings by name; these replace the ceiling a source
    /// registers with
    pub sources: BTreeMap<String, Severity>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            overall_verbosity: Severity::MinorSteps,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            color: false,
            sources: BTreeMap::new(),
        }
    }
}

impl BrokerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: BrokerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "shutdown_timeout_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(name) = self.sources.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("sources.{name:?}"),
                message: "source name cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn with_overall_verbosity(mut self, level: Severity) -> Self {
        self.overall_verbosity = level;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_source(mut self, name: impl Into<String>, ceiling: Severity) -> Self {
        self.sources.insert(name.into(), ceiling);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}
