//! Configuration file discovery and merging with command line values

use super::args::Args;
use crate::broker::{BrokerConfig, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

/// `<config_dir>/Msgbroker/msgbroker.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Msgbroker").join("msgbroker.toml"))
}

impl Args {
    /// Load the configuration file and apply command line overrides
    ///
    /// A file named with `--config-file` must exist. The default file is
    /// used only when present; otherwise the built-in defaults apply.
    pub fn resolve_config(&self) -> Result<BrokerConfig, ConfigError> {
        let config = match &self.config_file {
            Some(path) => BrokerConfig::load(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    log::debug!("using default configuration {}", path.display());
                    BrokerConfig::load(&path)?
                }
                _ => BrokerConfig::default(),
            },
        };
        let config = self.apply_overrides(config);
        config.validate()?;
        Ok(config)
    }

    /// Replace configuration values with those given on the command line
    pub fn apply_overrides(&self, mut config: BrokerConfig) -> BrokerConfig {
        if let Some(level) = self.verbosity {
            config = config.with_overall_verbosity(level);
        }
        if let Some(millis) = self.shutdown_timeout_ms {
            config = config.with_shutdown_timeout(Duration::from_millis(millis));
        }
        if let Some(color) = self.color_override() {
            config = config.with_color(color);
        }
        for (name, level) in &self.sources {
            config = config.with_source(name.clone(), *level);
        }
        config
    }
}
