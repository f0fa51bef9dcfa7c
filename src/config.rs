use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("invalid serial policy: {0}")]
    InvalidSerial(String),
}

/// How leaf serial numbers are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialPolicy {
    /// A fresh random 128-bit serial per leaf.
    #[default]
    Random,
    /// The same serial for every leaf.
    ///
    /// Clients that cache by issuer and serial may confuse such leaves;
    /// only use this when matching an existing deployment.
    Fixed(u64),
}

/// Minter configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinterConfig {
    /// Config version for future compatibility.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Serial number assignment for minted leaves: `random`, or a
    /// `fixed: N` map.
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub serial: SerialPolicy,
}

fn default_version() -> u32 {
    1
}

impl MinterConfig {
    /// Loads config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses config from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        if self.serial == SerialPolicy::Fixed(0) {
            return Err(ConfigError::InvalidSerial(
                "serial numbers must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MinterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            serial: SerialPolicy::Random,
        }
    }
}
