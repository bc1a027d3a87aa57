//! Factory configuration (`[factory]` table in TOML)

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read factory configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse factory configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid factory configuration: {0}")]
    ValidationError(String),
}

/// Which builtin hooks a new factory registers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuiltinHooks {
    /// Register the mixin hook
    pub mixins: bool,
    /// Register the interface hook
    pub interface: bool,
    /// Register the contract hook
    pub contract: bool,
}

impl Default for BuiltinHooks {
    fn default() -> Self {
        Self {
            mixins: true,
            interface: true,
            contract: true,
        }
    }
}

/// Factory settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Maximum number of blueprints in one delegation chain
    pub max_chain_depth: usize,
    /// Reject chains in which a blueprint delegates to itself
    pub detect_cycles: bool,
    /// Builtin hook selection
    pub hooks: BuiltinHooks,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 64,
            detect_cycles: true,
            hooks: BuiltinHooks::default(),
        }
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    factory: FactoryConfig,
}

impl FactoryConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from TOML text; a missing `[factory]` table yields defaults
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.factory.validate()?;
        Ok(file.factory)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_chain_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
