//! Console configuration.
//!
//! Loaded from a TOML file by the host binary. Every field has a default so
//! a partial (or empty) file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::access::AccessLevel;
use crate::error::{HelmError, Result};

/// Settings for an interactive console session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Prompt printed before each input line.
    pub prompt: String,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Access level granted to the local session.
    pub session_access: AccessLevel,
    /// Optional text printed once when the console starts.
    pub banner: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            log_filter: "info".to_string(),
            session_access: AccessLevel::Administrator,
            banner: None,
        }
    }
}

impl ConsoleConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.log_filter.trim().is_empty() {
            return Err(HelmError::Config("log_filter must not be empty".to_string()));
        }
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded console config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Render the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }
}
