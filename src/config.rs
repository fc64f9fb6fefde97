//! Run configuration for the host CLI.
//!
//! A config file is JSON, for example:
//! ```json
//! { "max_cycles": 200, "trace": true, "breakpoints": [9, 11] }
//! ```
//! Missing fields take their defaults.

use serde::{Serialize, Deserialize};
use std::path::Path;
use thiserror::Error;

/// Settings for a `run` session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of instruction cycles to run.
    pub max_cycles: u64,
    /// Print every executed instruction.
    pub trace: bool,
    /// Stop before fetching from any of these addresses.
    pub breakpoints: Vec<u8>,
    /// Print the final report as JSON.
    pub json: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_cycles: 1000,
            trace: false,
            breakpoints: Vec::new(),
            json: false,
        }
    }
}

impl RunConfig {
    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }
}

/// Errors that can occur while loading a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_json("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.max_cycles, 1000);
    }

    #[test]
    fn test_partial_config() {
        let config = RunConfig::from_json(r#"{ "trace": true, "breakpoints": [9] }"#).unwrap();
        assert!(config.trace);
        assert_eq!(config.breakpoints, vec![9]);
        assert_eq!(config.max_cycles, 1000);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(RunConfig::from_json(r#"{ "max_cycles": -1 }"#), Err(ConfigError::Json(_))));
    }
}
