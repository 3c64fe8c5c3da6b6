//! Configuration parsing.
//!
//! Supports TOML (primary) and JSON formats.

use contracts::{EngineError, SimulationConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML configuration
pub fn parse_toml(content: &str) -> Result<SimulationConfig, EngineError> {
    toml::from_str(content).map_err(|e| EngineError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON configuration
pub fn parse_json(content: &str) -> Result<SimulationConfig, EngineError> {
    serde_json::from_str(content).map_err(|e| EngineError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<SimulationConfig, EngineError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
