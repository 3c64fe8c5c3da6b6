//! Layered error definitions
//!
//! Categorized by source: config / io

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum EngineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Grid size must be at least 1; nothing can run on an empty grid
    #[error("invalid grid size: {size}")]
    InvalidGridSize { size: i64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }
}
