//! Editor configuration
//!
//! Settings that tune the region editing engine: history bounds, the
//! geometric tolerance used for adjacency detection, and the defaults used
//! to seed a freshly placed region. Stored as TOML.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Region editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of vertex edits kept for in-transaction undo
    pub local_history_depth: usize,
    /// Maximum number of document-level undo entries
    pub document_history_depth: usize,
    /// Fraction of the smaller grid cell dimension used as distance tolerance
    pub adjacency_tolerance_ratio: f64,
    /// Region type used when a placement does not name one
    pub default_region_type: String,
    /// Region color used when a placement does not name one
    pub default_region_color: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            local_history_depth: 100,
            document_history_depth: 50,
            adjacency_tolerance_ratio: 0.01,
            default_region_type: "custom".to_string(),
            default_region_color: "#808080".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: EditorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded editor config");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.local_history_depth == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "local_history_depth".to_string(),
                value: self.local_history_depth.to_string(),
            });
        }
        if self.document_history_depth == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "document_history_depth".to_string(),
                value: self.document_history_depth.to_string(),
            });
        }
        if !self.adjacency_tolerance_ratio.is_finite() || self.adjacency_tolerance_ratio <= 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "adjacency_tolerance_ratio".to_string(),
                value: self.adjacency_tolerance_ratio.to_string(),
            });
        }
        Ok(())
    }
}
