//! Error handling for MapKit
//!
//! Provides the error types shared by the region editing engine:
//! - Region errors (validation, transaction lifecycle, remote rejection)
//! - Configuration errors (loading and validating editor settings)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::data::RegionIndex;

/// Region editing error type
///
/// Represents every failure the region engine reports to its callers,
/// from local validation through inconsistencies with the remote store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// A region polygon needs at least three distinct vertices
    #[error("Region requires minimum 3 vertices")]
    NotEnoughVertices,

    /// A transaction is already running
    #[error("A region transaction is already active")]
    TransactionAlreadyActive,

    /// No transaction is running, so there is no segment to act on
    #[error("No segment to commit")]
    NoActiveTransaction,

    /// Editing was requested without an existing region
    #[error("Editing transaction requires an existing region")]
    MissingRegion,

    /// A region index does not resolve in the current scene
    #[error("Region {index} not found")]
    RegionNotFound {
        /// The index that could not be resolved.
        index: RegionIndex,
    },

    /// The merge target does not resolve in the current scene
    #[error("Merge target region not found")]
    MergeTargetNotFound,

    /// The remote store rejected a mutation
    #[error("{message}")]
    Remote {
        /// The message reported by the store.
        message: String,
    },

    /// The scene does not exist in the store
    #[error("Scene {0} not found")]
    SceneNotFound(String),
}

impl RegionError {
    /// Create a remote rejection from a message
    pub fn remote(message: impl Into<String>) -> Self {
        RegionError::Remote {
            message: message.into(),
        }
    }

    /// Check if this error was raised before any network call
    pub fn is_validation_error(&self) -> bool {
        matches!(self, RegionError::NotEnoughVertices)
    }

    /// Check if this error came from the remote store
    pub fn is_remote_error(&self) -> bool {
        matches!(self, RegionError::Remote { .. } | RegionError::SceneNotFound(_))
    }

    /// Check if this error means local state disagrees with the store
    pub fn is_inconsistency(&self) -> bool {
        matches!(
            self,
            RegionError::RegionNotFound { .. } | RegionError::MergeTargetNotFound
        )
    }
}

/// Errors related to loading and validating editor configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for the expected schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configuration value is out of its valid range.
    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },
}

/// Result type using RegionError
pub type Result<T> = std::result::Result<T, RegionError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
