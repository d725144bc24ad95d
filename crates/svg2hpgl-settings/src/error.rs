//! Error types for the settings crate.

use std::io;
use std::path::PathBuf;
use svg2hpgl_core::ConversionError;
use thiserror::Error;

/// Errors that can occur while loading, saving or validating configuration.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file extension is neither `.toml` nor `.json`.
    #[error("Config file must be .json or .toml: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// A configuration value is invalid.
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// The platform configuration directory could not be determined.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl From<ConversionError> for SettingsError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::InvalidOptions(reason) => Self::InvalidSetting {
                key: "conversion".to_string(),
                reason,
            },
            ConversionError::Io(e) => Self::Io(e),
            other => Self::InvalidSetting {
                key: "conversion".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;
