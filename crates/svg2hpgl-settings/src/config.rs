//! Configuration file handling
//!
//! A single [`Config`] with two sections, `[conversion]` and `[output]`,
//! stored as TOML or JSON (chosen by file extension). Missing keys fall back
//! to defaults, so a file only needs the values it changes:
//!
//! ```toml
//! [conversion]
//! tolerance_mm = 0.05
//! pen_count = 4
//!
//! [output]
//! compact = true
//! ```

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use svg2hpgl_core::{ConversionOptions, OutputOptions};
use tracing::{debug, info};

/// Application directory under the platform config directory.
pub const APP_DIR: &str = "svg2hpgl";

/// Default config file name.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Complete converter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Geometry settings
    pub conversion: ConversionOptions,
    /// HPGL text framing
    pub output: OutputOptions,
}

impl Config {
    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.conversion.validate()?;
        Ok(())
    }

    /// Platform default location, e.g. `~/.config/svg2hpgl/config.toml`.
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load from `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load the platform default config, or defaults when there is none.
    pub fn load_default() -> SettingsResult<Self> {
        match Self::default_path() {
            Ok(path) => Self::load_or_default(&path),
            Err(e) => {
                debug!("{}; using defaults", e);
                Ok(Self::default())
            }
        }
    }
}
