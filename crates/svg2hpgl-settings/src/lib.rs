//! # svg2hpgl Settings
//!
//! Loading, saving and validation of the converter configuration file.

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{SettingsError, SettingsResult};
