//! # svg2hpgl
//!
//! Converts SVG vector artwork into HPGL/1 programs for pen plotters.
//!
//! ## Architecture
//!
//! The workspace is split into three library crates and this binary:
//!
//! 1. **svg2hpgl-core** - error taxonomy, units, option sets
//! 2. **svg2hpgl-converter** - SVG parsing, transforms, flattening, HPGL emission
//! 3. **svg2hpgl-settings** - TOML/JSON configuration
//! 4. **svg2hpgl** - command line entry point

pub mod cli;

pub use cli::{run, CliArgs, Command, USAGE};
pub use svg2hpgl_converter::{convert, convert_file, convert_to_hpgl, ConversionReport};
pub use svg2hpgl_core::{ConversionError, ConversionOptions, OutputOptions};
pub use svg2hpgl_settings::Config;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Logs go to stderr so they never mix with program output. `RUST_LOG`
/// overrides the default `info` level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
