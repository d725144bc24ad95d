//! Command line handling

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use svg2hpgl_converter::{convert_file, ConversionReport};
use svg2hpgl_settings::Config;
use tracing::{info, warn};

pub const USAGE: &str = "Usage: svg2hpgl <input.svg> <output.hpgl> [--config FILE]

Options:
  -c, --config FILE  Read settings from FILE (.toml or .json)
  -h, --help         Show this help
  -V, --version      Show version information";

/// Parsed invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Convert(CliArgs),
    Help,
    Version,
}

/// Arguments of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
}

impl Command {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut positional = Vec::new();
        let mut config = None;
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Self::Help),
                "-V" | "--version" => return Ok(Self::Version),
                "-c" | "--config" => {
                    let Some(path) = args.next() else {
                        bail!("--config requires a file argument");
                    };
                    config = Some(PathBuf::from(path));
                }
                other if other.starts_with("--config=") => {
                    config = Some(PathBuf::from(&other["--config=".len()..]));
                }
                other if other.starts_with('-') && other.len() > 1 => {
                    bail!("Unknown option '{}'", other);
                }
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        match <[PathBuf; 2]>::try_from(positional) {
            Ok([input, output]) => Ok(Self::Convert(CliArgs {
                input,
                output,
                config,
            })),
            Err(found) => bail!(
                "Expected an input and an output file, got {} argument(s)",
                found.len()
            ),
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Config::load_default().context("Failed to load default config"),
    }
}

/// Convert one file according to `args`.
pub fn run(args: &CliArgs) -> Result<ConversionReport> {
    let config = load_config(args.config.as_deref())?;

    let report = convert_file(&args.input, &args.output, &config.conversion, &config.output)
        .with_context(|| {
            format!(
                "Failed to convert {} to {}",
                args.input.display(),
                args.output.display()
            )
        })?;

    if !report.skipped.is_empty() {
        warn!("{} element(s) skipped", report.skipped.len());
    }
    info!(
        "Wrote {} ({} element(s), {} subpath(s), {} pen(s))",
        args.output.display(),
        report.elements_drawn,
        report.subpaths_drawn,
        report.pens_used.len().max(1)
    );

    Ok(report)
}
