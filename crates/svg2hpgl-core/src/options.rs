//! Conversion and output options
//!
//! Numeric knobs shared by the converter and the settings file. Every field
//! has a default so partial configuration files deserialize cleanly.

use crate::error::{ConversionError, ConversionResult};
use crate::units::DEFAULT_UNITS_PER_MM;
use serde::{Deserialize, Serialize};

/// Default chordal tolerance in millimetres, comparable to a fine pen width.
pub const DEFAULT_TOLERANCE_MM: f64 = 0.1;

/// Default number of pens in the carousel.
pub const DEFAULT_PEN_COUNT: u8 = 8;

/// Default bound on Bezier subdivision depth.
pub const DEFAULT_MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Upper bound accepted for the subdivision depth.
pub const MAX_SUBDIVISION_DEPTH_LIMIT: u32 = 32;

/// Geometry settings for a conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Maximum distance between a curve and its polyline approximation (mm)
    pub tolerance_mm: f64,
    /// Plotter steps per millimetre
    pub units_per_mm: f64,
    /// Number of pens available; colours beyond this fall back to pen 1
    pub pen_count: u8,
    /// Recursion bound for Bezier subdivision
    pub max_subdivision_depth: u32,
    /// Flip the Y axis so the plot origin is the bottom-left page corner
    pub flip_y: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            tolerance_mm: DEFAULT_TOLERANCE_MM,
            units_per_mm: DEFAULT_UNITS_PER_MM,
            pen_count: DEFAULT_PEN_COUNT,
            max_subdivision_depth: DEFAULT_MAX_SUBDIVISION_DEPTH,
            flip_y: true,
        }
    }
}

impl ConversionOptions {
    /// Validate option ranges
    pub fn validate(&self) -> ConversionResult<()> {
        if !(self.tolerance_mm.is_finite() && self.tolerance_mm > 0.0) {
            return Err(ConversionError::InvalidOptions(format!(
                "tolerance_mm must be > 0 (got {})",
                self.tolerance_mm
            )));
        }

        if !(self.units_per_mm.is_finite() && self.units_per_mm > 0.0) {
            return Err(ConversionError::InvalidOptions(format!(
                "units_per_mm must be > 0 (got {})",
                self.units_per_mm
            )));
        }

        if self.pen_count == 0 {
            return Err(ConversionError::InvalidOptions(
                "pen_count must be at least 1".to_string(),
            ));
        }

        if self.max_subdivision_depth == 0
            || self.max_subdivision_depth > MAX_SUBDIVISION_DEPTH_LIMIT
        {
            return Err(ConversionError::InvalidOptions(format!(
                "max_subdivision_depth must be within 1..={} (got {})",
                MAX_SUBDIVISION_DEPTH_LIMIT, self.max_subdivision_depth
            )));
        }

        Ok(())
    }
}

/// Text framing and post-processing of the HPGL program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Start the program with `IN;`
    pub initialize: bool,
    /// End the program with `SP0;`
    pub park_pen: bool,
    /// Remove redundant instructions before writing
    pub optimize: bool,
    /// Merge consecutive pen-down moves into one `PA` with several pairs
    pub compact: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            initialize: true,
            park_pen: true,
            optimize: true,
            compact: false,
        }
    }
}
