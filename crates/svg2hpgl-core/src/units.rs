//! Unit conversion utilities
//!
//! Handles SVG lengths (`px`, `mm`, `cm`, `in`, `pt`, `pc`) and the mapping
//! from millimetres to integral plotter steps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// CSS reference pixel density; unitless SVG lengths are pixels.
pub const PX_PER_INCH: f64 = 96.0;

/// HP plotter resolution: one plotter unit is 0.025 mm.
pub const DEFAULT_UNITS_PER_MM: f64 = 40.0;

/// Absolute length units accepted on the root `<svg>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    /// CSS pixel (also used for unitless numbers)
    #[default]
    Px,
    /// Millimetre
    Mm,
    /// Centimetre
    Cm,
    /// Inch
    In,
    /// Point (1/72 in)
    Pt,
    /// Pica (1/6 in)
    Pc,
}

impl LengthUnit {
    /// Size of one unit in millimetres.
    pub fn mm_per_unit(self) -> f64 {
        match self {
            Self::Px => MM_PER_INCH / PX_PER_INCH,
            Self::Mm => 1.0,
            Self::Cm => 10.0,
            Self::In => MM_PER_INCH,
            Self::Pt => MM_PER_INCH / 72.0,
            Self::Pc => MM_PER_INCH / 6.0,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px => write!(f, "px"),
            Self::Mm => write!(f, "mm"),
            Self::Cm => write!(f, "cm"),
            Self::In => write!(f, "in"),
            Self::Pt => write!(f, "pt"),
            Self::Pc => write!(f, "pc"),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "px" => Ok(Self::Px),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "in" => Ok(Self::In),
            "pt" => Ok(Self::Pt),
            "pc" => Ok(Self::Pc),
            other => Err(format!("Unknown length unit: {}", other)),
        }
    }
}

/// A number with an absolute unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    /// Length in millimetres.
    pub fn to_mm(self) -> f64 {
        self.value * self.unit.mm_per_unit()
    }
}

impl FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let split = input
            .find(|c: char| c.is_ascii_alphabetic() || c == '%')
            .unwrap_or(input.len());
        let (number, unit) = input.split_at(split);

        // "1e3mm" is a number with an exponent, not the unit "e3mm"
        let (number, unit) = if unit.starts_with(['e', 'E'])
            && unit[1..].starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
        {
            let exp_end = unit[1..]
                .find(|c: char| c.is_ascii_alphabetic() || c == '%')
                .map(|i| i + 1)
                .unwrap_or(unit.len());
            (&input[..split + exp_end], &unit[exp_end..])
        } else {
            (number, unit)
        };

        if unit == "%" {
            return Err(format!("Relative length not supported: {}", input));
        }

        let value = number
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("Invalid length: {}", input))?;
        if !value.is_finite() {
            return Err(format!("Invalid length: {}", input));
        }

        Ok(Self::new(value, unit.parse()?))
    }
}

/// Parse an SVG length and return it in millimetres.
pub fn parse_length_mm(input: &str) -> Result<f64, String> {
    input.parse::<Length>().map(Length::to_mm)
}

/// Convert millimetres to plotter steps, rounding half away from zero.
///
/// Values outside the `i32` range saturate.
pub fn mm_to_plotter_units(mm: f64, units_per_mm: f64) -> i32 {
    let scaled = (mm * units_per_mm).round();
    if scaled.is_nan() {
        0
    } else {
        scaled as i32
    }
}
