//! # svg2hpgl Core
//!
//! Core types shared by the svg2hpgl crates: the error taxonomy, SVG length
//! units and the conversion/output option sets.

pub mod error;
pub mod options;
pub mod units;

pub use error::{
    ConversionError, ConversionResult, ElementError, MalformedPathError,
    ParseError, UnsupportedTransformError,
};
pub use options::{ConversionOptions, OutputOptions};
pub use units::{mm_to_plotter_units, parse_length_mm, Length, LengthUnit};
