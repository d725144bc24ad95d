//! # svg2hpgl Converter
//!
//! Geometry translation engine: parses SVG, resolves transforms, flattens
//! curves and emits HPGL/1 plotter instructions.
//!
//! ```text
//! Document ──► interpret ──► Flattener ──► HpglEmitter ──► HpglWriter
//!    (parse)   (segments)    (device mm)   (instructions)   (text)
//! ```
//!
//! [`pipeline`] strings the stages together; each stage is usable on its own.

pub mod document;
pub mod flattener;
pub mod hpgl;
pub mod interpreter;
pub mod optimizer;
pub mod path_data;
pub mod pens;
pub mod pipeline;
pub mod transform;

/// Point in user or device space (f64 precision).
pub type Point = lyon::geom::Point<f64>;

/// 2×3 affine transform in row-vector form.
pub type Transform = lyon::geom::Transform<f64>;

pub use lyon::geom::point;

pub use document::{Document, Element, ElementKind, PreserveAspectRatio, Style, ViewBox};
pub use flattener::{FlattenedPath, Flattener, PenState, PlotPoint};
pub use hpgl::{HpglEmitter, HpglWriter, PlotterInstruction};
pub use interpreter::{interpret, parse_path_data, PathSegment};
pub use optimizer::HpglOptimizer;
pub use pens::{normalize_color, PenPalette};
pub use pipeline::{
    convert, convert_file, convert_to_hpgl, ConversionReport, EmittedProgram, FlattenedDocument,
    ParsedDocument, SkippedElement,
};
pub use transform::{compose, parse_transform, resolve};
