//! Conversion pipeline
//!
//! Three phase values, each consumed by the next:
//! [`ParsedDocument`] → [`FlattenedDocument`] → [`EmittedProgram`].
//! Element-scoped failures become [`SkippedElement`] warnings; the run only
//! fails when nothing drawable survives.

use crate::document::{Document, Element, ElementKind};
use crate::flattener::{FlattenedPath, Flattener};
use crate::hpgl::{HpglEmitter, HpglWriter, PlotterInstruction};
use crate::interpreter::interpret;
use crate::transform::{compose, parse_transform};
use crate::Transform;
use std::fs;
use std::path::Path;
use svg2hpgl_core::{ConversionError, ConversionOptions, ConversionResult, ElementError, OutputOptions};
use tracing::{debug, info, warn};

/// An element excluded from the output, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedElement {
    /// Diagnostic label such as `<path id="outline">`.
    pub element: String,
    pub error: ElementError,
}

/// Phase 1: a parsed document with validated options.
#[derive(Debug)]
pub struct ParsedDocument {
    document: Document,
    options: ConversionOptions,
}

impl ParsedDocument {
    pub fn new(document: Document, options: ConversionOptions) -> ConversionResult<Self> {
        options.validate()?;
        Ok(Self { document, options })
    }

    /// Parse SVG bytes.
    pub fn parse(svg: &[u8], options: ConversionOptions) -> ConversionResult<Self> {
        options.validate()?;
        Self::new(Document::parse(svg)?, options)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Flatten every visible shape in draw order.
    pub fn flatten(self) -> ConversionResult<FlattenedDocument> {
        let mut walk = Walk {
            flattener: Flattener::from_options(&self.options),
            paths: Vec::new(),
            skipped: Vec::new(),
            empty: 0,
        };
        let root = &self.document.root_style;
        if root.hidden {
            debug!("Root <svg> has display:none");
        } else {
            let viewport = self.document.viewport_transform(self.options.flip_y);
            let stroke = root.stroke.as_deref().filter(|s| *s != "inherit");
            walk.visit(&self.document.elements, &viewport, stroke);
        }

        info!(
            "Flattened {} path(s); {} skipped, {} without drawable geometry",
            walk.paths.len(),
            walk.skipped.len(),
            walk.empty
        );

        if walk.paths.is_empty() {
            return Err(ConversionError::EmptyOutput {
                skipped: walk.skipped.len(),
            });
        }

        Ok(FlattenedDocument {
            paths: walk.paths,
            skipped: walk.skipped,
            options: self.options,
        })
    }
}

struct Walk {
    flattener: Flattener,
    paths: Vec<FlattenedPath>,
    skipped: Vec<SkippedElement>,
    empty: usize,
}

impl Walk {
    fn visit(&mut self, elements: &[Element], parent: &Transform, stroke: Option<&str>) {
        for element in elements {
            if element.style.hidden {
                debug!("Skipping hidden {}", element.label());
                continue;
            }

            let transform = match element.transform.as_deref().map(parse_transform) {
                None => *parent,
                Some(Ok(local)) => compose(&local, parent),
                Some(Err(e)) => {
                    self.skip(element, e.into());
                    continue;
                }
            };

            let stroke = match element.style.stroke.as_deref() {
                None | Some("inherit") => stroke,
                own => own,
            };

            if element.kind == ElementKind::Group {
                self.visit(&element.children, &transform, stroke);
                continue;
            }

            match interpret(element) {
                Ok(segments) => {
                    let path = self.flattener.flatten_path(
                        &segments,
                        &transform,
                        stroke.map(str::to_string),
                    );
                    if path.is_empty() {
                        debug!("{} has no drawable geometry", element.label());
                        self.empty += 1;
                    } else {
                        debug!(
                            "{}: {} point(s) in {} subpath(s)",
                            element.label(),
                            path.points.len(),
                            path.subpath_count()
                        );
                        self.paths.push(path);
                    }
                }
                Err(e) => self.skip(element, e.into()),
            }
        }
    }

    fn skip(&mut self, element: &Element, error: ElementError) {
        let label = element.label();
        warn!("Skipping {}: {}", label, error);
        self.skipped.push(SkippedElement {
            element: label,
            error,
        });
    }
}

/// Phase 2: device-space polylines ready for emission.
#[derive(Debug)]
pub struct FlattenedDocument {
    paths: Vec<FlattenedPath>,
    skipped: Vec<SkippedElement>,
    options: ConversionOptions,
}

impl FlattenedDocument {
    pub fn paths(&self) -> &[FlattenedPath] {
        &self.paths
    }

    pub fn skipped(&self) -> &[SkippedElement] {
        &self.skipped
    }

    /// Emit plotter instructions in draw order.
    pub fn emit(self) -> EmittedProgram {
        let mut emitter = HpglEmitter::new(&self.options);
        let instructions = emitter.emit(&self.paths);

        let report = ConversionReport {
            elements_drawn: self.paths.len(),
            subpaths_drawn: self.paths.iter().map(FlattenedPath::subpath_count).sum(),
            pens_used: emitter.palette().assignments().to_vec(),
            skipped: self.skipped,
        };
        info!(
            "Emitted {} instruction(s) for {} element(s)",
            instructions.len(),
            report.elements_drawn
        );

        EmittedProgram {
            instructions,
            report,
        }
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionReport {
    pub elements_drawn: usize,
    pub subpaths_drawn: usize,
    /// Normalised stroke colour and pen, in pen order.
    pub pens_used: Vec<(String, u8)>,
    pub skipped: Vec<SkippedElement>,
}

/// Phase 3: the instruction stream and its report.
#[derive(Debug, Clone)]
pub struct EmittedProgram {
    pub instructions: Vec<PlotterInstruction>,
    pub report: ConversionReport,
}

impl EmittedProgram {
    /// Render as HPGL text.
    pub fn to_hpgl(&self, output: &OutputOptions) -> String {
        HpglWriter::new(output.clone()).write(&self.instructions)
    }
}

/// Parse, flatten and emit in one call.
pub fn convert(svg: &[u8], options: &ConversionOptions) -> ConversionResult<EmittedProgram> {
    Ok(ParsedDocument::parse(svg, options.clone())?.flatten()?.emit())
}

/// Convert straight to HPGL program text.
pub fn convert_to_hpgl(
    svg: &[u8],
    options: &ConversionOptions,
    output: &OutputOptions,
) -> ConversionResult<(String, ConversionReport)> {
    let program = convert(svg, options)?;
    let text = program.to_hpgl(output);
    Ok((text, program.report))
}

/// Convert the SVG file at `input` and write the program to `output`.
///
/// Nothing is written when the conversion fails.
pub fn convert_file(
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
    output_options: &OutputOptions,
) -> ConversionResult<ConversionReport> {
    let svg = fs::read(input)?;
    let (text, report) = convert_to_hpgl(&svg, options, output_options)?;
    fs::write(output, text)?;
    Ok(report)
}
