//! HPGL/1 emission
//!
//! [`HpglEmitter`] turns flattened device-space paths into a stream of
//! [`PlotterInstruction`]s; [`HpglWriter`] frames that stream as program text.

use crate::flattener::{FlattenedPath, PenState};
use crate::optimizer::HpglOptimizer;
use crate::pens::{PenPalette, DEFAULT_PEN};
use crate::Point;
use std::fmt;
use std::io::{self, Write};
use svg2hpgl_core::{mm_to_plotter_units, ConversionOptions, OutputOptions};

/// One HPGL/1 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotterInstruction {
    PenUp,
    PenDown,
    /// Absolute move in plotter units; draws when the pen is down.
    MoveAbsolute { x: i32, y: i32 },
    SelectPen(u8),
}

impl fmt::Display for PlotterInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PenUp => write!(f, "PU;"),
            Self::PenDown => write!(f, "PD;"),
            Self::MoveAbsolute { x, y } => write!(f, "PA{},{};", x, y),
            Self::SelectPen(pen) => write!(f, "SP{};", pen),
        }
    }
}

/// Converts flattened paths into plotter instructions.
#[derive(Debug, Clone)]
pub struct HpglEmitter {
    units_per_mm: f64,
    palette: PenPalette,
    selected_pen: u8,
    /// `None` until the first pen command.
    pen: Option<PenState>,
}

impl HpglEmitter {
    pub fn new(options: &ConversionOptions) -> Self {
        Self {
            units_per_mm: options.units_per_mm,
            palette: PenPalette::new(options.pen_count),
            // The writer header selects pen 1
            selected_pen: DEFAULT_PEN,
            pen: None,
        }
    }

    pub fn palette(&self) -> &PenPalette {
        &self.palette
    }

    fn to_plotter(&self, p: Point) -> PlotterInstruction {
        PlotterInstruction::MoveAbsolute {
            x: mm_to_plotter_units(p.x, self.units_per_mm),
            y: mm_to_plotter_units(p.y, self.units_per_mm),
        }
    }

    fn lift(&mut self, out: &mut Vec<PlotterInstruction>) {
        if self.pen != Some(PenState::Up) {
            out.push(PlotterInstruction::PenUp);
            self.pen = Some(PenState::Up);
        }
    }

    /// Emit all paths in order.
    pub fn emit(&mut self, paths: &[FlattenedPath]) -> Vec<PlotterInstruction> {
        let mut out = Vec::new();
        for path in paths {
            self.emit_path(path, &mut out);
        }
        out
    }

    /// Emit one path: pen selection, then each subpath, then a final lift.
    pub fn emit_path(&mut self, path: &FlattenedPath, out: &mut Vec<PlotterInstruction>) {
        if path.is_empty() {
            return;
        }

        let pen = self.palette.pen_for(path.stroke.as_deref());
        if pen != self.selected_pen {
            self.lift(out);
            out.push(PlotterInstruction::SelectPen(pen));
            self.selected_pen = pen;
        }

        for point in &path.points {
            match point.pen {
                PenState::Up => {
                    self.lift(out);
                    out.push(self.to_plotter(point.at));
                }
                PenState::Down => {
                    if self.pen != Some(PenState::Down) {
                        out.push(PlotterInstruction::PenDown);
                        self.pen = Some(PenState::Down);
                    }
                    out.push(self.to_plotter(point.at));
                }
            }
        }

        self.lift(out);
    }
}

/// Frames an instruction stream as HPGL program text.
#[derive(Debug, Clone, Default)]
pub struct HpglWriter {
    options: OutputOptions,
}

impl HpglWriter {
    pub fn new(options: OutputOptions) -> Self {
        Self { options }
    }

    /// Instructions as written, after optional redundancy removal.
    fn prepare(&self, instructions: &[PlotterInstruction]) -> Vec<PlotterInstruction> {
        if self.options.optimize {
            HpglOptimizer::optimize(instructions)
        } else {
            instructions.to_vec()
        }
    }

    /// Render the full program.
    pub fn write(&self, instructions: &[PlotterInstruction]) -> String {
        let mut text = String::new();
        if self.options.initialize {
            text.push_str("IN;");
        }
        text.push_str(&PlotterInstruction::SelectPen(DEFAULT_PEN).to_string());

        let body = self.prepare(instructions);
        if self.options.compact {
            write_compact(&body, &mut text);
        } else {
            for instruction in &body {
                text.push_str(&instruction.to_string());
            }
        }

        if self.options.park_pen {
            text.push_str(&PlotterInstruction::SelectPen(0).to_string());
        }
        text.push('\n');
        text
    }

    pub fn write_to<W: Write>(&self, instructions: &[PlotterInstruction], out: &mut W) -> io::Result<()> {
        out.write_all(self.write(instructions).as_bytes())?;
        out.flush()
    }
}

/// Merge runs of moves into single `PA` instructions with several pairs.
fn write_compact(instructions: &[PlotterInstruction], text: &mut String) {
    let mut in_run = false;
    for instruction in instructions {
        match instruction {
            PlotterInstruction::MoveAbsolute { x, y } => {
                if in_run {
                    text.pop();
                    text.push_str(&format!(",{},{};", x, y));
                } else {
                    text.push_str(&instruction.to_string());
                    in_run = true;
                }
            }
            other => {
                text.push_str(&other.to_string());
                in_run = false;
            }
        }
    }
}
