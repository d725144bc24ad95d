//! Curve flattening
//!
//! Converts [`PathSegment`]s into device-space polylines (millimetres). Curves
//! are flattened *after* transformation so the tolerance holds on paper
//! regardless of scale:
//! - Beziers: control points are transformed (affine maps preserve Bezier
//!   form), then midpoint subdivision runs until every control point lies
//!   within the tolerance of the chord
//! - Arcs: converted to center parameterisation in local space and sampled
//!   with a step derived from the device radius
//!
//! Smaller tolerances never yield fewer points: subdivision only refines and
//! the arc step shrinks monotonically.

use crate::interpreter::PathSegment;
use crate::transform::max_stretch;
use crate::{point, Point, Transform};
use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use svg2hpgl_core::ConversionOptions;

/// Hard cap on samples per arc.
const MAX_ARC_SEGMENTS: usize = 1 << 16;

/// Pen position attached to a plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenState {
    /// Travel to the point without drawing.
    Up,
    /// Draw a line to the point.
    Down,
}

/// A device-space point with the pen state used to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotPoint {
    pub at: Point,
    pub pen: PenState,
}

/// Polyline output for one element.
///
/// Every subpath starts with a single `Up` point followed by at least one
/// `Down` point; subpaths that draw nothing are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedPath {
    pub points: Vec<PlotPoint>,
    /// Effective (inherited) stroke value, unnormalised.
    pub stroke: Option<String>,
}

impl FlattenedPath {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Split into subpaths at each pen-up point.
    pub fn subpaths(&self) -> impl Iterator<Item = &[PlotPoint]> {
        let starts: Vec<usize> = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.pen == PenState::Up)
            .map(|(i, _)| i)
            .collect();
        let len = self.points.len();
        (0..starts.len()).map(move |k| {
            let end = starts.get(k + 1).copied().unwrap_or(len);
            &self.points[starts[k]..end]
        })
    }

    pub fn subpath_count(&self) -> usize {
        self.points.iter().filter(|p| p.pen == PenState::Up).count()
    }
}

/// Tolerance-driven segment flattener.
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    tolerance: f64,
    max_depth: u32,
}

impl Flattener {
    pub fn new(tolerance: f64, max_depth: u32) -> Self {
        Self {
            tolerance,
            max_depth,
        }
    }

    pub fn from_options(options: &ConversionOptions) -> Self {
        Self::new(options.tolerance_mm, options.max_subdivision_depth)
    }

    /// Device points covering `segment`, excluding its start point `from`.
    ///
    /// `MoveTo` yields its target, `ClosePath` yields nothing (closing is
    /// handled per subpath by [`Flattener::flatten_path`]).
    pub fn flatten_segment(&self, from: Point, segment: &PathSegment, t: &Transform) -> Vec<Point> {
        let mut out = Vec::new();
        match *segment {
            PathSegment::MoveTo(p) | PathSegment::LineTo(p) => out.push(t.transform_point(p)),
            PathSegment::CubicTo { ctrl1, ctrl2, to } => {
                let curve = CubicBezierSegment {
                    from: t.transform_point(from),
                    ctrl1: t.transform_point(ctrl1),
                    ctrl2: t.transform_point(ctrl2),
                    to: t.transform_point(to),
                };
                self.subdivide_cubic(&curve, 0, &mut out);
            }
            PathSegment::QuadTo { ctrl, to } => {
                let curve = QuadraticBezierSegment {
                    from: t.transform_point(from),
                    ctrl: t.transform_point(ctrl),
                    to: t.transform_point(to),
                };
                self.subdivide_quadratic(&curve, 0, &mut out);
            }
            PathSegment::ArcTo {
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
                to,
            } => {
                let arc = EndpointArc {
                    from,
                    to,
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                };
                self.sample_arc(&arc, t, &mut out);
            }
            PathSegment::ClosePath => {}
        }
        out
    }

    /// Flatten an element's segments into a single pen-annotated polyline.
    pub fn flatten_path(
        &self,
        segments: &[PathSegment],
        t: &Transform,
        stroke: Option<String>,
    ) -> FlattenedPath {
        let origin = point(0.0, 0.0);
        let mut points = Vec::new();
        let mut current = origin;
        let mut start = origin;
        let mut start_device = t.transform_point(origin);
        // Pen-up target not yet committed; dropped if nothing gets drawn
        let mut pending = Some(start_device);

        for segment in segments {
            match *segment {
                PathSegment::MoveTo(p) => {
                    current = p;
                    start = p;
                    start_device = t.transform_point(p);
                    pending = Some(start_device);
                }
                PathSegment::ClosePath => {
                    if pending.is_none() {
                        let last = points.last().map(|p: &PlotPoint| p.at);
                        if last != Some(start_device) {
                            points.push(PlotPoint {
                                at: start_device,
                                pen: PenState::Down,
                            });
                        }
                    }
                    current = start;
                }
                _ => {
                    let drawn = self.flatten_segment(current, segment, t);
                    if !drawn.is_empty() {
                        if let Some(up) = pending.take() {
                            points.push(PlotPoint {
                                at: up,
                                pen: PenState::Up,
                            });
                        }
                        points.extend(drawn.into_iter().map(|at| PlotPoint {
                            at,
                            pen: PenState::Down,
                        }));
                    }
                    if let Some(end) = segment.end_point() {
                        current = end;
                    }
                }
            }
        }

        FlattenedPath { points, stroke }
    }

    fn subdivide_cubic(&self, curve: &CubicBezierSegment<f64>, depth: u32, out: &mut Vec<Point>) {
        let deviation = chord_distance(curve.from, curve.to, curve.ctrl1)
            .max(chord_distance(curve.from, curve.to, curve.ctrl2));
        if depth >= self.max_depth || deviation <= self.tolerance {
            out.push(curve.to);
            return;
        }
        let (first, second) = curve.split(0.5);
        self.subdivide_cubic(&first, depth + 1, out);
        self.subdivide_cubic(&second, depth + 1, out);
    }

    fn subdivide_quadratic(
        &self,
        curve: &QuadraticBezierSegment<f64>,
        depth: u32,
        out: &mut Vec<Point>,
    ) {
        if depth >= self.max_depth || chord_distance(curve.from, curve.to, curve.ctrl) <= self.tolerance
        {
            out.push(curve.to);
            return;
        }
        let (first, second) = curve.split(0.5);
        self.subdivide_quadratic(&first, depth + 1, out);
        self.subdivide_quadratic(&second, depth + 1, out);
    }

    fn sample_arc(&self, arc: &EndpointArc, t: &Transform, out: &mut Vec<Point>) {
        if arc.from == arc.to {
            return;
        }
        let Some(center) = arc.to_center() else {
            // Zero radius: straight line
            out.push(t.transform_point(arc.to));
            return;
        };

        let device_radius = center.rx.max(center.ry) * max_stretch(t);
        let count = self.arc_segment_count(center.sweep_angle, device_radius);

        for i in 1..count {
            let theta = center.start_angle + center.sweep_angle * (i as f64 / count as f64);
            out.push(t.transform_point(center.point_at(theta)));
        }
        out.push(t.transform_point(arc.to));
    }

    /// Number of chords for an arc of `sweep` radians at `radius` mm.
    ///
    /// At least one chord per quarter turn, so even a huge tolerance keeps the
    /// shape recognisable.
    pub fn arc_segment_count(&self, sweep: f64, radius: f64) -> usize {
        let sweep = sweep.abs();
        let step = if radius > 0.0 {
            2.0 * (1.0 - self.tolerance / radius).clamp(-1.0, 1.0).acos()
        } else {
            TAU
        };
        let by_tolerance = if step > 0.0 {
            (sweep / step).ceil()
        } else {
            MAX_ARC_SEGMENTS as f64
        };
        let by_quadrant = (sweep / FRAC_PI_2).ceil();

        (by_tolerance.max(by_quadrant).max(1.0) as usize).min(MAX_ARC_SEGMENTS)
    }
}

/// Distance from `p` to the chord segment `a`-`b`.
///
/// Clamped to the segment so control points collinear with the chord but
/// beyond its ends still count as deviation.
fn chord_distance(a: Point, b: Point, p: Point) -> f64 {
    let chord = b - a;
    let len2 = chord.square_length();
    if len2 <= f64::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(chord) / len2).clamp(0.0, 1.0);
    (p - (a + chord * t)).length()
}

/// SVG endpoint arc in local coordinates.
#[derive(Debug, Clone, Copy)]
struct EndpointArc {
    from: Point,
    to: Point,
    rx: f64,
    ry: f64,
    rotation: f64,
    large_arc: bool,
    sweep: bool,
}

#[derive(Debug, Clone, Copy)]
struct CenterArc {
    center: Point,
    rx: f64,
    ry: f64,
    /// X axis rotation (radians).
    phi: f64,
    start_angle: f64,
    sweep_angle: f64,
}

impl CenterArc {
    fn point_at(&self, theta: f64) -> Point {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_t, cos_t) = theta.sin_cos();
        let x = self.rx * cos_t;
        let y = self.ry * sin_t;
        point(
            self.center.x + cos_phi * x - sin_phi * y,
            self.center.y + sin_phi * x + cos_phi * y,
        )
    }
}

impl EndpointArc {
    /// Endpoint to center conversion, with out-of-range radii scaled up.
    /// `None` when either radius is zero.
    fn to_center(&self) -> Option<CenterArc> {
        let mut rx = self.rx.abs();
        let mut ry = self.ry.abs();
        if rx == 0.0 || ry == 0.0 {
            return None;
        }

        let phi = self.rotation.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let dx = (self.from.x - self.to.x) / 2.0;
        let dy = (self.from.y - self.to.y) / 2.0;
        let x1 = cos_phi * dx + sin_phi * dy;
        let y1 = -sin_phi * dx + cos_phi * dy;

        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let rx2 = rx * rx;
        let ry2 = ry * ry;
        let num = (rx2 * ry2 - rx2 * y1 * y1 - ry2 * x1 * x1).max(0.0);
        let den = rx2 * y1 * y1 + ry2 * x1 * x1;
        let mut coef = if den > 0.0 { (num / den).sqrt() } else { 0.0 };
        if self.large_arc == self.sweep {
            coef = -coef;
        }
        let cx1 = coef * rx * y1 / ry;
        let cy1 = -coef * ry * x1 / rx;

        let center = point(
            cos_phi * cx1 - sin_phi * cy1 + (self.from.x + self.to.x) / 2.0,
            sin_phi * cx1 + cos_phi * cy1 + (self.from.y + self.to.y) / 2.0,
        );

        let ux = (x1 - cx1) / rx;
        let uy = (y1 - cy1) / ry;
        let vx = (-x1 - cx1) / rx;
        let vy = (-y1 - cy1) / ry;

        let start_angle = uy.atan2(ux);
        let mut sweep_angle = vector_angle(ux, uy, vx, vy);
        if !self.sweep && sweep_angle > 0.0 {
            sweep_angle -= TAU;
        } else if self.sweep && sweep_angle < 0.0 {
            sweep_angle += TAU;
        }

        Some(CenterArc {
            center,
            rx,
            ry,
            phi,
            start_angle,
            sweep_angle,
        })
    }
}

/// Signed angle from `u` to `v`.
fn vector_angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    let angle = (ux * vy - uy * vx).atan2(ux * vx + uy * vy);
    // Exactly opposite vectors: atan2 may return -PI, treat as PI
    if angle == -PI {
        PI
    } else {
        angle
    }
}
