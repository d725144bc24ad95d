//! Path and shape interpretation
//!
//! Turns one element into absolute [`PathSegment`]s in the element's local
//! coordinate space. Relative commands, implicit repeats, shorthand control
//! points and basic shapes are all resolved here so the flattener only deals
//! with five primitive segment kinds.

use crate::document::{Element, ElementKind};
use crate::path_data::{parse_number_list, PathLexer};
use crate::{point, Point};
use svg2hpgl_core::{Length, LengthUnit, MalformedPathError};

/// Absolute geometric primitive in local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo {
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
    },
    QuadTo {
        ctrl: Point,
        to: Point,
    },
    ArcTo {
        rx: f64,
        ry: f64,
        /// X axis rotation in degrees.
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    ClosePath,
}

impl PathSegment {
    /// End point, `None` for [`PathSegment::ClosePath`].
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => Some(p),
            Self::CubicTo { to, .. } | Self::QuadTo { to, .. } | Self::ArcTo { to, .. } => Some(to),
            Self::ClosePath => None,
        }
    }
}

/// Interpret an element's geometry. Groups yield no segments.
pub fn interpret(element: &Element) -> Result<Vec<PathSegment>, MalformedPathError> {
    match element.kind {
        ElementKind::Group => Ok(Vec::new()),
        ElementKind::Path => parse_path_data(required(element, "d")?),
        ElementKind::Rect => rect(element),
        ElementKind::Circle => {
            let cx = optional_length(element, "cx")?.unwrap_or(0.0);
            let cy = optional_length(element, "cy")?.unwrap_or(0.0);
            let r = size_attribute(element, "r")?;
            Ok(ellipse_segments(cx, cy, r, r))
        }
        ElementKind::Ellipse => {
            let cx = optional_length(element, "cx")?.unwrap_or(0.0);
            let cy = optional_length(element, "cy")?.unwrap_or(0.0);
            let rx = size_attribute(element, "rx")?;
            let ry = size_attribute(element, "ry")?;
            Ok(ellipse_segments(cx, cy, rx, ry))
        }
        ElementKind::Line => {
            let coord = |name| optional_length(element, name).map(|v| v.unwrap_or(0.0));
            Ok(vec![
                PathSegment::MoveTo(point(coord("x1")?, coord("y1")?)),
                PathSegment::LineTo(point(coord("x2")?, coord("y2")?)),
            ])
        }
        ElementKind::Polyline => poly(element, false),
        ElementKind::Polygon => poly(element, true),
    }
}

/// Interpret SVG path data.
pub fn parse_path_data(data: &str) -> Result<Vec<PathSegment>, MalformedPathError> {
    let mut lexer = PathLexer::new(data);
    let mut state = PathState::new();

    if lexer.at_end() {
        return Ok(Vec::new());
    }

    loop {
        let command = match lexer.next_command()? {
            Some(c) => c,
            None if lexer.at_end() => break,
            None => {
                // Numbers with no command in effect: leading, or after Z
                return Err(if state.segments.is_empty() {
                    let first = data.trim_start().chars().next().unwrap_or(' ');
                    MalformedPathError::MissingMoveTo(first)
                } else {
                    argument_count('Z', 0, 1)
                });
            }
        };

        if state.segments.is_empty() && !matches!(command, 'M' | 'm') {
            return Err(MalformedPathError::MissingMoveTo(command));
        }

        let arity = arity(command);
        if arity == 0 {
            state.close();
            continue;
        }

        let mut first = true;
        loop {
            let args = read_group(&mut lexer, command, arity)?;
            state.apply(command, &args, first);
            first = false;
            if !lexer.at_number() {
                break;
            }
        }
    }

    Ok(state.segments)
}

fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'C' => 6,
        'S' | 'Q' => 4,
        'A' => 7,
        _ => 0,
    }
}

fn read_group(
    lexer: &mut PathLexer<'_>,
    command: char,
    arity: usize,
) -> Result<[f64; 7], MalformedPathError> {
    let is_arc = command.eq_ignore_ascii_case(&'a');
    let mut args = [0.0; 7];
    for (i, slot) in args.iter_mut().take(arity).enumerate() {
        if is_arc && (i == 3 || i == 4) {
            if lexer.at_end() {
                return Err(argument_count(command, arity, i));
            }
            *slot = if lexer.flag()? { 1.0 } else { 0.0 };
            continue;
        }
        if !lexer.at_number() {
            return Err(argument_count(command, arity, i));
        }
        *slot = lexer.number()?;
    }
    Ok(args)
}

fn argument_count(command: char, expected: usize, found: usize) -> MalformedPathError {
    MalformedPathError::ArgumentCount {
        command,
        expected,
        found,
    }
}

/// Kind of the previous command, for shorthand control point reflection.
#[derive(Debug, Clone, Copy, Default)]
enum Previous {
    #[default]
    Other,
    Cubic(Point),
    Quad(Point),
}

#[derive(Debug)]
struct PathState {
    segments: Vec<PathSegment>,
    current: Point,
    start: Point,
    previous: Previous,
    /// Set after `Z`; the next drawing command restarts at `start`.
    closed: bool,
}

impl PathState {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            current: point(0.0, 0.0),
            start: point(0.0, 0.0),
            previous: Previous::Other,
            closed: false,
        }
    }

    fn close(&mut self) {
        self.segments.push(PathSegment::ClosePath);
        self.current = self.start;
        self.previous = Previous::Other;
        self.closed = true;
    }

    fn apply(&mut self, command: char, args: &[f64; 7], first_group: bool) {
        let relative = command.is_ascii_lowercase();
        let origin = if relative { self.current } else { point(0.0, 0.0) };
        let abs = |x: f64, y: f64| point(origin.x + x, origin.y + y);
        let upper = command.to_ascii_uppercase();

        if upper == 'M' && first_group {
            let p = abs(args[0], args[1]);
            self.segments.push(PathSegment::MoveTo(p));
            self.current = p;
            self.start = p;
            self.previous = Previous::Other;
            self.closed = false;
            return;
        }

        if self.closed {
            self.segments.push(PathSegment::MoveTo(self.start));
            self.closed = false;
        }

        let (segment, previous) = match upper {
            // Extra pairs after a moveto are implicit linetos
            'M' | 'L' => (PathSegment::LineTo(abs(args[0], args[1])), Previous::Other),
            'H' => {
                let x = if relative { self.current.x + args[0] } else { args[0] };
                (PathSegment::LineTo(point(x, self.current.y)), Previous::Other)
            }
            'V' => {
                let y = if relative { self.current.y + args[0] } else { args[0] };
                (PathSegment::LineTo(point(self.current.x, y)), Previous::Other)
            }
            'C' => {
                let ctrl2 = abs(args[2], args[3]);
                (
                    PathSegment::CubicTo {
                        ctrl1: abs(args[0], args[1]),
                        ctrl2,
                        to: abs(args[4], args[5]),
                    },
                    Previous::Cubic(ctrl2),
                )
            }
            'S' => {
                let ctrl1 = match self.previous {
                    Previous::Cubic(c) => reflect(c, self.current),
                    _ => self.current,
                };
                let ctrl2 = abs(args[0], args[1]);
                (
                    PathSegment::CubicTo {
                        ctrl1,
                        ctrl2,
                        to: abs(args[2], args[3]),
                    },
                    Previous::Cubic(ctrl2),
                )
            }
            'Q' => {
                let ctrl = abs(args[0], args[1]);
                (
                    PathSegment::QuadTo {
                        ctrl,
                        to: abs(args[2], args[3]),
                    },
                    Previous::Quad(ctrl),
                )
            }
            'T' => {
                let ctrl = match self.previous {
                    Previous::Quad(c) => reflect(c, self.current),
                    _ => self.current,
                };
                (
                    PathSegment::QuadTo {
                        ctrl,
                        to: abs(args[0], args[1]),
                    },
                    Previous::Quad(ctrl),
                )
            }
            _ => (
                PathSegment::ArcTo {
                    rx: args[0].abs(),
                    ry: args[1].abs(),
                    rotation: args[2],
                    large_arc: args[3] != 0.0,
                    sweep: args[4] != 0.0,
                    to: abs(args[5], args[6]),
                },
                Previous::Other,
            ),
        };

        if let Some(end) = segment.end_point() {
            self.current = end;
        }
        self.previous = previous;
        self.segments.push(segment);
    }
}

fn reflect(ctrl: Point, about: Point) -> Point {
    point(2.0 * about.x - ctrl.x, 2.0 * about.y - ctrl.y)
}

/// Parse a geometry attribute in user units. Absolute units resolve at
/// 96 user units per inch.
fn optional_length(element: &Element, name: &str) -> Result<Option<f64>, MalformedPathError> {
    let Some(raw) = element.attr(name) else {
        return Ok(None);
    };
    if raw.trim() == "auto" {
        return Ok(None);
    }
    let len = raw
        .parse::<Length>()
        .map_err(|_| invalid_attribute(element, name, raw))?;
    Ok(Some(match len.unit {
        LengthUnit::Px => len.value,
        _ => len.to_mm() / LengthUnit::Px.mm_per_unit(),
    }))
}

fn required<'a>(element: &'a Element, name: &str) -> Result<&'a str, MalformedPathError> {
    element
        .attr(name)
        .ok_or_else(|| MalformedPathError::MissingAttribute {
            element: element.kind.tag().to_string(),
            attribute: name.to_string(),
        })
}

/// A required non-negative size (`width`, `r`, ...).
fn size_attribute(element: &Element, name: &str) -> Result<f64, MalformedPathError> {
    required(element, name)?;
    let value = optional_length(element, name)?
        .ok_or_else(|| invalid_attribute(element, name, "auto"))?;
    non_negative(element, name, value)
}

fn non_negative(element: &Element, name: &str, value: f64) -> Result<f64, MalformedPathError> {
    if value < 0.0 {
        let raw = element.attr(name).unwrap_or_default();
        return Err(invalid_attribute(element, name, raw));
    }
    Ok(value)
}

fn invalid_attribute(element: &Element, name: &str, raw: &str) -> MalformedPathError {
    MalformedPathError::InvalidAttribute {
        element: element.kind.tag().to_string(),
        attribute: name.to_string(),
        value: raw.to_string(),
    }
}

fn rect(element: &Element) -> Result<Vec<PathSegment>, MalformedPathError> {
    let x = optional_length(element, "x")?.unwrap_or(0.0);
    let y = optional_length(element, "y")?.unwrap_or(0.0);
    let w = size_attribute(element, "width")?;
    let h = size_attribute(element, "height")?;
    if w == 0.0 || h == 0.0 {
        return Ok(Vec::new());
    }

    let rx = optional_length(element, "rx")?
        .map(|v| non_negative(element, "rx", v))
        .transpose()?;
    let ry = optional_length(element, "ry")?
        .map(|v| non_negative(element, "ry", v))
        .transpose()?;
    let (rx, ry) = match (rx, ry) {
        (None, None) => (0.0, 0.0),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (Some(rx), Some(ry)) => (rx, ry),
    };
    let rx = rx.min(w / 2.0);
    let ry = ry.min(h / 2.0);

    if rx == 0.0 || ry == 0.0 {
        return Ok(vec![
            PathSegment::MoveTo(point(x, y)),
            PathSegment::LineTo(point(x + w, y)),
            PathSegment::LineTo(point(x + w, y + h)),
            PathSegment::LineTo(point(x, y + h)),
            PathSegment::LineTo(point(x, y)),
            PathSegment::ClosePath,
        ]);
    }

    let corner = |to: Point| PathSegment::ArcTo {
        rx,
        ry,
        rotation: 0.0,
        large_arc: false,
        sweep: true,
        to,
    };
    Ok(vec![
        PathSegment::MoveTo(point(x + rx, y)),
        PathSegment::LineTo(point(x + w - rx, y)),
        corner(point(x + w, y + ry)),
        PathSegment::LineTo(point(x + w, y + h - ry)),
        corner(point(x + w - rx, y + h)),
        PathSegment::LineTo(point(x + rx, y + h)),
        corner(point(x, y + h - ry)),
        PathSegment::LineTo(point(x, y + ry)),
        corner(point(x + rx, y)),
        PathSegment::ClosePath,
    ])
}

/// Four quarter arcs starting from the rightmost point.
fn ellipse_segments(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<PathSegment> {
    if rx == 0.0 || ry == 0.0 {
        return Vec::new();
    }
    let quarter = |to: Point| PathSegment::ArcTo {
        rx,
        ry,
        rotation: 0.0,
        large_arc: false,
        sweep: true,
        to,
    };
    vec![
        PathSegment::MoveTo(point(cx + rx, cy)),
        quarter(point(cx, cy + ry)),
        quarter(point(cx - rx, cy)),
        quarter(point(cx, cy - ry)),
        quarter(point(cx + rx, cy)),
        PathSegment::ClosePath,
    ]
}

fn poly(element: &Element, closed: bool) -> Result<Vec<PathSegment>, MalformedPathError> {
    let raw = element
        .attr("points")
        .ok_or_else(|| MalformedPathError::MissingAttribute {
            element: element.kind.tag().to_string(),
            attribute: "points".to_string(),
        })?;
    let values = parse_number_list(raw)?;
    if values.len() % 2 != 0 {
        return Err(MalformedPathError::OddPointCount(values.len()));
    }

    let mut segments: Vec<PathSegment> = values
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let p = point(pair[0], pair[1]);
            if i == 0 {
                PathSegment::MoveTo(p)
            } else {
                PathSegment::LineTo(p)
            }
        })
        .collect();
    if closed && !segments.is_empty() {
        segments.push(PathSegment::ClosePath);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn first_element(svg_body: &str) -> Element {
        let doc = Document::parse_str(&format!(
            r#"<svg viewBox="0 0 100 100">{}</svg>"#,
            svg_body
        ))
        .unwrap();
        doc.elements.into_iter().next().unwrap()
    }

    #[test]
    fn test_relative_commands_resolve() {
        let segs = parse_path_data("m10 10 l5 0 h5 v-5 z").unwrap();
        assert_eq!(
            segs,
            vec![
                PathSegment::MoveTo(point(10.0, 10.0)),
                PathSegment::LineTo(point(15.0, 10.0)),
                PathSegment::LineTo(point(20.0, 10.0)),
                PathSegment::LineTo(point(20.0, 5.0)),
                PathSegment::ClosePath,
            ]
        );
    }

    #[test]
    fn test_implicit_lineto_after_moveto() {
        let segs = parse_path_data("M0,0 10,0 10,10").unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1], PathSegment::LineTo(point(10.0, 0.0)));

        let segs = parse_path_data("m1 1 2 2").unwrap();
        assert_eq!(segs[1], PathSegment::LineTo(point(3.0, 3.0)));
    }

    #[test]
    fn test_repeated_groups() {
        let segs = parse_path_data("M0 0 L1 1 2 2 3 3").unwrap();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3], PathSegment::LineTo(point(3.0, 3.0)));
    }

    #[test]
    fn test_smooth_cubic_reflection() {
        let segs = parse_path_data("M0 0 C0 10 10 10 10 0 S20 -10 20 0").unwrap();
        assert_eq!(
            segs[2],
            PathSegment::CubicTo {
                ctrl1: point(10.0, -10.0),
                ctrl2: point(20.0, -10.0),
                to: point(20.0, 0.0)
            }
        );
    }

    #[test]
    fn test_smooth_without_prior_curve_uses_current_point() {
        let segs = parse_path_data("M5 5 S10 10 15 5").unwrap();
        assert_eq!(
            segs[1],
            PathSegment::CubicTo {
                ctrl1: point(5.0, 5.0),
                ctrl2: point(10.0, 10.0),
                to: point(15.0, 5.0)
            }
        );

        // A quadratic before S does not count as a cubic
        let segs = parse_path_data("M0 0 Q5 5 10 0 S15 5 20 0").unwrap();
        assert!(matches!(
            segs[2],
            PathSegment::CubicTo { ctrl1, .. } if ctrl1 == point(10.0, 0.0)
        ));
    }

    #[test]
    fn test_smooth_quadratic_chain() {
        let segs = parse_path_data("M0 0 Q5 10 10 0 T20 0 T30 0").unwrap();
        assert_eq!(
            segs[2],
            PathSegment::QuadTo {
                ctrl: point(15.0, -10.0),
                to: point(20.0, 0.0)
            }
        );
        assert_eq!(
            segs[3],
            PathSegment::QuadTo {
                ctrl: point(25.0, 10.0),
                to: point(30.0, 0.0)
            }
        );
    }

    #[test]
    fn test_arc_with_packed_flags() {
        let segs = parse_path_data("M0 0 a5 5 0 1110 0").unwrap();
        assert_eq!(
            segs[1],
            PathSegment::ArcTo {
                rx: 5.0,
                ry: 5.0,
                rotation: 0.0,
                large_arc: true,
                sweep: true,
                to: point(10.0, 0.0)
            }
        );
    }

    #[test]
    fn test_drawing_after_close_restarts_at_subpath_start() {
        let segs = parse_path_data("M1 1 L5 1 L5 5 Z l2 0").unwrap();
        assert_eq!(segs[4], PathSegment::MoveTo(point(1.0, 1.0)));
        assert_eq!(segs[5], PathSegment::LineTo(point(3.0, 1.0)));
    }

    #[test]
    fn test_path_errors() {
        assert!(matches!(
            parse_path_data("M 10,abc"),
            Err(MalformedPathError::ArgumentCount {
                command: 'M',
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            parse_path_data("L 0 0"),
            Err(MalformedPathError::MissingMoveTo('L'))
        ));
        assert!(matches!(
            parse_path_data("M0 0 C1 1 2 2"),
            Err(MalformedPathError::ArgumentCount { command: 'C', found: 4, .. })
        ));
        assert!(matches!(
            parse_path_data("M0 0 A5 5 0 2 0 10 0"),
            Err(MalformedPathError::InvalidFlag { found: '2', .. })
        ));
        assert!(matches!(
            parse_path_data("10 10"),
            Err(MalformedPathError::MissingMoveTo('1'))
        ));
        assert!(matches!(
            parse_path_data("M0 0 K5"),
            Err(MalformedPathError::UnexpectedCharacter { found: 'K', .. })
        ));
    }

    #[test]
    fn test_empty_path_data() {
        assert!(parse_path_data("").unwrap().is_empty());
        assert!(parse_path_data("   ").unwrap().is_empty());
    }

    #[test]
    fn test_rect_outline() {
        let segs = interpret(&first_element(r#"<rect x="1" y="2" width="3" height="4"/>"#))
            .unwrap();
        assert_eq!(segs.first(), Some(&PathSegment::MoveTo(point(1.0, 2.0))));
        assert_eq!(
            segs.iter()
                .filter(|s| matches!(s, PathSegment::LineTo(_)))
                .count(),
            4
        );
        assert_eq!(segs.last(), Some(&PathSegment::ClosePath));
    }

    #[test]
    fn test_rounded_rect_clamps_radius() {
        let segs = interpret(&first_element(r#"<rect width="10" height="4" rx="5"/>"#)).unwrap();
        let arcs: Vec<_> = segs
            .iter()
            .filter_map(|s| match s {
                PathSegment::ArcTo { rx, ry, .. } => Some((*rx, *ry)),
                _ => None,
            })
            .collect();
        assert_eq!(arcs, vec![(5.0, 2.0); 4]);
    }

    #[test]
    fn test_zero_and_negative_sizes() {
        let segs = interpret(&first_element(r#"<rect width="0" height="4"/>"#)).unwrap();
        assert!(segs.is_empty());
        assert!(interpret(&first_element(r#"<circle r="0"/>"#)).unwrap().is_empty());

        let err = interpret(&first_element(r#"<rect width="-1" height="4"/>"#)).unwrap_err();
        assert!(matches!(err, MalformedPathError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_missing_required_attribute() {
        let err = interpret(&first_element(r#"<circle cx="5" cy="5"/>"#)).unwrap_err();
        assert_eq!(
            err,
            MalformedPathError::MissingAttribute {
                element: "circle".to_string(),
                attribute: "r".to_string()
            }
        );
        let err = interpret(&first_element(r#"<polyline/>"#)).unwrap_err();
        assert!(matches!(err, MalformedPathError::MissingAttribute { .. }));
    }

    #[test]
    fn test_circle_is_four_quarter_arcs() {
        let segs = interpret(&first_element(r#"<circle cx="10" cy="10" r="5"/>"#)).unwrap();
        assert_eq!(segs.len(), 6);
        assert_eq!(segs[0], PathSegment::MoveTo(point(15.0, 10.0)));
        let ends: Vec<Point> = segs[1..5]
            .iter()
            .filter_map(|s| match s {
                PathSegment::ArcTo { to, .. } => Some(*to),
                _ => None,
            })
            .collect();
        assert_eq!(
            ends,
            vec![
                point(10.0, 15.0),
                point(5.0, 10.0),
                point(10.0, 5.0),
                point(15.0, 10.0)
            ]
        );
        assert_eq!(segs[5], PathSegment::ClosePath);
    }

    #[test]
    fn test_path_without_d() {
        let err = interpret(&first_element(r#"<path id="x"/>"#)).unwrap_err();
        assert!(matches!(err, MalformedPathError::MissingAttribute { ref attribute, .. } if attribute == "d"));
        assert!(interpret(&first_element(r#"<path d=""/>"#)).unwrap().is_empty());
    }

    #[test]
    fn test_line_defaults_to_origin() {
        let segs = interpret(&first_element(r#"<line x2="3" y2="4"/>"#)).unwrap();
        assert_eq!(
            segs,
            vec![
                PathSegment::MoveTo(point(0.0, 0.0)),
                PathSegment::LineTo(point(3.0, 4.0))
            ]
        );
    }

    #[test]
    fn test_polygon_closes_and_polyline_does_not() {
        let segs = interpret(&first_element(r#"<polygon points="0,0 10,0 10,10"/>"#)).unwrap();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[3], PathSegment::ClosePath);

        let segs = interpret(&first_element(r#"<polyline points="0,0 10,0 10,10"/>"#)).unwrap();
        assert_eq!(segs.len(), 3);

        let err = interpret(&first_element(r#"<polyline points="0,0 10"/>"#)).unwrap_err();
        assert_eq!(err, MalformedPathError::OddPointCount(3));
    }

    #[test]
    fn test_unit_suffixed_geometry() {
        let segs = interpret(&first_element(r#"<line x2="1in"/>"#)).unwrap();
        let PathSegment::LineTo(end) = segs[1] else {
            panic!("expected a line");
        };
        assert!((end.x - 96.0).abs() < 1e-9);
    }
}
