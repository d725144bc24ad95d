//! End-to-end conversion scenarios

use svg2hpgl_converter::{convert, convert_to_hpgl, PlotterInstruction};
use svg2hpgl_core::{ConversionError, ConversionOptions, OutputOptions};

const UNIT_SVG_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="10mm" height="10mm" viewBox="0 0 10 10">"#;

fn unit_options() -> ConversionOptions {
    ConversionOptions {
        units_per_mm: 1.0,
        flip_y: false,
        ..Default::default()
    }
}

fn document(body: &str) -> String {
    format!("{}\n{}\n</svg>", UNIT_SVG_HEADER, body)
}

fn rendered(instructions: &[PlotterInstruction]) -> String {
    instructions.iter().map(ToString::to_string).collect()
}

#[test]
fn test_closed_triangle_path() {
    let program = convert(
        document(r#"<path d="M0,0 L10,0 L10,10 Z"/>"#).as_bytes(),
        &unit_options(),
    )
    .unwrap();
    assert_eq!(
        rendered(&program.instructions),
        "PU;PA0,0;PD;PA10,0;PA10,10;PA0,0;PU;"
    );
}

#[test]
fn test_rect_has_one_pen_down_per_subpath() {
    let program = convert(
        document(r#"<rect x="1" y="1" width="4" height="3"/><rect x="6" y="6" width="2" height="2"/>"#)
            .as_bytes(),
        &unit_options(),
    )
    .unwrap();

    let ins = &program.instructions;
    let downs: Vec<usize> = ins
        .iter()
        .enumerate()
        .filter(|(_, i)| **i == PlotterInstruction::PenDown)
        .map(|(idx, _)| idx)
        .collect();
    assert_eq!(downs.len(), 2);

    for &down in &downs {
        // PU, PA(start), PD
        assert_eq!(ins[down - 2], PlotterInstruction::PenUp);
        let start = ins[down - 1];
        assert!(matches!(start, PlotterInstruction::MoveAbsolute { .. }));

        let lift = down + ins[down..]
            .iter()
            .position(|i| *i == PlotterInstruction::PenUp)
            .unwrap();
        assert_eq!(ins[lift - 1], start, "subpath does not return to its start");
    }
}

#[test]
fn test_one_good_one_bad_path() {
    let program = convert(
        document(r#"<path d="M0,0 L5,5"/><path d="M0,0 C1"/>"#).as_bytes(),
        &unit_options(),
    )
    .unwrap();
    assert_eq!(program.report.elements_drawn, 1);
    assert_eq!(program.report.skipped.len(), 1);
    assert_eq!(rendered(&program.instructions), "PU;PA0,0;PD;PA5,5;PU;");
}

#[test]
fn test_every_element_malformed() {
    let err = convert(
        document(r#"<path d="Q"/><rect width="5"/><polygon points="1 2 3"/>"#).as_bytes(),
        &unit_options(),
    )
    .unwrap_err();
    assert!(matches!(err, ConversionError::EmptyOutput { skipped: 3 }));
}

#[test]
fn test_circle_tolerance_controls_point_count() {
    let svg = document(r#"<circle cx="0" cy="0" r="5"/>"#);
    let count = |tolerance_mm: f64| {
        let options = ConversionOptions {
            tolerance_mm,
            units_per_mm: 1000.0,
            ..unit_options()
        };
        convert(svg.as_bytes(), &options)
            .unwrap()
            .instructions
            .iter()
            .filter(|i| matches!(i, PlotterInstruction::MoveAbsolute { .. }))
            .count()
    };

    let coarse = count(1.0);
    let fine = count(0.01);
    assert!(fine > coarse, "{} <= {}", fine, coarse);
}

#[test]
fn test_viewbox_scaling_to_millimetres() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="200mm" height="100mm" viewBox="0 0 20 10">
        <line x1="0" y1="0" x2="20" y2="10"/>
    </svg>"#;
    let options = ConversionOptions {
        flip_y: false,
        ..Default::default()
    };
    let program = convert(svg.as_bytes(), &options).unwrap();
    assert_eq!(
        rendered(&program.instructions),
        "PU;PA0,0;PD;PA8000,4000;PU;"
    );
}

#[test]
fn test_unitless_size_is_pixels() {
    let svg = r#"<svg width="96" height="96"><line x1="0" y1="0" x2="96" y2="0"/></svg>"#;
    let program = convert(svg.as_bytes(), &ConversionOptions::default()).unwrap();
    // One inch at 40 units/mm, y flipped to the page top
    assert_eq!(
        rendered(&program.instructions),
        "PU;PA0,1016;PD;PA1016,1016;PU;"
    );
}

#[test]
fn test_nested_groups_and_draw_order() {
    let program = convert(
        document(
            r#"<g transform="translate(1,0)">
                 <line x2="1"/>
                 <g transform="translate(0,2)"><line x2="1"/></g>
               </g>
               <line y1="5" x2="1" y2="5"/>"#,
        )
        .as_bytes(),
        &unit_options(),
    )
    .unwrap();
    assert_eq!(
        rendered(&program.instructions),
        "PU;PA1,0;PD;PA2,0;PU;PA1,2;PD;PA2,2;PU;PA0,5;PD;PA1,5;PU;"
    );
}

#[test]
fn test_pens_follow_stroke_colours() {
    let (text, report) = convert_to_hpgl(
        document(
            r##"<path stroke="#00f" d="M0 0 L1 0"/>
                <path style="stroke:red" d="M0 1 L1 1"/>
                <path stroke="blue" d="M0 2 L1 2"/>"##,
        )
        .as_bytes(),
        &unit_options(),
        &OutputOptions::default(),
    )
    .unwrap();
    assert_eq!(
        text,
        "IN;SP1;PU;PA0,0;PD;PA1,0;PU;SP2;PA0,1;PD;PA1,1;PU;SP1;PA0,2;PD;PA1,2;PU;SP0;\n"
    );
    assert_eq!(report.pens_used.len(), 2);
}

#[test]
fn test_compact_output() {
    let (text, _) = convert_to_hpgl(
        document(r#"<polyline points="0,0 1,0 1,1 0,1"/>"#).as_bytes(),
        &unit_options(),
        &OutputOptions {
            compact: true,
            initialize: false,
            park_pen: false,
            optimize: true,
        },
    )
    .unwrap();
    assert_eq!(text, "SP1;PU;PA0,0;PD;PA1,0,1,1,0,1;PU;\n");
}

#[test]
fn test_unsupported_elements_ignored() {
    let program = convert(
        document(
            r#"<defs><linearGradient id="g"/></defs>
               <text x="0" y="0">label</text>
               <image href="x.png" width="1" height="1"/>
               <path d="M0 0 L1 1"/>"#,
        )
        .as_bytes(),
        &unit_options(),
    )
    .unwrap();
    assert_eq!(program.report.elements_drawn, 1);
    assert!(program.report.skipped.is_empty());
}

#[test]
fn test_not_an_svg_document() {
    let err = convert(b"<html><body/></html>", &unit_options()).unwrap_err();
    assert!(matches!(err, ConversionError::Parse(_)));
}
