//! Property tests for flattening and transforms

use proptest::prelude::*;
use svg2hpgl_converter::{point, Flattener, PathSegment, Transform};

fn curve_point_count(segment: &PathSegment, tolerance: f64) -> usize {
    Flattener::new(tolerance, 16)
        .flatten_segment(point(0.0, 0.0), segment, &Transform::identity())
        .len()
}

fn coordinate() -> impl Strategy<Value = f64> {
    -100.0..100.0f64
}

proptest! {
    #[test]
    fn prop_smaller_tolerance_never_fewer_cubic_points(
        c1x in coordinate(), c1y in coordinate(),
        c2x in coordinate(), c2y in coordinate(),
        ex in coordinate(), ey in coordinate(),
        tolerance in 0.01..5.0f64,
        factor in 0.1..1.0f64,
    ) {
        let segment = PathSegment::CubicTo {
            ctrl1: point(c1x, c1y),
            ctrl2: point(c2x, c2y),
            to: point(ex, ey),
        };
        let coarse = curve_point_count(&segment, tolerance);
        let fine = curve_point_count(&segment, tolerance * factor);
        prop_assert!(fine >= coarse);
    }

    #[test]
    fn prop_smaller_tolerance_never_fewer_arc_points(
        radius in 0.5..50.0f64,
        ex in coordinate(), ey in coordinate(),
        large_arc in any::<bool>(), sweep in any::<bool>(),
        tolerance in 0.01..5.0f64,
        factor in 0.1..1.0f64,
    ) {
        let segment = PathSegment::ArcTo {
            rx: radius,
            ry: radius * 0.5,
            rotation: 30.0,
            large_arc,
            sweep,
            to: point(ex, ey),
        };
        let coarse = curve_point_count(&segment, tolerance);
        let fine = curve_point_count(&segment, tolerance * factor);
        prop_assert!(fine >= coarse);
    }

    #[test]
    fn prop_flattened_curve_ends_at_endpoint(
        cx in coordinate(), cy in coordinate(),
        ex in coordinate(), ey in coordinate(),
        tolerance in 0.01..5.0f64,
    ) {
        let segment = PathSegment::QuadTo { ctrl: point(cx, cy), to: point(ex, ey) };
        let points = Flattener::new(tolerance, 16)
            .flatten_segment(point(0.0, 0.0), &segment, &Transform::identity());
        prop_assert_eq!(points.last().copied(), Some(point(ex, ey)));
    }

    #[test]
    fn prop_identity_then_scale_equals_scale(
        x in coordinate(), y in coordinate(),
        sx in 0.01..10.0f64, sy in 0.01..10.0f64,
    ) {
        let scale = Transform::scale(sx, sy);
        let composed = svg2hpgl_converter::compose(&Transform::identity(), &scale);
        let a = composed.transform_point(point(x, y));
        let b = scale.transform_point(point(x, y));
        prop_assert!((a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
    }

    #[test]
    fn prop_rounding_is_symmetric(mm in -1000.0..1000.0f64, units in 1.0..100.0f64) {
        let up = svg2hpgl_core::mm_to_plotter_units(mm, units);
        let down = svg2hpgl_core::mm_to_plotter_units(-mm, units);
        prop_assert_eq!(up, -down);
        prop_assert!(((up as f64) - mm * units).abs() <= 0.5);
    }
}
