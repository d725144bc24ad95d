//! Transform parsing and composition
//!
//! SVG `transform` lists map onto lyon's row-vector `Transform` directly:
//! `matrix(a b c d e f)` is `Transform::new(a, b, c, d, e, f)`. In a list the
//! rightmost function applies first, so `"A B"` becomes `B.then(A)`.

use crate::path_data::parse_number_list;
use crate::Transform;
use once_cell::sync::Lazy;
use regex::Regex;
use svg2hpgl_core::UnsupportedTransformError;

static TRANSFORM_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s,]*([A-Za-z][A-Za-z0-9]*)\s*\(([^()]*)\)").expect("valid regex")
});

/// Parse a `transform` attribute into a single matrix.
pub fn parse_transform(text: &str) -> Result<Transform, UnsupportedTransformError> {
    let mut result = Transform::identity();
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "none" {
        return Ok(result);
    }

    let mut rest = trimmed;
    while !rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',').is_empty() {
        let caps = TRANSFORM_FUNCTION
            .captures(rest)
            .ok_or_else(|| UnsupportedTransformError::Syntax(text.to_string()))?;
        let name = &caps[1];
        let args = parse_number_list(&caps[2])
            .map_err(|_| UnsupportedTransformError::Syntax(text.to_string()))?;

        let function = function_matrix(name, &args)?;
        result = function.then(&result);
        rest = &rest[caps[0].len()..];
    }

    Ok(result)
}

fn function_matrix(name: &str, args: &[f64]) -> Result<Transform, UnsupportedTransformError> {
    let invalid = || UnsupportedTransformError::InvalidArguments {
        function: name.to_string(),
        count: args.len(),
    };

    match name {
        "matrix" => match *args {
            [a, b, c, d, e, f] => Ok(Transform::new(a, b, c, d, e, f)),
            _ => Err(invalid()),
        },
        "translate" => match *args {
            [tx] => Ok(Transform::translation(tx, 0.0)),
            [tx, ty] => Ok(Transform::translation(tx, ty)),
            _ => Err(invalid()),
        },
        "scale" => match *args {
            [s] => Ok(Transform::scale(s, s)),
            [sx, sy] => Ok(Transform::scale(sx, sy)),
            _ => Err(invalid()),
        },
        "rotate" => match *args {
            [angle] => Ok(rotation(angle)),
            [angle, cx, cy] => Ok(Transform::translation(-cx, -cy)
                .then(&rotation(angle))
                .then(&Transform::translation(cx, cy))),
            _ => Err(invalid()),
        },
        "skewX" => match *args {
            [angle] => Ok(Transform::new(1.0, 0.0, angle.to_radians().tan(), 1.0, 0.0, 0.0)),
            _ => Err(invalid()),
        },
        "skewY" => match *args {
            [angle] => Ok(Transform::new(1.0, angle.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)),
            _ => Err(invalid()),
        },
        other => Err(UnsupportedTransformError::UnknownFunction(other.to_string())),
    }
}

/// Counter-clockwise rotation in degrees (clockwise on screen, Y down).
fn rotation(degrees: f64) -> Transform {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Transform::new(cos, sin, -sin, cos, 0.0, 0.0)
}

/// Combine an element's own transform with its parent's composite.
pub fn compose(local: &Transform, parent: &Transform) -> Transform {
    local.then(parent)
}

/// Resolve the composite transform for an ancestor chain, outermost first.
///
/// `None` entries are elements without a `transform` attribute.
pub fn resolve(chain: &[Option<&str>]) -> Result<Transform, UnsupportedTransformError> {
    chain
        .iter()
        .try_fold(Transform::identity(), |parent, raw| match raw {
            Some(text) => Ok(compose(&parse_transform(text)?, &parent)),
            None => Ok(parent),
        })
}

/// Largest factor by which the transform stretches any length.
pub fn max_stretch(t: &Transform) -> f64 {
    let sum = t.m11 * t.m11 + t.m12 * t.m12 + t.m21 * t.m21 + t.m22 * t.m22;
    let det = t.m11 * t.m22 - t.m12 * t.m21;
    let disc = (sum * sum - 4.0 * det * det).max(0.0).sqrt();
    ((sum + disc) / 2.0).sqrt()
}
