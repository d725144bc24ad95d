//! Error handling for svg2hpgl
//!
//! The taxonomy separates document-scoped failures from element-scoped ones:
//! - [`ParseError`] - malformed XML/SVG structure, aborts the conversion
//! - [`MalformedPathError`] / [`UnsupportedTransformError`] - scoped to one
//!   element, wrapped in [`ElementError`]; the element is skipped
//! - [`ConversionError`] - everything that ends a conversion
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::io;
use thiserror::Error;

/// Document-level parse failures. Always fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The XML itself is broken (syntax error, mismatched end tag, bad attribute).
    #[error("Malformed XML at byte {position}: {message}")]
    Xml {
        /// Byte offset reported by the XML reader.
        position: u64,
        /// Reader message.
        message: String,
    },

    /// Input bytes are not valid UTF-8.
    #[error("Input is not valid UTF-8: {0}")]
    Encoding(String),

    /// The input contains no root element.
    #[error("Document contains no root element")]
    Empty,

    /// The root element is not `<svg>`.
    #[error("Root element is <{0}>, expected <svg>")]
    NotSvg(String),

    /// The root element declares a namespace other than SVG.
    #[error("Unsupported namespace: {0}")]
    UnsupportedNamespace(String),

    /// End of input reached while an element was still open.
    #[error("Unclosed element <{0}> at end of input")]
    Unclosed(String),

    /// Neither `viewBox` nor `width`/`height` describe the drawing area.
    #[error("Document has no viewBox and no width/height to derive one from")]
    MissingViewport,

    /// The `viewBox` attribute is not four numbers with positive size.
    #[error("Invalid viewBox '{0}'")]
    InvalidViewBox(String),
}

/// Geometry of a single element could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedPathError {
    /// A command ran out of arguments part way through a group.
    #[error("Command '{command}' expects {expected} argument(s) per group, found {found}")]
    ArgumentCount {
        command: char,
        expected: usize,
        found: usize,
    },

    /// A coordinate token is not a number.
    #[error("Invalid number at offset {offset}: '{token}'")]
    InvalidNumber { offset: usize, token: String },

    /// An arc flag is not `0` or `1`.
    #[error("Invalid arc flag at offset {offset}: '{found}'")]
    InvalidFlag { offset: usize, found: char },

    /// A character that is neither a command, a number nor a separator.
    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { offset: usize, found: char },

    /// Path data must start with `M` or `m`.
    #[error("Path data must begin with a moveto, found '{0}'")]
    MissingMoveTo(char),

    /// A geometry-critical attribute is absent.
    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// A geometry attribute cannot be used (not a length, or negative).
    #[error("<{element}> attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    /// A `points` list does not pair up into coordinates.
    #[error("Point list has an odd number of coordinates ({0})")]
    OddPointCount(usize),
}

/// A `transform` attribute uses something this converter cannot apply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnsupportedTransformError {
    /// The function name is not one of the six SVG transform functions.
    #[error("Unknown transform function '{0}'")]
    UnknownFunction(String),

    /// The function exists but not with this many arguments.
    #[error("Transform function '{function}' cannot take {count} argument(s)")]
    InvalidArguments { function: String, count: usize },

    /// The transform list cannot be tokenised.
    #[error("Malformed transform list '{0}'")]
    Syntax(String),
}

/// Recoverable failure scoped to one element.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ElementError {
    #[error(transparent)]
    MalformedPath(#[from] MalformedPathError),

    #[error(transparent)]
    UnsupportedTransform(#[from] UnsupportedTransformError),
}

/// Errors that end a conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The document could not be parsed.
    #[error("SVG parse error: {0}")]
    Parse(#[from] ParseError),

    /// Every element was skipped or produced nothing drawable.
    #[error("No drawable content survived conversion ({skipped} element(s) skipped)")]
    EmptyOutput { skipped: usize },

    /// Conversion options failed validation.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Reading the SVG or writing the program failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::NotSvg("html".to_string());
        assert_eq!(err.to_string(), "Root element is <html>, expected <svg>");

        let err = ParseError::Xml {
            position: 42,
            message: "unexpected end".to_string(),
        };
        assert_eq!(err.to_string(), "Malformed XML at byte 42: unexpected end");
    }

    #[test]
    fn test_malformed_path_error_display() {
        let err = MalformedPathError::ArgumentCount {
            command: 'L',
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Command 'L' expects 2 argument(s) per group, found 1"
        );

        let err = MalformedPathError::MissingAttribute {
            element: "rect".to_string(),
            attribute: "width".to_string(),
        };
        assert_eq!(err.to_string(), "<rect> is missing required attribute 'width'");
    }

    #[test]
    fn test_element_error_is_transparent() {
        let err: ElementError = UnsupportedTransformError::UnknownFunction("warp".into()).into();
        assert_eq!(err.to_string(), "Unknown transform function 'warp'");
        assert!(matches!(err, ElementError::UnsupportedTransform(_)));

        let err: ElementError = MalformedPathError::MissingMoveTo('L').into();
        assert!(matches!(err, ElementError::MalformedPath(_)));
    }

    #[test]
    fn test_conversion_error_conversion() {
        let err: ConversionError = ParseError::MissingViewport.into();
        assert!(matches!(err, ConversionError::Parse(_)));
        assert!(err.to_string().starts_with("SVG parse error:"));

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ConversionError = io_err.into();
        assert!(matches!(err, ConversionError::Io(_)));
    }

    #[test]
    fn test_empty_output_display() {
        let err = ConversionError::EmptyOutput { skipped: 3 };
        assert_eq!(
            err.to_string(),
            "No drawable content survived conversion (3 element(s) skipped)"
        );
    }
}
