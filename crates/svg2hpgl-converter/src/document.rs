//! SVG Document Model
//!
//! Parses SVG markup into an immutable tree of shape elements. Only the
//! drawable subset is kept (`g`, `path`, `rect`, `circle`, `ellipse`, `line`,
//! `polyline`, `polygon`); any other element is skipped together with its
//! subtree. Geometry attributes are stored raw and interpreted later, so a
//! broken shape only costs that shape.

use crate::path_data::parse_number_list;
use crate::{Point, Transform};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use svg2hpgl_core::units::{parse_length_mm, LengthUnit};
use svg2hpgl_core::ParseError;
use tracing::debug;

/// The only namespace accepted on the root element.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Kind of a kept element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Group,
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl ElementKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "g" => Some(Self::Group),
            "path" => Some(Self::Path),
            "rect" => Some(Self::Rect),
            "circle" => Some(Self::Circle),
            "ellipse" => Some(Self::Ellipse),
            "line" => Some(Self::Line),
            "polyline" => Some(Self::Polyline),
            "polygon" => Some(Self::Polygon),
            _ => None,
        }
    }

    /// SVG tag name.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Group => "g",
            Self::Path => "path",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Line => "line",
            Self::Polyline => "polyline",
            Self::Polygon => "polygon",
        }
    }
}

/// Presentation properties relevant to plotting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// Own stroke value; `None` inherits from the parent.
    pub stroke: Option<String>,
    /// `display: none` on this element.
    pub hidden: bool,
}

impl Style {
    fn from_attributes(attributes: &BTreeMap<String, String>) -> Self {
        let mut style = Self {
            stroke: attributes.get("stroke").map(|s| s.trim().to_string()),
            hidden: attributes
                .get("display")
                .is_some_and(|d| d.trim().eq_ignore_ascii_case("none")),
        };

        // Declarations in `style` take precedence over presentation attributes
        if let Some(decls) = attributes.get("style") {
            for decl in decls.split(';') {
                let Some((name, value)) = decl.split_once(':') else {
                    continue;
                };
                let value = value.trim().trim_end_matches("!important").trim();
                match name.trim().to_ascii_lowercase().as_str() {
                    "stroke" => style.stroke = Some(value.to_string()),
                    "display" => style.hidden = value.eq_ignore_ascii_case("none"),
                    _ => {}
                }
            }
        }

        style
    }
}

/// One shape or group.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Position among kept elements in document order.
    pub index: usize,
    pub id: Option<String>,
    /// Raw attribute values by local name.
    pub attributes: BTreeMap<String, String>,
    /// Raw `transform` attribute.
    pub transform: Option<String>,
    pub style: Style,
    /// Always empty unless `kind` is [`ElementKind::Group`].
    pub children: Vec<Element>,
}

impl Element {
    fn new(kind: ElementKind, index: usize, attributes: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            index,
            id: attributes.get("id").cloned(),
            transform: attributes.get("transform").cloned(),
            style: Style::from_attributes(&attributes),
            attributes,
            children: Vec::new(),
        }
    }

    /// Raw value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Short human-readable identification for diagnostics.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("<{} id=\"{}\">", self.kind.tag(), id),
            None => format!("<{}> #{}", self.kind.tag(), self.index),
        }
    }

    /// Number of non-group elements in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self.kind {
            ElementKind::Group => self.children.iter().map(Element::leaf_count).sum(),
            _ => 1,
        }
    }
}

/// The `viewBox` rectangle in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    fn parse(raw: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidViewBox(raw.to_string());
        let values = parse_number_list(raw).map_err(|_| invalid())?;
        match values.as_slice() {
            &[min_x, min_y, width, height] if width > 0.0 && height > 0.0 => Ok(Self {
                min_x,
                min_y,
                width,
                height,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Alignment of the viewBox inside the viewport along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAlign {
    Min,
    Mid,
    Max,
}

impl AxisAlign {
    fn offset(self, free_space: f64) -> f64 {
        match self {
            Self::Min => 0.0,
            Self::Mid => free_space / 2.0,
            Self::Max => free_space,
        }
    }
}

/// Parsed `preserveAspectRatio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreserveAspectRatio {
    /// `None` means non-uniform scaling (`preserveAspectRatio="none"`).
    pub align: Option<(AxisAlign, AxisAlign)>,
    /// `slice` instead of `meet`.
    pub slice: bool,
}

impl Default for PreserveAspectRatio {
    fn default() -> Self {
        Self {
            align: Some((AxisAlign::Mid, AxisAlign::Mid)),
            slice: false,
        }
    }
}

impl PreserveAspectRatio {
    fn parse(raw: &str) -> Self {
        let mut words = raw.split_whitespace();
        let align = match words.next() {
            Some("none") => None,
            None => return Self::default(),
            Some(word) => {
                let axis = |s: Option<&str>| match s {
                    Some("Min") => Some(AxisAlign::Min),
                    Some("Mid") => Some(AxisAlign::Mid),
                    Some("Max") => Some(AxisAlign::Max),
                    _ => None,
                };
                let shape_ok = word.len() == 8
                    && word.get(0..1) == Some("x")
                    && word.get(4..5) == Some("Y");
                match (shape_ok, axis(word.get(1..4)), axis(word.get(5..8))) {
                    (true, Some(x), Some(y)) => Some((x, y)),
                    _ => return Self::default(),
                }
            }
            _ => return Self::default(),
        };
        Self {
            align,
            slice: words.next() == Some("slice"),
        }
    }
}

/// Mapping from user units to device millimetres, resolved once at parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    /// Millimetres per user unit along X.
    pub x: f64,
    /// Millimetres per user unit along Y.
    pub y: f64,
    /// Viewport offset of the viewBox origin (mm).
    pub offset_x: f64,
    pub offset_y: f64,
}

impl UnitScale {
    fn resolve(
        view_box: &ViewBox,
        width_mm: f64,
        height_mm: f64,
        aspect: PreserveAspectRatio,
    ) -> Self {
        let sx = width_mm / view_box.width;
        let sy = height_mm / view_box.height;

        match aspect.align {
            None => Self {
                x: sx,
                y: sy,
                offset_x: 0.0,
                offset_y: 0.0,
            },
            Some((align_x, align_y)) => {
                let s = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
                Self {
                    x: s,
                    y: s,
                    offset_x: align_x.offset(width_mm - view_box.width * s),
                    offset_y: align_y.offset(height_mm - view_box.height * s),
                }
            }
        }
    }
}

/// A parsed SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub view_box: ViewBox,
    /// Physical page size (mm).
    pub width_mm: f64,
    pub height_mm: f64,
    pub aspect: PreserveAspectRatio,
    pub unit_scale: UnitScale,
    /// Stroke and display declared on the root `<svg>`.
    pub root_style: Style,
    /// Top-level elements in document order.
    pub elements: Vec<Element>,
}

impl Document {
    /// Parse SVG bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))?;
        Self::parse_str(text)
    }

    /// Parse SVG text.
    pub fn parse_str(text: &str) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut builder = TreeBuilder::default();
        loop {
            let event = reader.read_event().map_err(|e| ParseError::Xml {
                position: reader.error_position(),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(start) => {
                    let (tag, attributes) = read_start(&reader, &start)?;
                    builder.open(tag, attributes)?;
                }
                Event::Empty(start) => {
                    let (tag, attributes) = read_start(&reader, &start)?;
                    builder.open(tag, attributes)?;
                    builder.close();
                }
                Event::End(_) => builder.close(),
                Event::Eof => break,
                _ => {}
            }
        }

        builder.finish()
    }

    /// Transform from user units to device millimetres.
    ///
    /// With `flip_y` the Y axis points up and the origin is the bottom-left
    /// corner of the page, as plotters expect.
    pub fn viewport_transform(&self, flip_y: bool) -> Transform {
        let scale = &self.unit_scale;
        let to_viewport = Transform::translation(-self.view_box.min_x, -self.view_box.min_y)
            .then(&Transform::scale(scale.x, scale.y))
            .then(&Transform::translation(scale.offset_x, scale.offset_y));

        if flip_y {
            to_viewport.then(&Transform::new(1.0, 0.0, 0.0, -1.0, 0.0, self.height_mm))
        } else {
            to_viewport
        }
    }

    /// Map a user-space point straight to device millimetres.
    pub fn to_device(&self, p: Point, flip_y: bool) -> Point {
        self.viewport_transform(flip_y).transform_point(p)
    }

    /// Number of non-group elements in the document.
    pub fn leaf_count(&self) -> usize {
        self.elements.iter().map(Element::leaf_count).sum()
    }
}

/// Decode tag local name and attributes of a start tag.
fn read_start(
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<(String, BTreeMap<String, String>), ParseError> {
    let xml_error = |message: String| ParseError::Xml {
        position: reader.buffer_position(),
        message,
    };

    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = BTreeMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(e.to_string()))?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| xml_error(e.to_string()))?
            .into_owned();

        // Keep the default namespace declaration verbatim; other prefixed
        // keys (xlink:href, inkscape:label) are reduced to their local name.
        let key = if attr.key.as_ref() == b"xmlns" {
            "xmlns".to_string()
        } else if attr.key.as_ref().starts_with(b"xmlns:") {
            continue;
        } else {
            String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned()
        };
        attributes.insert(key, value);
    }

    Ok((tag, attributes))
}

enum Frame {
    Root,
    Element(Element),
    Skipped(String),
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    root: Option<RootAttributes>,
    elements: Vec<Element>,
    next_index: usize,
    finished_root: bool,
}

struct RootAttributes {
    view_box: Option<String>,
    width: Option<String>,
    height: Option<String>,
    aspect: Option<String>,
    style: Style,
}

impl TreeBuilder {
    fn open(&mut self, tag: String, attributes: BTreeMap<String, String>) -> Result<(), ParseError> {
        let Some(parent) = self.stack.last() else {
            return self.open_root(tag, attributes);
        };

        let frame = match parent {
            Frame::Skipped(_) => Frame::Skipped(tag),
            Frame::Element(el) if el.kind != ElementKind::Group => {
                debug!("Ignoring <{}> inside {}", tag, el.label());
                Frame::Skipped(tag)
            }
            _ => match ElementKind::from_tag(&tag) {
                Some(kind) => {
                    let element = Element::new(kind, self.next_index, attributes);
                    self.next_index += 1;
                    Frame::Element(element)
                }
                None => {
                    debug!("Skipping unsupported element <{}>", tag);
                    Frame::Skipped(tag)
                }
            },
        };

        self.stack.push(frame);
        Ok(())
    }

    fn open_root(
        &mut self,
        tag: String,
        mut attributes: BTreeMap<String, String>,
    ) -> Result<(), ParseError> {
        if self.finished_root {
            return Err(ParseError::Xml {
                position: 0,
                message: format!("unexpected second root element <{}>", tag),
            });
        }
        if tag != "svg" {
            return Err(ParseError::NotSvg(tag));
        }
        if let Some(ns) = attributes.get("xmlns") {
            if ns.trim() != SVG_NAMESPACE {
                return Err(ParseError::UnsupportedNamespace(ns.clone()));
            }
        }

        let style = Style::from_attributes(&attributes);
        self.root = Some(RootAttributes {
            style,
            view_box: attributes.remove("viewBox"),
            width: attributes.remove("width"),
            height: attributes.remove("height"),
            aspect: attributes.remove("preserveAspectRatio"),
        });
        self.stack.push(Frame::Root);
        Ok(())
    }

    fn close(&mut self) {
        match self.stack.pop() {
            Some(Frame::Element(element)) => match self.stack.last_mut() {
                Some(Frame::Element(parent)) => parent.children.push(element),
                _ => self.elements.push(element),
            },
            Some(Frame::Root) => self.finished_root = true,
            Some(Frame::Skipped(_)) | None => {}
        }
    }

    fn finish(self) -> Result<Document, ParseError> {
        if let Some(open) = self.stack.last() {
            let tag = match open {
                Frame::Root => "svg".to_string(),
                Frame::Element(el) => el.kind.tag().to_string(),
                Frame::Skipped(tag) => tag.clone(),
            };
            return Err(ParseError::Unclosed(tag));
        }
        let root = self.root.ok_or(ParseError::Empty)?;

        let px = LengthUnit::Px.mm_per_unit();
        let length = |raw: &Option<String>| {
            raw.as_deref().and_then(|s| match parse_length_mm(s) {
                Ok(mm) if mm > 0.0 => Some(mm),
                _ => {
                    debug!("Ignoring unusable root length '{}'", s);
                    None
                }
            })
        };
        let width = length(&root.width);
        let height = length(&root.height);

        let view_box = match root.view_box.as_deref() {
            Some(raw) => ViewBox::parse(raw)?,
            None => match (width, height) {
                (Some(w), Some(h)) => ViewBox {
                    min_x: 0.0,
                    min_y: 0.0,
                    width: w / px,
                    height: h / px,
                },
                _ => return Err(ParseError::MissingViewport),
            },
        };

        let (width_mm, height_mm) = match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w * view_box.height / view_box.width),
            (None, Some(h)) => (h * view_box.width / view_box.height, h),
            (None, None) => (view_box.width * px, view_box.height * px),
        };

        let aspect = root
            .aspect
            .as_deref()
            .map(PreserveAspectRatio::parse)
            .unwrap_or_default();
        let unit_scale = UnitScale::resolve(&view_box, width_mm, height_mm, aspect);

        debug!(
            "Parsed document: {}x{} mm, viewBox {:?}, {} top-level element(s)",
            width_mm,
            height_mm,
            view_box,
            self.elements.len()
        );

        Ok(Document {
            view_box,
            width_mm,
            height_mm,
            aspect,
            unit_scale,
            root_style: root.style,
            elements: self.elements,
        })
    }
}
