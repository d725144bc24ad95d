//! Stroke colour to pen mapping
//!
//! Pens are handed out in first-seen order of the normalised stroke colour.
//! Once the carousel is full, further colours share pen 1.

use tracing::debug;

/// Pen used for unstroked paths and colours beyond the carousel.
pub const DEFAULT_PEN: u8 = 1;

/// Colour-to-pen assignment, stable for one conversion.
#[derive(Debug, Clone)]
pub struct PenPalette {
    pen_count: u8,
    assigned: Vec<(String, u8)>,
}

impl PenPalette {
    pub fn new(pen_count: u8) -> Self {
        Self {
            pen_count: pen_count.max(1),
            assigned: Vec::new(),
        }
    }

    /// Pen for an effective stroke value.
    pub fn pen_for(&mut self, stroke: Option<&str>) -> u8 {
        let Some(color) = stroke.and_then(normalize_color) else {
            return DEFAULT_PEN;
        };

        if let Some((_, pen)) = self.assigned.iter().find(|(c, _)| *c == color) {
            return *pen;
        }

        let next = self.assigned.len() + 1;
        if next > usize::from(self.pen_count) {
            debug!("Pen carousel full, plotting {} with pen {}", color, DEFAULT_PEN);
            return DEFAULT_PEN;
        }

        let pen = next as u8;
        debug!("Assigned pen {} to stroke {}", pen, color);
        self.assigned.push((color, pen));
        pen
    }

    /// Assignments in pen order.
    pub fn assignments(&self) -> &[(String, u8)] {
        &self.assigned
    }
}

/// Normalise a CSS colour to lowercase `#rrggbb`.
///
/// Unrecognised values are kept lowercased so distinct strings still get
/// distinct pens. `none`, `transparent` and empty values mean no stroke.
pub fn normalize_color(raw: &str) -> Option<String> {
    let value = raw.trim().to_ascii_lowercase();
    match value.as_str() {
        "" | "none" | "transparent" => return None,
        _ => {}
    }

    if let Some(hex) = value.strip_prefix('#') {
        if hex.chars().all(|c| c.is_ascii_hexdigit()) {
            match hex.len() {
                3 => {
                    let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
                    return Some(format!("#{}", expanded));
                }
                6 => return Some(value),
                _ => {}
            }
        }
        return Some(value);
    }

    if let Some(args) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels: Option<Vec<u8>> = args
            .split(',')
            .map(|part| {
                let part = part.trim();
                match part.strip_suffix('%') {
                    Some(pct) => pct
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .map(|p| (p.clamp(0.0, 100.0) * 2.55).round() as u8),
                    None => part.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8),
                }
            })
            .collect();
        if let Some([r, g, b]) = channels.as_deref() {
            return Some(format!("#{:02x}{:02x}{:02x}", r, g, b));
        }
        return Some(value);
    }

    Some(named_color(&value).map_or(value, str::to_string))
}

fn named_color(name: &str) -> Option<&'static str> {
    Some(match name {
        "black" => "#000000",
        "white" => "#ffffff",
        "red" => "#ff0000",
        "lime" => "#00ff00",
        "green" => "#008000",
        "blue" => "#0000ff",
        "yellow" => "#ffff00",
        "cyan" | "aqua" => "#00ffff",
        "magenta" | "fuchsia" => "#ff00ff",
        "gray" | "grey" => "#808080",
        "silver" => "#c0c0c0",
        "maroon" => "#800000",
        "olive" => "#808000",
        "navy" => "#000080",
        "purple" => "#800080",
        "teal" => "#008080",
        "orange" => "#ffa500",
        "brown" => "#a52a2a",
        "pink" => "#ffc0cb",
        _ => return None,
    })
}
