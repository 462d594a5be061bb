//! Scene model: source segments from the loaded document plus user segments.
//!
//! The scene keeps the parsed [`markup::Document`] it was built from so that
//! export can hand back the original tree with the user's lines appended.
//! Source segments are immutable once loaded; user segments are append-only.
//!
//! Endpoint attributes that are missing or not numbers become `NaN`. Such a
//! segment still occupies its slot (and is exported untouched) but is skipped
//! by the render pass.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use glam::Vec4;
use markup::{Document, Element};
use serde::{Deserialize, Serialize};

use crate::viewbox::{Bounds, Point};

/// Tag name of line-shaped elements.
pub const LINE_TAG: &str = "line";

/// Tag name of the size-declaring root element.
pub const ROOT_TAG: &str = "svg";

/// An RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    #[must_use]
    pub const fn from_array(c: [f32; 4]) -> Self {
        Self { r: c[0], g: c[1], b: c[2], a: c[3] }
    }

    /// Parse `#rrggbb` or `#rgb` into an opaque color.
    #[must_use]
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channels: Vec<u8> = match hex.len() {
            6 => (0..3).map(|i| hex_channel(&hex[i * 2..i * 2 + 2])).collect::<Option<_>>()?,
            3 => hex.chars().map(|c| hex_channel(&format!("{c}{c}"))).collect::<Option<_>>()?,
            _ => return None,
        };
        Some(Self {
            r: f32::from(channels[0]) / 255.0,
            g: f32::from(channels[1]) / 255.0,
            b: f32::from(channels[2]) / 255.0,
            a: 1.0,
        })
    }

    /// Components as a shader-ready vector.
    #[must_use]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

/// A straight segment between two document-space points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub a: Point,
    pub b: Point,
    pub color: Rgba,
}

impl LineSegment {
    #[must_use]
    pub fn new(a: Point, b: Point, color: Rgba) -> Self {
        Self { a, b, color }
    }

    /// `true` when both endpoints are finite and the segment can be drawn.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }
}

/// Attributes written on exported user segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStyle {
    pub stroke: String,
    pub stroke_width: String,
}

/// Source document, its segments, and the segments the user has drawn.
#[derive(Debug, Clone)]
pub struct Scene {
    source: Document,
    declared_bounds: Option<Bounds>,
    source_segments: Vec<LineSegment>,
    user_segments: Vec<LineSegment>,
}

impl Scene {
    /// Extract every line element of `source` in document order.
    ///
    /// `default_color` applies to lines without a parseable `stroke`.
    #[must_use]
    pub fn load_from_source(source: Document, default_color: Rgba) -> Self {
        let source_segments: Vec<LineSegment> = source
            .find_elements_by_tag(LINE_TAG)
            .into_iter()
            .map(|el| segment_from_element(el, default_color))
            .collect();

        let declared_bounds = source
            .find_elements_by_tag(ROOT_TAG)
            .first()
            .and_then(|root| root.get_attribute("viewBox"))
            .and_then(parse_view_box);

        let unrenderable = source_segments.iter().filter(|s| !s.is_renderable()).count();
        tracing::debug!(segments = source_segments.len(), unrenderable, ?declared_bounds, "scene extracted");

        Self { source, declared_bounds, source_segments, user_segments: Vec::new() }
    }

    /// Bounding rectangle from the root `viewBox`, if one was declared and parsed.
    #[must_use]
    pub fn declared_bounds(&self) -> Option<Bounds> {
        self.declared_bounds
    }

    /// The parsed document this scene was built from.
    #[must_use]
    pub fn source(&self) -> &Document {
        &self.source
    }

    #[must_use]
    pub fn source_segments(&self) -> &[LineSegment] {
        &self.source_segments
    }

    #[must_use]
    pub fn user_segments(&self) -> &[LineSegment] {
        &self.user_segments
    }

    /// Source segments followed by user segments.
    pub fn segments(&self) -> impl Iterator<Item = &LineSegment> {
        self.source_segments.iter().chain(self.user_segments.iter())
    }

    /// Total number of segments, renderable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.source_segments.len() + self.user_segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of segments the render pass will draw.
    #[must_use]
    pub fn renderable_count(&self) -> usize {
        self.segments().filter(|s| s.is_renderable()).count()
    }

    /// Append a user segment and return it.
    pub fn add_user_segment(&mut self, a: Point, b: Point, color: Rgba) -> LineSegment {
        let segment = LineSegment::new(a, b, color);
        self.user_segments.push(segment);
        segment
    }

    /// The source tree with one line element appended to the root per user segment.
    #[must_use]
    pub fn export(&self, style: &ExportStyle) -> Document {
        let mut doc = self.source.clone();
        for seg in &self.user_segments {
            doc.root.append_child(
                Element::new(LINE_TAG)
                    .with_attribute("x1", seg.a.x.to_string())
                    .with_attribute("y1", seg.a.y.to_string())
                    .with_attribute("x2", seg.b.x.to_string())
                    .with_attribute("y2", seg.b.y.to_string())
                    .with_attribute("stroke", style.stroke.as_str())
                    .with_attribute("stroke-width", style.stroke_width.as_str()),
            );
        }
        doc
    }
}

fn hex_channel(pair: &str) -> Option<u8> {
    match u8::from_str_radix(pair, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

fn segment_from_element(el: &Element, default_color: Rgba) -> LineSegment {
    let a = Point::new(numeric_attribute(el, "x1"), numeric_attribute(el, "y1"));
    let b = Point::new(numeric_attribute(el, "x2"), numeric_attribute(el, "y2"));
    let color = match el.get_attribute("stroke") {
        Some(raw) => Rgba::from_hex(raw).unwrap_or_else(|| {
            tracing::debug!(stroke = raw, "unparseable stroke color, using default");
            default_color
        }),
        None => default_color,
    };
    LineSegment::new(a, b, color)
}

/// Parse a numeric attribute; missing or malformed values become `NaN`.
fn numeric_attribute(el: &Element, name: &str) -> f64 {
    let Some(raw) = el.get_attribute(name) else {
        return f64::NAN;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(attribute = name, value = raw, "malformed numeric attribute");
            f64::NAN
        }
    }
}

/// Parse `"min-x min-y width height"` (whitespace and/or comma separated).
#[must_use]
pub fn parse_view_box(raw: &str) -> Option<Bounds> {
    let mut values = Vec::with_capacity(4);
    for part in raw.split(|c: char| c == ',' || c.is_whitespace()).filter(|p| !p.is_empty()) {
        match part.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => return None,
        }
    }
    match values.as_slice() {
        [x, y, width, height] => Some(Bounds { x: *x, y: *y, width: *width, height: *height }),
        _ => None,
    }
}
