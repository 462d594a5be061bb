//! Viewbox model: the square window over document space and its transitions.
//!
//! A [`Viewbox`] is a plain value. Zoom, pan and reset are pure functions that
//! return a new value; [`ViewboxModel`] holds the live window together with the
//! immutable snapshot taken at load time.

#[cfg(test)]
#[path = "viewbox_test.rs"]
mod viewbox_test;

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_ZOOM_FACTOR;
use crate::geom;

/// A point in either screen or document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise `self - other`.
    #[must_use]
    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// `true` when both coordinates are finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Bounding rectangle declared by a source document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Zoom tuning taken from [`crate::config::ViewerConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSettings {
    /// Scroll delta that would collapse the zoom factor to zero.
    pub sensitivity: f64,
    /// Lower size limit as a fraction of the original size.
    pub min_ratio: f64,
    /// Upper size limit as a multiple of the original size.
    pub max_ratio: f64,
}

/// A square window over document space.
///
/// `(x, y)` is the top-left corner, `size` the edge length, both in document units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewbox {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl Viewbox {
    #[must_use]
    pub fn new(x: f64, y: f64, size: f64) -> Self {
        Self { x, y, size }
    }

    /// The default window covering the whole drawing surface.
    #[must_use]
    pub fn canonical(surface_size: f64) -> Self {
        Self { x: 0.0, y: 0.0, size: surface_size }
    }

    /// Window for a document's declared bounds.
    ///
    /// Uses the larger of width and height so the whole rectangle fits. Missing,
    /// non-finite or empty bounds fall back to [`Viewbox::canonical`].
    #[must_use]
    pub fn from_bounds(bounds: Option<Bounds>, surface_size: f64) -> Self {
        let Some(b) = bounds else {
            return Self::canonical(surface_size);
        };
        let size = b.width.max(b.height);
        if !(b.x.is_finite() && b.y.is_finite() && size.is_finite()) || size <= 0.0 {
            return Self::canonical(surface_size);
        }
        Self { x: b.x, y: b.y, size }
    }

    /// Top-left corner.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Zoom about `cursor` (document space) for a scroll delta.
    ///
    /// Negative deltas (scroll up) shrink the window, positive deltas enlarge it.
    /// The new size is clamped to `[min_ratio, max_ratio] * original_size` and
    /// the window is then placed so that `cursor` keeps its relative position.
    #[must_use]
    pub fn zoom_at(&self, cursor: Point, delta: f64, original_size: f64, settings: ZoomSettings) -> Self {
        if delta.abs() < f64::EPSILON || !delta.is_finite() {
            return *self;
        }

        let factor = (1.0 - delta / settings.sensitivity).max(MIN_ZOOM_FACTOR);
        let new_size = (self.size / factor).clamp(settings.min_ratio * original_size, settings.max_ratio * original_size);

        let offset = cursor.minus(self.origin());
        Self {
            x: cursor.x - (offset.x / self.size) * new_size,
            y: cursor.y - (offset.y / self.size) * new_size,
            size: new_size,
        }
    }

    /// Shift the window by `-delta`; size is unchanged.
    #[must_use]
    pub fn pan_by(&self, delta: Point) -> Self {
        Self { x: self.x - delta.x, y: self.y - delta.y, size: self.size }
    }

    /// Map a surface point to document space.
    #[must_use]
    pub fn screen_to_doc(&self, screen: Point, surface_size: f64) -> Point {
        let k = self.size / surface_size;
        Point::new(self.x + screen.x * k, self.y + screen.y * k)
    }

    /// Map a document point to surface coordinates.
    #[must_use]
    pub fn doc_to_screen(&self, doc: Point, surface_size: f64) -> Point {
        let k = surface_size / self.size;
        Point::new((doc.x - self.x) * k, (doc.y - self.y) * k)
    }

    /// Position of `doc` inside the window as fractions of `size`.
    #[must_use]
    pub fn relative_position(&self, doc: Point) -> Point {
        Point::new((doc.x - self.x) / self.size, (doc.y - self.y) / self.size)
    }

    /// Composite projection for this window.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        geom::window_transform(self.x, self.y, self.size)
    }
}

/// The live viewbox plus the snapshot it was initialized from.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewboxModel {
    original: Viewbox,
    current: Viewbox,
}

impl ViewboxModel {
    /// Build from a document's declared bounds (or the canonical square).
    #[must_use]
    pub fn initialize(bounds: Option<Bounds>, surface_size: f64) -> Self {
        let original = Viewbox::from_bounds(bounds, surface_size);
        Self { original, current: original }
    }

    /// The live window.
    #[must_use]
    pub fn current(&self) -> Viewbox {
        self.current
    }

    /// The window as it was right after load.
    #[must_use]
    pub fn original(&self) -> Viewbox {
        self.original
    }

    /// Cursor-anchored zoom of the live window.
    pub fn zoom_at(&mut self, cursor: Point, delta: f64, settings: ZoomSettings) -> Viewbox {
        self.current = self.current.zoom_at(cursor, delta, self.original.size, settings);
        self.current
    }

    /// Replace the live window with `start` panned by `delta`.
    ///
    /// Drags pass the viewbox captured at drag start so repeated moves never
    /// accumulate rounding drift.
    pub fn pan_from(&mut self, start: Viewbox, delta: Point) -> Viewbox {
        self.current = start.pan_by(delta);
        self.current
    }

    /// Restore the load-time window and return a copy of it.
    pub fn reset(&mut self) -> Viewbox {
        self.current = self.original;
        self.original
    }
}
