//! Shared numeric constants for the canvas crate.

// ── Surface ─────────────────────────────────────────────────────

/// Edge length of the square drawing surface in logical pixels.
///
/// All screen-to-document math is relative to this size.
pub const SURFACE_SIZE: f64 = 512.0;

/// Clear color of the surface (opaque white).
pub const CLEAR_RGBA: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Uniform slot that receives the composite view transform.
pub const TRANSFORM_UNIFORM: &str = "coordinateTransform";

// ── Zoom ────────────────────────────────────────────────────────

/// Scroll delta that would collapse the zoom factor to zero.
pub const SCROLL_SENSITIVITY: f64 = 1000.0;

/// Smallest viewbox size as a fraction of the original size.
pub const MIN_ZOOM_RATIO: f64 = 0.1;

/// Largest viewbox size as a multiple of the original size.
pub const MAX_ZOOM_RATIO: f64 = 10.0;

/// Floor for the per-event zoom factor; keeps huge zoom-out deltas positive.
pub const MIN_ZOOM_FACTOR: f64 = 0.01;

// ── Colors ──────────────────────────────────────────────────────

/// Color of source segments that declare no stroke.
pub const SOURCE_DEFAULT_RGBA: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Color of user-drawn segments and the live preview.
pub const USER_SEGMENT_RGBA: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

// ── Export ──────────────────────────────────────────────────────

/// `stroke` attribute written on exported user segments.
pub const EXPORT_STROKE: &str = "#ff0000";

/// `stroke-width` attribute written on exported user segments.
pub const EXPORT_STROKE_WIDTH: &str = "1%";
