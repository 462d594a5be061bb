//! Input model: mouse buttons, keys, recorded events, and the gesture state machine.
//!
//! `InputEvent` is the host-independent form of a DOM event; the web wrapper
//! and the CLI replay both feed the engine through it. `InputState` is the
//! gesture being tracked between events, carrying the context needed to
//! compute anchored pans and segment endpoints.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::viewbox::{Point, Viewbox};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// A keyboard key as reported by the browser (e.g. `"r"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels (ignored by the viewer).
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// One pointer, wheel or key event in surface coordinates.
///
/// Serialized as one JSON object per line for recorded sessions, e.g.
/// `{"type":"pointer_down","x":10,"y":20,"button":"primary"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, button: Button },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64, button: Button },
    Wheel { x: f64, y: f64, dy: f64 },
    KeyDown { key: Key },
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// The primary button is held and the view follows the pointer.
    Dragging {
        /// Document point under the pointer when the drag (re)started.
        anchor_doc: Point,
        /// Viewbox captured at the same moment; every pan is computed from it.
        start: Viewbox,
    },
    /// One endpoint has been placed and the next secondary click completes the segment.
    PlacingSegment {
        /// Document-space first endpoint.
        pending: Point,
        /// Document-space pointer position for the live preview, once the pointer moved.
        preview_end: Option<Point>,
    },
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    #[must_use]
    pub fn is_placing(&self) -> bool {
        matches!(self, Self::PlacingSegment { .. })
    }

    /// Document anchor of the active drag.
    #[must_use]
    pub fn drag_anchor(&self) -> Option<Point> {
        match self {
            Self::Dragging { anchor_doc, .. } => Some(*anchor_doc),
            _ => None,
        }
    }

    /// First endpoint of the segment being placed.
    #[must_use]
    pub fn pending_point(&self) -> Option<Point> {
        match self {
            Self::PlacingSegment { pending, .. } => Some(*pending),
            _ => None,
        }
    }

    /// Preview endpoints `(pending, pointer)` once the pointer has moved.
    #[must_use]
    pub fn preview(&self) -> Option<(Point, Point)> {
        match self {
            Self::PlacingSegment { pending, preview_end: Some(end) } => Some((*pending, *end)),
            _ => None,
        }
    }
}
