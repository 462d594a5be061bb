//! Render driver: flattens the scene into point/color buffers and hands them
//! to a [`RendererBackend`].
//!
//! Every pass is a full redraw. The transform is computed once from the
//! viewbox ([`Viewbox::transform`]) and pushed before the buffers are drawn.
//! Nothing here touches a graphics API directly; see [`crate::webgl`] for the
//! browser backend and [`FrameCapture`] for a recording one.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use glam::{Mat4, Vec4};
use serde::Serialize;

use crate::consts::TRANSFORM_UNIFORM;
use crate::error::RenderError;
use crate::scene::{LineSegment, Rgba, Scene};
use crate::viewbox::{Point, Viewbox};

/// Uniform upload and batched line drawing.
pub trait RendererBackend {
    /// Store `matrix` in the named uniform slot.
    ///
    /// # Errors
    ///
    /// Backend-specific; typically [`RenderError::MissingUniform`].
    fn set_uniform_matrix(&mut self, name: &str, matrix: &Mat4) -> Result<(), RenderError>;

    /// Upload both buffers and draw them as independent line segments
    /// (two consecutive points per segment).
    ///
    /// # Errors
    ///
    /// Backend-specific upload or draw failure.
    fn draw_segments(&mut self, points: &[Vec4], colors: &[Vec4]) -> Result<(), RenderError>;
}

/// Flattened vertex data for one render pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderBuffers {
    /// `(x, y, 0, 1)` per vertex, document space.
    pub points: Vec<Vec4>,
    /// RGBA per vertex, parallel to `points`.
    pub colors: Vec<Vec4>,
}

impl RenderBuffers {
    /// Source segments, then user segments, then the preview (if any).
    ///
    /// Segments with a non-finite endpoint are left out.
    #[must_use]
    pub fn build(scene: &Scene, preview: Option<(Point, Point)>, preview_color: Rgba) -> Self {
        let mut buffers = Self::default();
        for seg in scene.segments() {
            buffers.push(seg);
        }
        if let Some((a, b)) = preview {
            buffers.push(&LineSegment::new(a, b, preview_color));
        }
        buffers
    }

    fn push(&mut self, seg: &LineSegment) {
        if !seg.is_renderable() {
            return;
        }
        let (Some(a), Some(b)) = (vertex(seg.a), vertex(seg.b)) else {
            tracing::debug!(?seg, "segment outside single-precision range skipped");
            return;
        };
        let color = seg.color.to_vec4();
        self.points.push(a);
        self.points.push(b);
        self.colors.push(color);
        self.colors.push(color);
    }

    /// Number of segments in the buffers.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len() / 2
    }
}

/// `None` when a coordinate overflows `f32`.
#[allow(clippy::cast_possible_truncation)]
fn vertex(p: Point) -> Option<Vec4> {
    let v = Vec4::new(p.x as f32, p.y as f32, 0.0, 1.0);
    v.is_finite().then_some(v)
}

/// Push the transform for `viewbox`, build the buffers and draw them.
///
/// Returns the number of segments drawn.
///
/// # Errors
///
/// Propagates the first backend failure; nothing is retried.
pub fn draw(
    backend: &mut dyn RendererBackend,
    viewbox: Viewbox,
    scene: &Scene,
    preview: Option<(Point, Point)>,
    preview_color: Rgba,
) -> Result<usize, RenderError> {
    backend.set_uniform_matrix(TRANSFORM_UNIFORM, &viewbox.transform())?;
    let buffers = RenderBuffers::build(scene, preview, preview_color);
    backend.draw_segments(&buffers.points, &buffers.colors)?;
    tracing::trace!(segments = buffers.segment_count(), size = viewbox.size, "frame drawn");
    Ok(buffers.segment_count())
}

/// A backend that records what it was asked to draw.
///
/// Used by the CLI `frame` command and by tests in place of a GPU.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameCapture {
    /// Last matrix per uniform name, in upload order.
    pub uniforms: Vec<(String, Mat4)>,
    /// Buffers of the most recent draw call.
    pub last_frame: RenderBuffers,
    /// Number of draw calls received.
    pub draw_calls: usize,
}

impl FrameCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last matrix uploaded under `name`.
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<Mat4> {
        self.uniforms.iter().find(|(n, _)| n == name).map(|(_, m)| *m)
    }
}

impl RendererBackend for FrameCapture {
    fn set_uniform_matrix(&mut self, name: &str, matrix: &Mat4) -> Result<(), RenderError> {
        if let Some(slot) = self.uniforms.iter_mut().find(|(n, _)| n == name) {
            slot.1 = *matrix;
        } else {
            self.uniforms.push((name.to_owned(), *matrix));
        }
        Ok(())
    }

    fn draw_segments(&mut self, points: &[Vec4], colors: &[Vec4]) -> Result<(), RenderError> {
        if points.len() != colors.len() {
            return Err(RenderError::BufferMismatch { points: points.len(), colors: colors.len() });
        }
        self.last_frame = RenderBuffers { points: points.to_vec(), colors: colors.to_vec() };
        self.draw_calls += 1;
        Ok(())
    }
}
