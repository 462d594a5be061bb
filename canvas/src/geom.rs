//! Transform math: projection, scale and translation matrices.
//!
//! Matrices are column-major `glam::Mat4` values ready to be uploaded to a
//! uniform slot. Document space has its y axis pointing down, so projections
//! map the top edge of a window to clip-space `+1`.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use glam::{Mat4, Vec3};

/// Orthographic projection of the box `[left, right] x [bottom, top] x [near, far]`
/// onto clip space. Passing `bottom > top` flips the y axis.
#[must_use]
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
}

/// Non-uniform scale about the origin.
#[must_use]
pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
    Mat4::from_scale(Vec3::new(sx, sy, sz))
}

/// Translation by `(tx, ty, tz)`.
#[must_use]
pub fn translation(tx: f32, ty: f32, tz: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(tx, ty, tz))
}

/// Composite transform for a square window at `(x, y)` with edge `size`.
///
/// Applied right to left: translate the window origin to zero, scale the
/// window down to the unit square, then project the unit square (y down)
/// onto clip space. Equivalent to `ortho(x, x + size, y + size, y, 1, -1)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn window_transform(x: f64, y: f64, size: f64) -> Mat4 {
    let projection = ortho(0.0, 1.0, 1.0, 0.0, 1.0, -1.0);
    let zoom = scale((1.0 / size) as f32, (1.0 / size) as f32, 1.0);
    let pan = translation(-x as f32, -y as f32, 0.0);
    projection * zoom * pan
}
