/// Perspective projection parameters
use nalgebra::{Matrix4, Vector3};

use crate::error::{Result, SceneError};
use crate::math;

/// Field of view, aspect ratio and clip range of a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Screen width / height
    pub aspect: f32,
    /// Horizontal field of view in radians
    pub fov_x: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(aspect: f32, fov_x: f32, near: f32, far: f32) -> Self {
        Self {
            aspect,
            fov_x,
            near,
            far,
        }
    }

    /// Aspect ratio of a viewport in pixels
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
        self
    }

    /// Build the projection matrix.
    ///
    /// Left-handed, row vectors: view-space z in `[near, far]` lands on depth
    /// `[0, 1]` after the divide by w. Bad parameters give a degenerate
    /// matrix rather than an error, see [`Projection::validate`].
    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix4<f32> {
        let tan_fov_x = (self.fov_x * 0.5).tan();
        let scale_x = 1.0 / tan_fov_x;
        let scale_y = self.aspect / tan_fov_x;
        let scale_za = self.far / (self.far - self.near);
        let scale_zb = -self.near * scale_za;

        Matrix4::new(
            scale_x,     0.0,      0.0, 0.0,
                0.0, scale_y,      0.0, 0.0,
                0.0,     0.0, scale_za, 1.0,
                0.0,     0.0, scale_zb, 0.0,
        )
    }

    /// Check the parameters produce a usable matrix
    pub fn validate(&self) -> Result<()> {
        if !(self.aspect > 0.0) {
            return Err(SceneError::InvalidProjection("aspect ratio must be positive"));
        }
        if !(self.fov_x > 0.0 && self.fov_x < std::f32::consts::PI) {
            return Err(SceneError::InvalidProjection(
                "field of view must be between 0 and 180 degrees",
            ));
        }
        if !(self.near > 0.0) {
            return Err(SceneError::InvalidProjection("near clip must be positive"));
        }
        if !(self.far > self.near) {
            return Err(SceneError::InvalidProjection(
                "far clip must be beyond near clip",
            ));
        }
        Ok(())
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            aspect: 4.0 / 3.0,
            fov_x: 90f32.to_radians(),
            near: 0.1,
            far: 10000.0,
        }
    }
}

/// Project a world-space point to screen pixels.
///
/// Returns `(x, y, depth)` with depth in `[0, 1]`, or `None` when the point
/// is closer than the near plane or beyond the far plane. Points off the
/// sides of the screen are returned as-is for the rasterizer to clip.
pub fn project_to_screen(
    point: &Vector3<f32>,
    view_projection: &Matrix4<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = math::transform_homogeneous(point, view_projection);

    // Prevent division by near-zero or negative w (behind the camera)
    if clip.w < 1e-6 {
        return None;
    }

    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    let depth = clip.z / clip.w;

    if !(0.0..=1.0).contains(&depth) {
        return None;
    }

    let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

    Some((screen_x, screen_y, depth))
}
