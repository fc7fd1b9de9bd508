/// Per-object transform state and world matrix composition
use nalgebra::{Matrix4, Vector3};

use crate::math;

/// Position, Euler rotation (radians) and scale of an object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl TransformState {
    pub fn new(position: Vector3<f32>, rotation: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vector3::repeat(scale))
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, delta: &Vector3<f32>) {
        self.rotation += delta;
    }

    /// Compose the world matrix: `Scale * RotZ * RotX * RotY * Translate`.
    ///
    /// Scaling happens in local space, then rotation Z, X, Y, then the
    /// translation. Swapping any of these changes how the controls feel.
    pub fn world_matrix(&self) -> Matrix4<f32> {
        math::scaling(&self.scale) * Self::rotation_matrix(&self.rotation)
            * math::translation(&self.position)
    }

    /// Rotation part only, `RotZ * RotX * RotY`
    pub fn rotation_matrix(rotation: &Vector3<f32>) -> Matrix4<f32> {
        math::rotation_z(rotation.z) * math::rotation_x(rotation.x) * math::rotation_y(rotation.y)
    }

    /// Set the rotation so the local +Z axis points from `position` at `target`.
    ///
    /// Roll is reset to zero. Returns `false` and leaves the rotation alone if
    /// the two points coincide.
    pub fn face_target(&mut self, target: &Vector3<f32>) -> bool {
        let d = target - self.position;
        let horizontal = (d.x * d.x + d.z * d.z).sqrt();
        if horizontal < f32::EPSILON && d.y.abs() < f32::EPSILON {
            return false;
        }
        self.rotation = Vector3::new((-d.y).atan2(horizontal), d.x.atan2(d.z), 0.0);
        true
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::identity()
    }
}

/// Compose a world matrix from a transform state
pub fn compose_world_matrix(state: &TransformState) -> Matrix4<f32> {
    state.world_matrix()
}

/// Create a model-view-projection matrix (row vectors, so model comes first)
pub fn mvp_matrix(
    model: &Matrix4<f32>,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
) -> Matrix4<f32> {
    model * view * projection
}
