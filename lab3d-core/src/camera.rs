/// Camera treated as a model: a world matrix inverted into a view matrix
use nalgebra::{Matrix4, Vector3};

use crate::control::{self, ControlScheme, ControlSpeeds};
use crate::input::KeyState;
use crate::math;
use crate::projection::{self, Projection};
use crate::transform::TransformState;

#[derive(Debug, Clone)]
pub struct Camera {
    /// Scale is ignored, cameras always use 1
    pub transform: TransformState,
    pub projection: Projection,
    previous_world: Matrix4<f32>,
}

impl Camera {
    pub fn new(position: Vector3<f32>, rotation: Vector3<f32>, projection: Projection) -> Self {
        let transform = TransformState::at(position).with_rotation(rotation);
        Self {
            previous_world: transform.world_matrix(),
            transform,
            projection,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    /// `RotZ * RotX * RotY * Translate`, built fresh from the current state
    pub fn world_matrix(&self) -> Matrix4<f32> {
        TransformState {
            scale: Vector3::repeat(1.0),
            ..self.transform
        }
        .world_matrix()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        math::inverse_affine(&self.world_matrix())
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection.matrix()
    }

    /// View then projection (row vectors)
    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.view_matrix() * self.projection_matrix()
    }

    /// Turn the camera to look at a point
    pub fn face_target(&mut self, target: &Vector3<f32>) {
        if self.transform.face_target(target) {
            self.previous_world = self.world_matrix();
        }
    }

    /// Apply one frame of keyboard control, moving along last frame's axes
    pub fn control(
        &mut self,
        keys: &KeyState,
        controls: &ControlScheme,
        speeds: &ControlSpeeds,
        dt: f32,
    ) {
        control::update_transform(
            &mut self.transform,
            &self.previous_world,
            keys,
            controls,
            speeds,
            dt,
        );
        self.previous_world = self.world_matrix();
    }

    /// Project a world-space point to screen pixels, see [`projection::project_to_screen`]
    pub fn project_to_screen(
        &self,
        point: &Vector3<f32>,
        view_projection: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        projection::project_to_screen(point, view_projection, width, height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros(), Projection::default())
    }
}
