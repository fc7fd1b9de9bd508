/// Keyboard-driven transform updates
///
/// Every frame the held keys nudge a transform by `speed * dt`. Movement is
/// either along world axes, along the object's own axes, or becomes scaling,
/// depending on which modifier key is held.
use nalgebra::{Matrix4, Vector3};

use crate::input::{Key, KeyState};
use crate::math;
use crate::transform::TransformState;

/// Rotation speed in radians per second
pub const ROTATION_SPEED: f32 = 4.0;
/// Movement speed in units per second
pub const MOVEMENT_SPEED: f32 = 10.0;
/// Scale multiplier per second
pub const SCALE_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpeeds {
    pub rotation: f32,
    pub movement: f32,
    pub scale: f32,
}

impl Default for ControlSpeeds {
    fn default() -> Self {
        Self {
            rotation: ROTATION_SPEED,
            movement: MOVEMENT_SPEED,
            scale: SCALE_SPEED,
        }
    }
}

/// A pair of keys driving one axis in opposite directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisKeys {
    pub positive: Key,
    pub negative: Key,
}

impl AxisKeys {
    pub fn new(positive: Key, negative: Key) -> Self {
        Self { positive, negative }
    }

    /// +1, -1, or 0 when neither (or both) are held
    pub fn direction(&self, keys: &KeyState) -> f32 {
        let mut direction = 0.0;
        if keys.is_held(self.positive) {
            direction += 1.0;
        }
        if keys.is_held(self.negative) {
            direction -= 1.0;
        }
        direction
    }
}

/// How the movement keys are interpreted this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementMode {
    /// Along the object's own axes, taken from last frame's world matrix
    Local,
    /// Along the world X/Y/Z axes
    World,
    /// Multiply/divide the scale instead of moving
    Scale,
}

/// Key bindings for one controllable object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlScheme {
    /// Rotation bindings for X, Y, Z
    pub rotate: [Option<AxisKeys>; 3],
    /// Movement bindings for X, Y, Z
    pub movement: [Option<AxisKeys>; 3],
    /// Scale bindings for X, Y, Z, active while the scale modifier is held
    pub scale: [Option<AxisKeys>; 3],
    pub scale_modifier: Option<Key>,
    pub world_modifier: Option<Key>,
}

impl ControlScheme {
    /// I/K/J/L/U/O rotate; H/F, R/Y, T/G move; X with H/F, T/G, R/Y scales;
    /// Z moves in world space
    pub fn model_default() -> Self {
        let k = Key::Char;
        Self {
            rotate: [
                Some(AxisKeys::new(k('k'), k('i'))),
                Some(AxisKeys::new(k('l'), k('j'))),
                Some(AxisKeys::new(k('u'), k('o'))),
            ],
            movement: [
                Some(AxisKeys::new(k('h'), k('f'))),
                Some(AxisKeys::new(k('r'), k('y'))),
                Some(AxisKeys::new(k('t'), k('g'))),
            ],
            // Y and Z swap keys relative to movement
            scale: [
                Some(AxisKeys::new(k('h'), k('f'))),
                Some(AxisKeys::new(k('t'), k('g'))),
                Some(AxisKeys::new(k('r'), k('y'))),
            ],
            scale_modifier: Some(k('x')),
            world_modifier: Some(k('z')),
        }
    }

    /// Arrows turn; D/A, Q/E, W/S move; Z moves in world space
    pub fn camera_default() -> Self {
        let k = Key::Char;
        Self {
            rotate: [
                Some(AxisKeys::new(Key::Down, Key::Up)),
                Some(AxisKeys::new(Key::Right, Key::Left)),
                None,
            ],
            movement: [
                Some(AxisKeys::new(k('d'), k('a'))),
                Some(AxisKeys::new(k('q'), k('e'))),
                Some(AxisKeys::new(k('w'), k('s'))),
            ],
            scale: [None; 3],
            scale_modifier: None,
            world_modifier: Some(k('z')),
        }
    }

    /// The scale modifier wins over the world modifier
    pub fn movement_mode(&self, keys: &KeyState) -> MovementMode {
        let held = |modifier: Option<Key>| modifier.is_some_and(|key| keys.is_held(key));
        if held(self.scale_modifier) {
            MovementMode::Scale
        } else if held(self.world_modifier) {
            MovementMode::World
        } else {
            MovementMode::Local
        }
    }
}

/// Apply one frame of keyboard control to a transform.
///
/// `basis` is the object's world matrix from the previous frame; local
/// movement follows its rows, so a turn made this frame only affects the
/// direction of travel from the next frame on.
pub fn update_transform(
    state: &mut TransformState,
    basis: &Matrix4<f32>,
    keys: &KeyState,
    controls: &ControlScheme,
    speeds: &ControlSpeeds,
    dt: f32,
) {
    for (axis, binding) in controls.rotate.iter().enumerate() {
        if let Some(binding) = binding {
            state.rotation[axis] += binding.direction(keys) * speeds.rotation * dt;
        }
    }

    let mode = controls.movement_mode(keys);
    let bindings = match mode {
        MovementMode::Scale => &controls.scale,
        MovementMode::Local | MovementMode::World => &controls.movement,
    };
    for (axis, binding) in bindings.iter().enumerate() {
        let Some(binding) = binding else {
            continue;
        };
        let direction = binding.direction(keys);
        if direction == 0.0 {
            continue;
        }

        match mode {
            MovementMode::Scale => {
                state.scale[axis] *= speeds.scale.powf(direction * dt);
            }
            MovementMode::World => {
                state.position[axis] += direction * speeds.movement * dt;
            }
            MovementMode::Local => {
                let local = local_axis(basis, axis);
                state.position += local * (direction * speeds.movement * dt);
            }
        }
    }
}

/// Local axis row of a world matrix. Its length carries the object's scale,
/// so larger objects travel further per second.
fn local_axis(basis: &Matrix4<f32>, axis: usize) -> Vector3<f32> {
    match axis {
        0 => math::x_axis(basis),
        1 => math::y_axis(basis),
        _ => math::z_axis(basis),
    }
}
