/// Point lights and the orbit helper that circles them around a model
use std::f32::consts::TAU;

use nalgebra::Vector3;

/// Default orbit radius in world units
pub const ORBIT_RADIUS: f32 = 20.0;
/// Default orbit speed in radians per second
pub const ORBIT_SPEED: f32 = 0.7;

/// Circular motion around a target point. The angle decreases over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightOrbit {
    pub radius: f32,
    /// Offset above (or below) the target
    pub height: f32,
    pub speed: f32,
    pub angle: f32,
    pub paused: bool,
}

impl LightOrbit {
    pub fn new(radius: f32, height: f32, speed: f32) -> Self {
        Self {
            radius,
            height,
            speed,
            angle: 0.0,
            paused: false,
        }
    }

    /// Offset from the target at the current angle
    pub fn offset(&self) -> Vector3<f32> {
        let (sin, cos) = self.angle.sin_cos();
        Vector3::new(cos * self.radius, self.height, sin * self.radius)
    }

    pub fn position_around(&self, target: &Vector3<f32>) -> Vector3<f32> {
        target + self.offset()
    }

    /// Step the angle by `-speed * dt`, kept within `[0, 2π)`
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let angle = (self.angle - self.speed * dt).rem_euclid(TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        self.angle = if angle >= TAU { 0.0 } else { angle };
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

impl Default for LightOrbit {
    fn default() -> Self {
        Self::new(ORBIT_RADIUS, 0.0, ORBIT_SPEED)
    }
}

/// A point light. Strength scales both its brightness and its marker size.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub colour: Vector3<f32>,
    pub strength: f32,
    pub position: Vector3<f32>,
    /// Euler rotation; orbiting lights turn their +Z toward the target
    pub facing: Vector3<f32>,
    /// Model index to circle, with the orbit parameters
    pub orbit: Option<(usize, LightOrbit)>,
}

impl Light {
    pub fn new(name: impl Into<String>, colour: Vector3<f32>, strength: f32) -> Self {
        Self {
            name: name.into(),
            colour,
            strength,
            position: Vector3::zeros(),
            facing: Vector3::zeros(),
            orbit: None,
        }
    }

    pub fn at(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn orbiting(mut self, target: usize, orbit: LightOrbit) -> Self {
        self.orbit = Some((target, orbit));
        self
    }

    /// Colour multiplied by strength, as sent to shading
    pub fn radiance(&self) -> Vector3<f32> {
        self.colour * self.strength
    }

    /// Size of the light's marker model: `strength^0.7`
    pub fn marker_scale(&self) -> f32 {
        self.strength.max(0.0).powf(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_is_periodic() {
        let mut orbit = LightOrbit::new(20.0, 10.0, 1.0);
        let target = Vector3::new(0.0, 3.0, 0.0);
        let start = orbit.position_around(&target);
        assert!((start - Vector3::new(20.0, 13.0, 0.0)).norm() < 1e-5);

        orbit.angle = TAU;
        let full_turn = orbit.position_around(&target);
        assert!((start - full_turn).norm() < 1e-4);
    }

    #[test]
    fn test_advance_wraps_angle() {
        let mut orbit = LightOrbit::new(1.0, 0.0, 1.0);
        orbit.advance(0.5);
        assert!((orbit.angle - (TAU - 0.5)).abs() < 1e-5);
        for _ in 0..1000 {
            orbit.advance(0.1);
            assert!((0.0..TAU).contains(&orbit.angle));
        }
    }

    #[test]
    fn test_quarter_turn_moves_to_negative_z() {
        let mut orbit = LightOrbit::new(2.0, 0.0, 1.0);
        orbit.advance(std::f32::consts::FRAC_PI_2);
        let p = orbit.position_around(&Vector3::zeros());
        assert!((p - Vector3::new(0.0, 0.0, -2.0)).norm() < 1e-5);
    }

    #[test]
    fn test_paused_orbit_holds_still() {
        let mut orbit = LightOrbit::default();
        orbit.toggle_pause();
        orbit.advance(3.0);
        assert_eq!(orbit.angle, 0.0);
        orbit.toggle_pause();
        orbit.advance(1.0);
        assert!(orbit.angle > 0.0);
    }

    #[test]
    fn test_marker_scale() {
        let light = Light::new("key", Vector3::new(1.0, 1.0, 1.0), 10.0);
        assert!((light.marker_scale() - 10f32.powf(0.7)).abs() < 1e-5);
        assert!((light.radiance() - Vector3::repeat(10.0)).norm() < 1e-6);
    }
}
