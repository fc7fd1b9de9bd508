/// A data-driven scene: meshes, models, lights and a camera, advanced once per
/// frame and handed to a renderer as draw calls.
use nalgebra::{Matrix4, Vector3};

use crate::camera::Camera;
use crate::control::{ControlScheme, ControlSpeeds};
use crate::error::{Result, SceneError};
use crate::geometry::{Mesh, MeshId};
use crate::input::{Key, KeyState};
use crate::light::{Light, LightOrbit};
use crate::math;
use crate::projection::Projection;
use crate::transform::TransformState;

/// How a renderer should shade a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shading {
    /// Ambient + diffuse + specular from the scene lights
    Lit,
    /// Lit, then quantized into this many bands
    Cell(u8),
    /// Flat colour, ignores lights
    Unlit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub colour: Vector3<f32>,
    pub shading: Shading,
}

impl Material {
    pub fn lit(colour: Vector3<f32>) -> Self {
        Self {
            colour,
            shading: Shading::Lit,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::lit(Vector3::repeat(1.0))
    }
}

/// An instance of a mesh placed in the world
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub mesh: MeshId,
    pub transform: TransformState,
    pub material: Material,
    previous_world: Matrix4<f32>,
}

impl Model {
    pub fn new(name: impl Into<String>, mesh: MeshId, transform: TransformState) -> Self {
        Self {
            name: name.into(),
            mesh,
            previous_world: transform.world_matrix(),
            transform,
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.transform.position
    }

    /// World matrix for the current state
    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.transform.world_matrix()
    }

    /// Apply one frame of keyboard control, moving along last frame's axes
    pub fn control(
        &mut self,
        keys: &KeyState,
        controls: &ControlScheme,
        speeds: &ControlSpeeds,
        dt: f32,
    ) {
        crate::control::update_transform(
            &mut self.transform,
            &self.previous_world,
            keys,
            controls,
            speeds,
            dt,
        );
        self.previous_world = self.world_matrix();
    }

    /// Resynchronise the movement basis after the transform was edited directly
    pub fn refresh(&mut self) {
        self.previous_world = self.world_matrix();
    }
}

/// Per-light data handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightConstants {
    pub position: Vector3<f32>,
    /// Colour times strength
    pub radiance: Vector3<f32>,
}

/// Everything a renderer needs once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConstants {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub view_projection: Matrix4<f32>,
    pub camera_position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub specular_power: f32,
    pub lights: Vec<LightConstants>,
}

/// One object to draw
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub name: &'a str,
    pub mesh: &'a Mesh,
    pub world: Matrix4<f32>,
    pub material: Material,
}

/// Anything that can draw a frame of the scene
pub trait RenderSink {
    fn begin_frame(&mut self, frame: &FrameConstants);
    fn submit(&mut self, draw: &DrawCall<'_>);
}

/// Keys acted on once per press rather than while held
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneKeys {
    /// Move control to the next model
    pub cycle_model: Key,
    /// Pause or resume every light orbit
    pub toggle_orbits: Key,
}

impl Default for SceneKeys {
    fn default() -> Self {
        Self {
            cycle_model: Key::Tab,
            toggle_orbits: Key::Char('1'),
        }
    }
}

pub const AMBIENT_COLOUR: [f32; 3] = [0.3, 0.3, 0.5];
pub const SPECULAR_POWER: f32 = 256.0;

#[derive(Debug, Clone)]
pub struct Scene {
    meshes: Vec<Mesh>,
    light_marker: MeshId,
    pub models: Vec<Model>,
    pub lights: Vec<Light>,
    pub camera: Camera,
    pub model_controls: ControlScheme,
    pub camera_controls: ControlScheme,
    pub keys: SceneKeys,
    pub speeds: ControlSpeeds,
    pub ambient: Vector3<f32>,
    pub specular_power: f32,
    controlled: Option<usize>,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            meshes: vec![Mesh::marker(1.0)],
            light_marker: MeshId(0),
            models: Vec::new(),
            lights: Vec::new(),
            camera,
            model_controls: ControlScheme::model_default(),
            camera_controls: ControlScheme::camera_default(),
            keys: SceneKeys::default(),
            speeds: ControlSpeeds::default(),
            ambient: Vector3::from(AMBIENT_COLOUR),
            specular_power: SPECULAR_POWER,
            controlled: None,
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    /// Add a model, returning its index. The first model added takes control.
    pub fn add_model(&mut self, model: Model) -> Result<usize> {
        if model.mesh.0 >= self.meshes.len() {
            return Err(SceneError::MeshOutOfRange(model.mesh.0));
        }
        log::debug!("adding model `{}` at {:?}", model.name, model.position());
        self.models.push(model);
        let index = self.models.len() - 1;
        if self.controlled.is_none() {
            self.controlled = Some(index);
        }
        Ok(index)
    }

    pub fn add_light(&mut self, light: Light) -> Result<usize> {
        if let Some((target, _)) = light.orbit {
            if target >= self.models.len() {
                return Err(SceneError::ModelOutOfRange(target));
            }
        }
        log::debug!("adding light `{}`", light.name);
        self.lights.push(light);
        Ok(self.lights.len() - 1)
    }

    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name == name)
    }

    pub fn controlled(&self) -> Option<&Model> {
        self.controlled.and_then(|i| self.models.get(i))
    }

    pub fn set_controlled(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(i) = index {
            if i >= self.models.len() {
                return Err(SceneError::ModelOutOfRange(i));
            }
        }
        self.controlled = index;
        Ok(())
    }

    /// Move control to the next model, wrapping around
    pub fn cycle_controlled(&mut self) {
        if self.models.is_empty() {
            return;
        }
        let next = self.controlled.map_or(0, |i| (i + 1) % self.models.len());
        self.controlled = Some(next);
        log::info!("controlling `{}`", self.models[next].name);
    }

    /// True when there is at least one orbit and every orbit is paused
    pub fn orbits_paused(&self) -> bool {
        let mut orbits = self.lights.iter().filter_map(|l| l.orbit.as_ref()).peekable();
        orbits.peek().is_some() && orbits.all(|(_, orbit)| orbit.paused)
    }

    /// Advance the scene by one frame of `dt` seconds
    pub fn update(&mut self, keys: &KeyState, dt: f32) {
        if keys.was_hit(self.keys.cycle_model) {
            self.cycle_controlled();
        }
        if keys.was_hit(self.keys.toggle_orbits) {
            for (_, orbit) in self.lights.iter_mut().filter_map(|l| l.orbit.as_mut()) {
                orbit.toggle_pause();
            }
            log::info!("light orbits paused: {}", self.orbits_paused());
        }

        if let Some(model) = self.controlled.and_then(|i| self.models.get_mut(i)) {
            model.control(keys, &self.model_controls, &self.speeds, dt);
        }

        // Lights are placed from the current angle, then the angle moves on
        for light in &mut self.lights {
            if let Some((target, orbit)) = light.orbit.as_mut() {
                if let Some(model) = self.models.get(*target) {
                    let target_position = model.position();
                    light.position = orbit.position_around(&target_position);
                    let mut aim = TransformState::at(light.position);
                    if aim.face_target(&target_position) {
                        light.facing = aim.rotation;
                    }
                }
                orbit.advance(dt);
            }
        }

        self.camera
            .control(keys, &self.camera_controls, &self.speeds, dt);
    }

    pub fn frame_constants(&self) -> FrameConstants {
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        FrameConstants {
            view_projection: view * projection,
            view,
            projection,
            camera_position: self.camera.position(),
            ambient: self.ambient,
            specular_power: self.specular_power,
            lights: self
                .lights
                .iter()
                .map(|l| LightConstants {
                    position: l.position,
                    radiance: l.radiance(),
                })
                .collect(),
        }
    }

    /// Submit every model and light marker, world matrices built from the current state
    pub fn render(&self, sink: &mut impl RenderSink) {
        sink.begin_frame(&self.frame_constants());

        for model in &self.models {
            let Some(mesh) = self.mesh(model.mesh) else {
                log::warn!("model `{}` refers to a missing mesh", model.name);
                continue;
            };
            sink.submit(&DrawCall {
                name: &model.name,
                mesh,
                world: model.world_matrix(),
                material: model.material,
            });
        }

        if let Some(marker) = self.mesh(self.light_marker) {
            for light in &self.lights {
                let world = math::scaling(&Vector3::repeat(light.marker_scale()))
                    * TransformState::rotation_matrix(&light.facing)
                    * math::translation(&light.position);
                sink.submit(&DrawCall {
                    name: &light.name,
                    mesh: marker,
                    world,
                    material: Material {
                        colour: light.colour,
                        shading: Shading::Unlit,
                    },
                });
            }
        }
    }

    /// The cube lab: a floor, a controllable cube, a cell-shaded block and an
    /// orbiting light
    pub fn default_lab() -> Result<Self> {
        let camera = Camera::new(
            Vector3::new(0.0, 5.0, -8.0),
            Vector3::new(0.3, 0.0, 0.0),
            Projection::default(),
        );
        let mut scene = Self::new(camera);

        let cube = scene.add_mesh(Mesh::cube(2.0));
        let floor = scene.add_mesh(Mesh::grid(40.0, 20));

        let models = [
            Model::new("cube", cube, TransformState::at(Vector3::new(0.0, 3.0, 0.0)))
                .with_material(Material::lit(Vector3::new(1.0, 0.4, 0.2))),
            Model::new(
                "block",
                cube,
                TransformState::at(Vector3::new(5.0, 1.0, 4.0)).with_uniform_scale(0.8),
            )
            .with_material(Material {
                colour: Vector3::new(0.3, 0.8, 1.0),
                shading: Shading::Cell(4),
            }),
            Model::new("floor", floor, TransformState::identity())
                .with_material(Material::lit(Vector3::repeat(0.6))),
        ];
        for model in models {
            scene.add_model(model)?;
        }

        scene.add_light(
            Light::new("orbiter", Vector3::new(0.8, 0.8, 1.0), 10.0)
                .orbiting(0, LightOrbit::new(6.0, 2.0, crate::light::ORBIT_SPEED)),
        )?;
        scene.add_light(
            Light::new("sun", Vector3::new(1.0, 0.8, 0.2), 40.0)
                .at(Vector3::new(20.0, 40.0, -20.0)),
        )?;

        Ok(scene)
    }
}
