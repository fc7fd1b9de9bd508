/// Lab3D Core Library - transform composition for the terminal lab
///
/// World, view and projection matrices built from per-object transform state,
/// keyboard-driven updates to that state, orbiting lights and a small scene
/// description format. Matrices use row vectors (`v' = v * M`) in a
/// left-handed space, so a world matrix reads `Scale * RotZ * RotX * RotY * Translate`.

pub mod camera;
pub mod control;
pub mod error;
pub mod geometry;
pub mod input;
pub mod light;
pub mod math;
pub mod projection;
pub mod scene;
pub mod scene_file;
pub mod timing;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use control::{ControlScheme, ControlSpeeds};
pub use error::{Result, SceneError};
pub use geometry::{Mesh, MeshId, Triangle, Vertex};
pub use input::{Key, KeyState};
pub use light::{Light, LightOrbit};
pub use projection::Projection;
pub use scene::{DrawCall, FrameConstants, Material, Model, RenderSink, Scene, Shading};
pub use scene_file::{load_scene, parse_scene};
pub use timing::FrameStats;
pub use transform::TransformState;
