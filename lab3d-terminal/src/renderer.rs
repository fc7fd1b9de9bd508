/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use lab3d_core::projection::project_to_screen;
use lab3d_core::scene::{DrawCall, FrameConstants, Material, RenderSink, Shading};
use lab3d_core::{math, Triangle};
use nalgebra::{Matrix4, Vector3};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 2.0;

/// ASCII renderer that rasterizes draw calls into terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    colour_buffer: Vec<Color>,
    frame: Option<FrameConstants>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            colour_buffer: vec![Color::Reset; size],
            frame: None,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Width / height of the drawing area in square units
    pub fn aspect(&self) -> f32 {
        self.width as f32 / (self.height.max(1) as f32 * CELL_ASPECT)
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.colour_buffer.fill(Color::Reset);
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Number of cells covered by something this frame
    pub fn covered(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        world: &Matrix4<f32>,
        material: &Material,
        frame: &FrameConstants,
    ) {
        let positions = triangle
            .vertices
            .map(|v| math::transform_point(&v.position, world));

        // Project vertices to screen space
        let mut screen_coords = [(0.0, 0.0, 0.0); 3];
        for (coord, position) in screen_coords.iter_mut().zip(&positions) {
            match project_to_screen(
                position,
                &frame.view_projection,
                self.width as u32,
                self.height as u32,
            ) {
                Some(projected) => *coord = projected,
                None => return, // Triangle is clipped
            }
        }

        let normal = world_normal(&positions, &triangle.vertices[0].normal, world);
        let centre = (positions[0] + positions[1] + positions[2]) / 3.0;
        let colour = shade(frame, &centre, &normal, material);

        let brightness = luminance(&colour);
        self.rasterize_triangle(&screen_coords, ramp_char(brightness), to_terminal_colour(&colour));
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, colour: Color) {
        let [v0, v1, v2] = *coords;

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                    self.colour_buffer[idx] = colour;
                }
            }
        }
    }

    /// Queue the frame, one row per line starting at the top left
    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            let mut current = None;
            for x in 0..self.width {
                let idx = y * self.width + x;
                let colour = self.colour_buffer[idx];
                if current != Some(colour) {
                    writer.queue(SetForegroundColor(colour))?;
                    current = Some(colour);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderSink for AsciiRenderer {
    fn begin_frame(&mut self, frame: &FrameConstants) {
        self.clear();
        self.frame = Some(frame.clone());
    }

    fn submit(&mut self, draw: &DrawCall<'_>) {
        let Some(frame) = self.frame.take() else {
            log::warn!("`{}` submitted outside a frame", draw.name);
            return;
        };
        for triangle in &draw.mesh.triangles {
            self.render_triangle(triangle, &draw.world, &draw.material, &frame);
        }
        self.frame = Some(frame);
    }
}

/// Face normal in world space, oriented to agree with the mesh normal
fn world_normal(positions: &[Vector3<f32>; 3], normal: &Vector3<f32>, world: &Matrix4<f32>) -> Vector3<f32> {
    let face = (positions[1] - positions[0])
        .cross(&(positions[2] - positions[0]))
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros);
    if face.dot(&math::transform_direction(normal, world)) < 0.0 {
        -face
    } else {
        face
    }
}

/// Colour of a surface point: ambient plus diffuse and specular from each
/// light, fading with distance
fn shade(
    frame: &FrameConstants,
    point: &Vector3<f32>,
    normal: &Vector3<f32>,
    material: &Material,
) -> Vector3<f32> {
    let bands = match material.shading {
        Shading::Unlit => return material.colour,
        Shading::Lit => None,
        Shading::Cell(bands) => Some(bands),
    };

    let to_camera = (frame.camera_position - point)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros);
    let mut diffuse = Vector3::zeros();
    let mut specular = Vector3::zeros();

    for light in &frame.lights {
        let offset = light.position - point;
        let distance = offset.norm();
        if distance < f32::EPSILON {
            continue;
        }
        let to_light = offset / distance;
        let intensity = light.radiance / distance;

        let lambert = normal.dot(&to_light).max(0.0);
        diffuse += intensity * bands.map_or(lambert, |b| quantize(lambert, b));

        if bands.is_none() {
            if let Some(half) = (to_light + to_camera).try_normalize(f32::EPSILON) {
                specular += intensity * normal.dot(&half).max(0.0).powf(frame.specular_power);
            }
        }
    }

    material.colour.component_mul(&(frame.ambient + diffuse)) + specular
}

/// Snap a `[0, 1]` intensity down to one of `bands` levels
fn quantize(intensity: f32, bands: u8) -> f32 {
    let bands = bands.max(2) as f32;
    ((intensity * bands).floor() / (bands - 1.0)).min(1.0)
}

fn luminance(colour: &Vector3<f32>) -> f32 {
    (0.2126 * colour.x + 0.7152 * colour.y + 0.0722 * colour.z).clamp(0.0, 1.0)
}

/// Ramp character for a brightness; anything drawn stays visible
fn ramp_char(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = 1 + (brightness.clamp(0.0, 1.0) * (last - 1) as f32).round() as usize;
    LUMINOSITY_RAMP[index.min(last)]
}

fn to_terminal_colour(colour: &Vector3<f32>) -> Color {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(colour.x),
        g: channel(colour.y),
        b: channel(colour.z),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab3d_core::scene::LightConstants;
    use lab3d_core::{Camera, Mesh, Model, Projection, Scene, TransformState};

    fn frame_looking_at_origin() -> FrameConstants {
        let camera = Camera::new(
            Vector3::new(0.0, 0.0, -5.0),
            Vector3::zeros(),
            Projection::default().with_viewport(1, 1),
        );
        FrameConstants {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            view_projection: camera.view_projection_matrix(),
            camera_position: camera.position(),
            ambient: Vector3::repeat(0.1),
            specular_power: 16.0,
            lights: vec![LightConstants {
                position: Vector3::new(0.0, 0.0, -5.0),
                radiance: Vector3::repeat(5.0),
            }],
        }
    }

    #[test]
    fn test_cube_covers_centre() {
        let mut renderer = AsciiRenderer::new(40, 40);
        let cube = Mesh::cube(2.0);
        renderer.begin_frame(&frame_looking_at_origin());
        renderer.submit(&DrawCall {
            name: "cube",
            mesh: &cube,
            world: Matrix4::identity(),
            material: Material::default(),
        });

        assert_ne!(renderer.char_at(20, 20), Some(' '));
        assert_eq!(renderer.char_at(0, 0), Some(' '));
        assert!(renderer.covered() > 0);
    }

    #[test]
    fn test_nearer_surface_wins() {
        let mut renderer = AsciiRenderer::new(40, 40);
        let quad = Mesh::cube(2.0);
        let frame = frame_looking_at_origin();
        renderer.begin_frame(&frame);

        let near = Material {
            colour: Vector3::new(1.0, 0.0, 0.0),
            shading: Shading::Unlit,
        };
        let far = Material {
            colour: Vector3::new(0.0, 0.0, 1.0),
            shading: Shading::Unlit,
        };
        renderer.submit(&DrawCall {
            name: "near",
            mesh: &quad,
            world: Matrix4::identity(),
            material: near,
        });
        renderer.submit(&DrawCall {
            name: "far",
            mesh: &quad,
            world: math::translation(&Vector3::new(0.0, 0.0, 10.0)),
            material: far,
        });

        let idx = 20 * renderer.width() + 20;
        assert_eq!(renderer.colour_buffer[idx], Color::Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn test_submit_outside_frame_is_ignored() {
        let mut renderer = AsciiRenderer::new(10, 10);
        let cube = Mesh::cube(2.0);
        renderer.submit(&DrawCall {
            name: "cube",
            mesh: &cube,
            world: Matrix4::identity(),
            material: Material::default(),
        });
        assert_eq!(renderer.covered(), 0);
    }

    #[test]
    fn test_shading_modes() {
        let frame = frame_looking_at_origin();
        let point = Vector3::new(0.0, 0.0, -1.0);
        let facing = Vector3::new(0.0, 0.0, -1.0);
        let away = Vector3::new(0.0, 0.0, 1.0);
        let white = Vector3::repeat(1.0);

        let lit = Material {
            colour: white,
            shading: Shading::Lit,
        };
        assert!(luminance(&shade(&frame, &point, &facing, &lit)) > 0.9);
        let dark = shade(&frame, &point, &away, &lit);
        assert!((dark - Vector3::repeat(0.1)).norm() < 1e-5);

        let unlit = Material {
            colour: Vector3::new(0.2, 0.4, 0.6),
            shading: Shading::Unlit,
        };
        assert_eq!(shade(&frame, &point, &away, &unlit), unlit.colour);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0, 4), 0.0);
        assert_eq!(quantize(0.3, 4), 1.0 / 3.0);
        assert_eq!(quantize(0.99, 4), 1.0);
        assert_eq!(quantize(1.0, 4), 1.0);
    }

    #[test]
    fn test_ramp_char() {
        assert_eq!(ramp_char(0.0), '.');
        assert_eq!(ramp_char(1.0), '@');
        assert_eq!(ramp_char(7.0), '@');
    }

    #[test]
    fn test_renders_scene() {
        let mut scene = Scene::new(Camera::new(
            Vector3::new(0.0, 0.0, -6.0),
            Vector3::zeros(),
            Projection::default(),
        ));
        let cube = scene.add_mesh(Mesh::cube(2.0));
        scene
            .add_model(Model::new("cube", cube, TransformState::identity()))
            .unwrap();

        let mut renderer = AsciiRenderer::new(60, 30);
        scene.camera.projection.aspect = renderer.aspect();
        scene.render(&mut renderer);

        assert_ne!(renderer.char_at(30, 15), Some(' '));
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
