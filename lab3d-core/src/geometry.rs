/// Geometry primitives for 3D rendering
use nalgebra::Vector3;

/// Most cells a grid side may be split into
pub const MAX_GRID_DIVISIONS: u32 = 1024;

/// Index of a mesh in a scene's mesh list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Face normal from the vertex positions (zero for a degenerate face)
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.vertices.map(|v| v.position);
        (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a flat quad as two triangles sharing the `a`-`c` diagonal
    pub fn add_quad(
        &mut self,
        [a, b, c, d]: [Vector3<f32>; 4],
        normal: Vector3<f32>,
    ) {
        let v = |p| Vertex::new(p, normal);
        self.add_triangle(Triangle::new(v(a), v(b), v(c)));
        self.add_triangle(Triangle::new(v(a), v(c), v(d)));
    }

    /// Axis-aligned cube centred on the origin
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        for axis in 0..3 {
            for sign in [1.0f32, -1.0] {
                let mut normal = Vector3::zeros();
                normal[axis] = sign;
                // Two edge directions spanning the face
                let mut u = Vector3::zeros();
                u[(axis + 1) % 3] = half;
                let mut w = Vector3::zeros();
                w[(axis + 2) % 3] = half * sign;

                let centre = normal * half;
                mesh.add_quad(
                    [
                        centre - u - w,
                        centre + u - w,
                        centre + u + w,
                        centre - u + w,
                    ],
                    normal,
                );
            }
        }

        mesh
    }

    /// Flat square in the XZ plane, split into `divisions` x `divisions` cells.
    /// Divisions are clamped to `1..=MAX_GRID_DIVISIONS`.
    pub fn grid(size: f32, divisions: u32) -> Self {
        let divisions = divisions.clamp(1, MAX_GRID_DIVISIONS);
        let cell = size / divisions as f32;
        let start = -size / 2.0;
        let up = Vector3::y();
        let side = divisions as usize;
        let capacity = side
            .checked_mul(side)
            .and_then(|cells| cells.checked_mul(2))
            .unwrap_or(0);
        let mut mesh = Self::with_capacity(capacity);

        for row in 0..divisions {
            for col in 0..divisions {
                let x0 = start + col as f32 * cell;
                let z0 = start + row as f32 * cell;
                let (x1, z1) = (x0 + cell, z0 + cell);
                mesh.add_quad(
                    [
                        Vector3::new(x0, 0.0, z0),
                        Vector3::new(x0, 0.0, z1),
                        Vector3::new(x1, 0.0, z1),
                        Vector3::new(x1, 0.0, z0),
                    ],
                    up,
                );
            }
        }

        mesh
    }

    /// Octahedron used to show where a light is
    pub fn marker(size: f32) -> Self {
        let r = size / 2.0;
        let tips = [Vector3::new(0.0, r, 0.0), Vector3::new(0.0, -r, 0.0)];
        let ring = [
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, 0.0, r),
            Vector3::new(-r, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -r),
        ];
        let mut mesh = Self::with_capacity(8);

        for tip in tips {
            for i in 0..ring.len() {
                let (a, b) = (ring[i], ring[(i + 1) % ring.len()]);
                let normal = (tip + a + b).normalize();
                mesh.add_triangle(Triangle::new(
                    Vertex::new(tip, normal),
                    Vertex::new(a, normal),
                    Vertex::new(b, normal),
                ));
            }
        }

        mesh
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.triangles.len(), 12);
        for triangle in &cube.triangles {
            for vertex in &triangle.vertices {
                // Every corner sits on the unit cube and on its face plane
                assert!((vertex.position.amax() - 1.0).abs() < 1e-6);
                assert!((vertex.position.dot(&vertex.normal) - 1.0).abs() < 1e-6);
            }
            let face = triangle.calculate_normal();
            assert!((face.abs() - triangle.vertices[0].normal.abs()).norm() < 1e-6);
        }
    }

    #[test]
    fn test_grid_size() {
        let grid = Mesh::grid(10.0, 4);
        assert_eq!(grid.triangles.len(), 32);
        let max_x = grid
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter())
            .map(|v| v.position.x)
            .fold(f32::MIN, f32::max);
        assert!((max_x - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_grid_zero_divisions() {
        assert_eq!(Mesh::grid(1.0, 0).triangles.len(), 2);
    }

    #[test]
    fn test_marker() {
        let marker = Mesh::marker(1.0);
        assert_eq!(marker.triangles.len(), 8);
        assert!(!marker.is_empty());
    }

    #[test]
    fn test_degenerate_normal() {
        let v = Vertex::new(Vector3::zeros(), Vector3::y());
        assert_eq!(Triangle::new(v, v, v).calculate_normal(), Vector3::zeros());
    }
}
