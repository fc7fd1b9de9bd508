/// Row-vector matrix helpers
///
/// Points are row vectors multiplied on the left (`v * M`), so a product such
/// as `scale * rotation * translation` applies left to right. The first three
/// rows of an affine matrix are its local X, Y and Z axes and the bottom row
/// holds the translation. Rotations are left-handed.
use nalgebra::{Matrix3, Matrix4, RowVector4, Vector3, Vector4};

/// Create a (possibly non-uniform) scale matrix
pub fn scaling(scale: &Vector3<f32>) -> Matrix4<f32> {
    Matrix4::new_nonuniform_scaling(scale)
}

/// Rotation around the X axis (radians)
#[rustfmt::skip]
pub fn rotation_x(angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0,   c,   s, 0.0,
        0.0,  -s,   c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Rotation around the Y axis (radians)
#[rustfmt::skip]
pub fn rotation_y(angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    Matrix4::new(
          c, 0.0,  -s, 0.0,
        0.0, 1.0, 0.0, 0.0,
          s, 0.0,   c, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Rotation around the Z axis (radians)
#[rustfmt::skip]
pub fn rotation_z(angle: f32) -> Matrix4<f32> {
    let (s, c) = angle.sin_cos();
    Matrix4::new(
          c,   s, 0.0, 0.0,
         -s,   c, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Translation matrix, offset stored in the bottom row
pub fn translation(offset: &Vector3<f32>) -> Matrix4<f32> {
    let mut m = Matrix4::identity();
    m[(3, 0)] = offset.x;
    m[(3, 1)] = offset.y;
    m[(3, 2)] = offset.z;
    m
}

/// Inverse of a rotation + translation matrix.
///
/// The upper 3x3 block must be orthonormal (no scale or skew), which lets the
/// inverse be built from its transpose instead of a general inversion.
pub fn inverse_affine(m: &Matrix4<f32>) -> Matrix4<f32> {
    let rotation: Matrix3<f32> = m.fixed_view::<3, 3>(0, 0).transpose();
    let offset = position(m).transpose() * rotation;

    let mut inverse = Matrix4::identity();
    inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
    inverse[(3, 0)] = -offset[0];
    inverse[(3, 1)] = -offset[1];
    inverse[(3, 2)] = -offset[2];
    inverse
}

/// Local X axis (row 0)
pub fn x_axis(m: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(m[(0, 0)], m[(0, 1)], m[(0, 2)])
}

/// Local Y axis (row 1)
pub fn y_axis(m: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(m[(1, 0)], m[(1, 1)], m[(1, 2)])
}

/// Local Z axis (row 2)
pub fn z_axis(m: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(m[(2, 0)], m[(2, 1)], m[(2, 2)])
}

/// Translation (row 3)
pub fn position(m: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(m[(3, 0)], m[(3, 1)], m[(3, 2)])
}

/// Transform a point (w = 1) without a perspective divide
pub fn transform_point(point: &Vector3<f32>, m: &Matrix4<f32>) -> Vector3<f32> {
    transform_homogeneous(point, m).xyz()
}

/// Transform a direction (w = 0), ignoring translation
pub fn transform_direction(direction: &Vector3<f32>, m: &Matrix4<f32>) -> Vector3<f32> {
    let row = RowVector4::new(direction.x, direction.y, direction.z, 0.0) * m;
    Vector3::new(row[0], row[1], row[2])
}

/// Transform a point into homogeneous coordinates, e.g. into clip space
pub fn transform_homogeneous(point: &Vector3<f32>, m: &Matrix4<f32>) -> Vector4<f32> {
    (RowVector4::new(point.x, point.y, point.z, 1.0) * m).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec_eq(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).norm() < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_rotation_y_turns_x_to_negative_z() {
        let v = transform_direction(&Vector3::x(), &rotation_y(FRAC_PI_2));
        assert_vec_eq(v, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_rotation_x_turns_y_to_z() {
        let v = transform_direction(&Vector3::y(), &rotation_x(FRAC_PI_2));
        assert_vec_eq(v, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_rotation_z_turns_x_to_y() {
        let v = transform_direction(&Vector3::x(), &rotation_z(FRAC_PI_2));
        assert_vec_eq(v, Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_translation_lives_in_bottom_row() {
        let m = translation(&Vector3::new(1.0, 2.0, 3.0));
        assert_vec_eq(position(&m), Vector3::new(1.0, 2.0, 3.0));
        assert_vec_eq(
            transform_point(&Vector3::zeros(), &m),
            Vector3::new(1.0, 2.0, 3.0),
        );
        // Directions ignore translation
        assert_vec_eq(transform_direction(&Vector3::x(), &m), Vector3::x());
    }

    #[test]
    fn test_inverse_affine() {
        let m = rotation_z(0.4) * rotation_x(-1.1) * rotation_y(2.3)
            * translation(&Vector3::new(5.0, -3.0, 12.0));
        let product = m * inverse_affine(&m);
        assert!((product - Matrix4::identity()).norm() < 1e-5);
    }

    #[test]
    fn test_axes_are_rows() {
        let m = rotation_y(FRAC_PI_2);
        assert_vec_eq(x_axis(&m), Vector3::new(0.0, 0.0, -1.0));
        assert_vec_eq(y_axis(&m), Vector3::y());
        assert_vec_eq(z_axis(&m), Vector3::new(1.0, 0.0, 0.0));
    }
}
