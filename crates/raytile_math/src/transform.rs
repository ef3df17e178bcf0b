// Transform utilities for Mat4
//
// Extends glam::Mat4 with the helpers the renderer needs for placing
// primitives and lights in the world.

use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// World-space position encoded in the matrix (its translation column).
    fn position(&self) -> Vec3;

    /// Inverse-transpose of the upper 3x3, for transforming normals.
    fn normal_matrix(&self) -> Mat3;
}

impl Mat4Ext for Mat4 {
    fn position(&self) -> Vec3 {
        self.w_axis.truncate()
    }

    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(mat.position(), Vec3::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_normal_matrix_rotation() {
        use std::f32::consts::PI;

        // 90 degree rotation around Z axis
        let mat = Mat4::from_rotation_z(PI / 2.0);
        let n = mat.normal_matrix() * Vec3::X;

        assert!((n - Vec3::Y).length() < 0.001);
    }

    #[test]
    fn test_normal_matrix_non_uniform_scale() {
        // Normals of a box squashed along Y must stay perpendicular to its faces.
        let mat = Mat4::from_scale(Vec3::new(1.0, 0.1, 1.0));
        let n = (mat.normal_matrix() * Vec3::new(1.0, 1.0, 0.0)).normalize();

        assert!(n.y > n.x);
    }

    #[test]
    fn test_mat4_inverse_round_trip() {
        let mat = Mat4::from_rotation_y(0.5) * Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let point = Vec3::new(5.0, 3.0, 2.0);
        let back = mat.inverse().transform_point3(mat.transform_point3(point));

        assert!((back - point).length() < 0.001);
    }
}
