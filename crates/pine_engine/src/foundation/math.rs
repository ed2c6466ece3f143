//! Math utilities and types
//!
//! Provides fundamental math types for 3D and 2D game objects.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type (colors, fog parameters)
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// World-space position and orientation of an entity
///
/// Used to hand poses between the transform hierarchy and the physics scenes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World space position
    pub position: Vec3,

    /// World space rotation
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

impl Pose {
    /// Create a pose from position and rotation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Whether two poses match within floating point drift
    ///
    /// World poses of child entities go through a world to local to world
    /// round trip, so bit-exact comparison reports spurious moves.
    pub fn approx_eq(&self, other: &Self) -> bool {
        approx::relative_eq!(self.position, other.position, epsilon = POSE_EPSILON, max_relative = POSE_EPSILON)
            && self.rotation.angle_to(&other.rotation) <= POSE_EPSILON
    }

    /// Rotation around the Z axis, for 2D consumers
    pub fn angle_2d(&self) -> f32 {
        self.rotation.euler_angles().2
    }
}

/// Tolerance used by [`Pose::approx_eq`]
pub const POSE_EPSILON: f32 = 1e-4;

/// Build a TRS matrix (translation * rotation * scale)
pub fn trs_matrix(position: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(position)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Extract the translation part of an affine matrix
pub fn matrix_translation(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Convert Euler angles in degrees (XYZ) to a rotation
pub fn quat_from_euler_degrees(angles: &Vec3) -> Quat {
    Quat::from_euler_angles(
        angles.x.to_radians(),
        angles.y.to_radians(),
        angles.z.to_radians(),
    )
}

/// Convert a rotation to Euler angles in degrees (XYZ)
pub fn euler_degrees_from_quat(rotation: &Quat) -> Vec3 {
    let (roll, pitch, yaw) = rotation.euler_angles();
    Vec3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}

/// Mathematical constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Epsilon for floating point comparisons
    pub const EPSILON: f32 = 1e-6;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trs_matrix_translation() {
        let matrix = trs_matrix(
            &Vec3::new(1.0, 2.0, 3.0),
            &Quat::identity(),
            &Vec3::new(2.0, 2.0, 2.0),
        );

        assert_relative_eq!(matrix_translation(&matrix), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(matrix.m11, 2.0);
    }

    #[test]
    fn test_euler_degrees_roundtrip() {
        let angles = Vec3::new(10.0, 20.0, 30.0);
        let rotation = quat_from_euler_degrees(&angles);

        assert_relative_eq!(euler_degrees_from_quat(&rotation), angles, epsilon = 1e-3);
    }

    #[test]
    fn test_pose_angle_2d() {
        let pose = Pose::new(
            Vec3::zeros(),
            Quat::from_euler_angles(0.0, 0.0, constants::PI / 4.0),
        );

        assert_relative_eq!(pose.angle_2d(), constants::PI / 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pose_approx_eq_tolerates_drift() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_euler_angles(0.0, 0.6, 0.0));
        let drifted = Pose::new(
            pose.position + Vec3::new(1e-6, -1e-6, 0.0),
            Quat::from_euler_angles(0.0, 0.6 + 1e-6, 0.0),
        );
        let moved = Pose::new(pose.position + Vec3::new(0.0, 0.1, 0.0), pose.rotation);

        assert!(pose.approx_eq(&drifted));
        assert!(!pose.approx_eq(&moved));
    }
}
