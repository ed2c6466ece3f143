//! Transform component

use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::math::{self, Mat4, Quat, Vec3};
use crate::foundation::serialization;

/// Local position, rotation and scale of an entity
///
/// The cached transformation matrix is the entity's world matrix; it is
/// refreshed by `World::update_transforms` before every render and after a
/// level load.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    base: ComponentBase,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    transformation_matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::Transform),
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            transformation_matrix: Mat4::identity(),
        }
    }
}

impl Transform {
    /// Local position
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Set local position
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Local rotation
    pub const fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Set local rotation
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Local scale
    pub const fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Set local scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Local rotation as XYZ Euler angles in degrees
    pub fn euler_angles(&self) -> Vec3 {
        math::euler_degrees_from_quat(&self.rotation)
    }

    /// Set local rotation from XYZ Euler angles in degrees
    pub fn set_euler_angles(&mut self, angles: &Vec3) {
        self.rotation = math::quat_from_euler_degrees(angles);
    }

    /// Move by `offset` in parent space
    pub fn translate(&mut self, offset: &Vec3) {
        self.position += offset;
    }

    /// Apply `delta` on top of the current rotation
    pub fn rotate(&mut self, delta: &Quat) {
        self.rotation = delta * self.rotation;
    }

    /// Local TRS matrix
    pub fn local_matrix(&self) -> Mat4 {
        math::trs_matrix(&self.position, &self.rotation, &self.scale)
    }

    /// Cached world matrix
    pub const fn transformation_matrix(&self) -> &Mat4 {
        &self.transformation_matrix
    }

    pub(crate) fn set_transformation_matrix(&mut self, matrix: Mat4) {
        self.transformation_matrix = matrix;
    }

    /// World position taken from the cached world matrix
    pub fn world_position(&self) -> Vec3 {
        math::matrix_translation(&self.transformation_matrix)
    }

    /// Local +Z axis
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::z()
    }

    /// Local +X axis
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::x()
    }

    /// Local +Y axis
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::y()
    }
}

impl Component for Transform {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load_vec3(data, "pos", &mut self.position)?;
        serialization::load_quat(data, "rot", &mut self.rotation)?;
        serialization::load_vec3(data, "scl", &mut self.scale)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store_vec3(data, "pos", &self.position)?;
        serialization::store_quat(data, "rot", &self.rotation)?;
        serialization::store_vec3(data, "scl", &self.scale)?;
        Ok(())
    }
}

impl ComponentKind for Transform {
    const TYPE: ComponentType = ComponentType::Transform;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_identity() {
        let transform = Transform::default();

        assert_eq!(transform.scale(), Vec3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(transform.local_matrix(), Mat4::identity());
    }

    #[test]
    fn test_axes_follow_rotation() {
        let mut transform = Transform::default();
        transform.set_euler_angles(&Vec3::new(0.0, 90.0, 0.0));

        assert_relative_eq!(transform.forward(), Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(transform.up(), Vec3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_data_roundtrip() {
        let mut source = Transform::default();
        source.set_position(Vec3::new(1.0, 2.0, 3.0));
        source.set_euler_angles(&Vec3::new(0.0, 0.0, 45.0));
        source.set_scale(Vec3::new(2.0, 2.0, 2.0));

        let mut data = Value::Null;
        source.save_data(&mut data).unwrap();

        let mut loaded = Transform::default();
        loaded.load_data(&data).unwrap();

        assert_relative_eq!(loaded.position(), source.position());
        assert_relative_eq!(loaded.rotation(), source.rotation(), epsilon = 1e-6);
        assert_relative_eq!(loaded.scale(), source.scale());
    }
}
