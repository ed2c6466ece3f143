//! Camera component

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::foundation::serialization;

/// Projection used by a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraType {
    /// Perspective projection driven by the field of view
    #[default]
    Perspective,
    /// Orthographic projection driven by the ortho size
    Orthographic,
}

/// Scene camera
///
/// Projection and view matrices are rebuilt from the owning entity's world
/// matrix every rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    base: ComponentBase,
    camera_type: CameraType,
    near_plane: f32,
    far_plane: f32,
    field_of_view: f32,
    ortho_size: f32,
    clear_color: Vec4,
    aspect_ratio: f32,
    projection_matrix: Mat4,
    view_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::Camera),
            camera_type: CameraType::default(),
            near_plane: 0.01,
            far_plane: 150.0,
            field_of_view: 70.0,
            ortho_size: 10.0,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            aspect_ratio: 16.0 / 9.0,
            projection_matrix: Mat4::identity(),
            view_matrix: Mat4::identity(),
        }
    }
}

impl Camera {
    /// Projection type
    pub const fn camera_type(&self) -> CameraType {
        self.camera_type
    }

    /// Set the projection type
    pub fn set_camera_type(&mut self, camera_type: CameraType) {
        self.camera_type = camera_type;
    }

    /// Near clip plane distance
    pub const fn near_plane(&self) -> f32 {
        self.near_plane
    }

    /// Far clip plane distance
    pub const fn far_plane(&self) -> f32 {
        self.far_plane
    }

    /// Set both clip plane distances
    pub fn set_clip_planes(&mut self, near: f32, far: f32) {
        self.near_plane = near;
        self.far_plane = far;
    }

    /// Vertical field of view in degrees
    pub const fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Set the vertical field of view in degrees
    pub fn set_field_of_view(&mut self, degrees: f32) {
        self.field_of_view = degrees;
    }

    /// Half height of the orthographic view volume
    pub const fn ortho_size(&self) -> f32 {
        self.ortho_size
    }

    /// Set the orthographic size
    pub fn set_ortho_size(&mut self, size: f32) {
        self.ortho_size = size;
    }

    /// Background colour
    pub const fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Set the background colour
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    /// Viewport width over height
    pub const fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Set the viewport aspect ratio
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Projection matrix from the last rebuild
    pub const fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// View matrix from the last rebuild
    pub const fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Rebuild projection and view matrices for a camera placed at `world_matrix`
    pub fn build_matrices(&mut self, world_matrix: &Mat4) {
        self.projection_matrix = match self.camera_type {
            CameraType::Perspective => Mat4::new_perspective(
                self.aspect_ratio,
                self.field_of_view.to_radians(),
                self.near_plane,
                self.far_plane,
            ),
            CameraType::Orthographic => {
                let half_height = self.ortho_size;
                let half_width = half_height * self.aspect_ratio;
                Mat4::new_orthographic(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near_plane,
                    self.far_plane,
                )
            }
        };

        self.view_matrix = world_matrix.try_inverse().unwrap_or_else(|| {
            log::warn!("Camera world matrix is not invertible, using identity view");
            Mat4::identity()
        });
    }

    /// World-space position the view matrix was built for
    pub fn eye_position(&self) -> Vec3 {
        self.view_matrix
            .try_inverse()
            .map_or_else(Vec3::zeros, |world| Vec3::new(world.m14, world.m24, world.m34))
    }
}

impl Component for Camera {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "type", &mut self.camera_type)?;
        serialization::load(data, "near", &mut self.near_plane)?;
        serialization::load(data, "far", &mut self.far_plane)?;
        serialization::load(data, "fov", &mut self.field_of_view)?;
        serialization::load(data, "ortho_size", &mut self.ortho_size)?;
        serialization::load_vec4(data, "clear_color", &mut self.clear_color)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "type", &self.camera_type)?;
        serialization::store(data, "near", &self.near_plane)?;
        serialization::store(data, "far", &self.far_plane)?;
        serialization::store(data, "fov", &self.field_of_view)?;
        serialization::store(data, "ortho_size", &self.ortho_size)?;
        serialization::store_vec4(data, "clear_color", &self.clear_color)?;
        Ok(())
    }
}

impl ComponentKind for Camera {
    const TYPE: ComponentType = ComponentType::Camera;
}
