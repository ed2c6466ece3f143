//! Collider components
//!
//! A collider describes a shape. When its entity has no rigid body of the
//! same dimension the collider owns a static body in the physics scene and
//! keeps it at the entity's pose; otherwise the rigid body picks up the shape.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::math::{Vec2, Vec3};
use crate::foundation::serialization;
use crate::physics::{Body2D, Body3D, BodyHandle, BodyKind, PhysicsContext, Shape2D, Shape3D};
use crate::services::Services;

bitflags! {
    /// Collision layers used for filtering
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColliderLayers: u16 {
        /// Everything not assigned elsewhere
        const DEFAULT = 1 << 0;
        /// Player controlled objects
        const PLAYER = 1 << 1;
        /// Enemies
        const ENEMY = 1 << 2;
        /// Static level geometry
        const ENVIRONMENT = 1 << 3;
        /// Projectiles
        const PROJECTILE = 1 << 4;
        /// Volumes that only report overlaps
        const TRIGGER = 1 << 5;
    }
}

impl ColliderLayers {
    /// Whether two colliders should interact given their layers and masks
    pub const fn should_collide(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        mask_a.intersects(layer_b) && mask_b.intersects(layer_a)
    }
}

/// 3D collider shape kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColliderType {
    /// Box sized by `size`
    #[default]
    Box,
    /// Sphere with radius `radius`
    Sphere,
    /// Capsule with radius `radius` and height `height`
    Capsule,
}

/// 3D collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    base: ComponentBase,
    collider_type: ColliderType,
    offset: Vec3,
    size: Vec3,
    radius: f32,
    height: f32,
    layer: ColliderLayers,
    layer_mask: ColliderLayers,
    is_trigger: bool,
    body: Option<BodyHandle>,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::Collider),
            collider_type: ColliderType::default(),
            offset: Vec3::zeros(),
            size: Vec3::new(1.0, 1.0, 1.0),
            radius: 0.5,
            height: 1.0,
            layer: ColliderLayers::DEFAULT,
            layer_mask: ColliderLayers::all(),
            is_trigger: false,
            body: None,
        }
    }
}

impl Collider {
    /// Shape kind
    pub const fn collider_type(&self) -> ColliderType {
        self.collider_type
    }

    /// Set the shape kind
    pub fn set_collider_type(&mut self, collider_type: ColliderType) {
        self.collider_type = collider_type;
    }

    /// Offset from the entity origin
    pub const fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Set the offset from the entity origin
    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    /// Box size
    pub const fn size(&self) -> Vec3 {
        self.size
    }

    /// Set the box size
    pub fn set_size(&mut self, size: Vec3) {
        self.size = size;
    }

    /// Sphere and capsule radius
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the sphere and capsule radius
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Capsule height
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Set the capsule height
    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    /// Layer this collider lives on
    pub const fn layer(&self) -> ColliderLayers {
        self.layer
    }

    /// Layers this collider interacts with
    pub const fn layer_mask(&self) -> ColliderLayers {
        self.layer_mask
    }

    /// Set layer and mask
    pub fn set_layers(&mut self, layer: ColliderLayers, mask: ColliderLayers) {
        self.layer = layer;
        self.layer_mask = mask;
    }

    /// Whether the collider only reports overlaps
    pub const fn is_trigger(&self) -> bool {
        self.is_trigger
    }

    /// Make the collider a trigger
    pub fn set_trigger(&mut self, is_trigger: bool) {
        self.is_trigger = is_trigger;
    }

    /// Static body owned by this collider
    pub const fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Physics shape for the current settings
    pub fn shape(&self) -> Shape3D {
        match self.collider_type {
            ColliderType::Box => Shape3D::Box { half_extents: self.size * 0.5 },
            ColliderType::Sphere => Shape3D::Sphere { radius: self.radius },
            ColliderType::Capsule => Shape3D::Capsule { radius: self.radius, height: self.height },
        }
    }
}

impl Component for Collider {
    component_base!();

    fn on_destroyed(&mut self, services: &Services) -> Result<(), EcsError> {
        let Some(body) = self.body.take() else {
            return Ok(());
        };

        let mut scene = services.physics.try_borrow_mut().map_err(|error| EcsError::ResourceRelease {
            resource: "collider body".to_string(),
            reason: error.to_string(),
        })?;
        scene.remove(body);
        Ok(())
    }

    fn on_copied(&mut self) {
        self.body = None;
    }

    fn on_pre_physics_update(&mut self, physics: &mut PhysicsContext<'_>) {
        if physics.has_rigid_body {
            if let Some(body) = self.body.take() {
                physics.scene.remove(body);
            }
            return;
        }

        let position = physics.pose.position + physics.pose.rotation * self.offset;
        let rotation = physics.pose.rotation;

        if let Some(body) = self.body.and_then(|handle| physics.scene.body_mut(handle)) {
            body.position = position;
            body.rotation = rotation;
            body.shape = Some(self.shape());
            body.is_trigger = self.is_trigger;
            return;
        }

        self.body = Some(physics.scene.add(Body3D {
            kind: BodyKind::Static,
            position,
            rotation,
            shape: Some(self.shape()),
            is_trigger: self.is_trigger,
            ..Body3D::default()
        }));
    }

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        let mut layer = self.layer.bits();
        let mut mask = self.layer_mask.bits();

        serialization::load(data, "type", &mut self.collider_type)?;
        serialization::load_vec3(data, "offset", &mut self.offset)?;
        serialization::load_vec3(data, "size", &mut self.size)?;
        serialization::load(data, "radius", &mut self.radius)?;
        serialization::load(data, "height", &mut self.height)?;
        serialization::load(data, "layer", &mut layer)?;
        serialization::load(data, "layer_mask", &mut mask)?;
        serialization::load(data, "trigger", &mut self.is_trigger)?;

        self.layer = ColliderLayers::from_bits_truncate(layer);
        self.layer_mask = ColliderLayers::from_bits_truncate(mask);
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "type", &self.collider_type)?;
        serialization::store_vec3(data, "offset", &self.offset)?;
        serialization::store_vec3(data, "size", &self.size)?;
        serialization::store(data, "radius", &self.radius)?;
        serialization::store(data, "height", &self.height)?;
        serialization::store(data, "layer", &self.layer.bits())?;
        serialization::store(data, "layer_mask", &self.layer_mask.bits())?;
        serialization::store(data, "trigger", &self.is_trigger)?;
        Ok(())
    }
}

impl ComponentKind for Collider {
    const TYPE: ComponentType = ComponentType::Collider;
}

/// 2D collider shape kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Collider2DType {
    /// Box sized by `size`
    #[default]
    Box,
    /// Circle with radius `radius`
    Circle,
}

/// 2D collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct Collider2D {
    base: ComponentBase,
    collider_type: Collider2DType,
    offset: Vec2,
    size: Vec2,
    radius: f32,
    body: Option<BodyHandle>,
}

impl Default for Collider2D {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::Collider2D),
            collider_type: Collider2DType::default(),
            offset: Vec2::zeros(),
            size: Vec2::new(1.0, 1.0),
            radius: 0.5,
            body: None,
        }
    }
}

impl Collider2D {
    /// Shape kind
    pub const fn collider_type(&self) -> Collider2DType {
        self.collider_type
    }

    /// Set the shape kind
    pub fn set_collider_type(&mut self, collider_type: Collider2DType) {
        self.collider_type = collider_type;
    }

    /// Offset from the entity origin
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Set the offset from the entity origin
    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Box size
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Set the box size
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// Circle radius
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the circle radius
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    /// Static body owned by this collider
    pub const fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Physics shape for the current settings
    pub fn shape(&self) -> Shape2D {
        match self.collider_type {
            Collider2DType::Box => Shape2D::Box { half_extents: self.size * 0.5 },
            Collider2DType::Circle => Shape2D::Circle { radius: self.radius },
        }
    }
}

impl Component for Collider2D {
    component_base!();

    fn on_destroyed(&mut self, services: &Services) -> Result<(), EcsError> {
        let Some(body) = self.body.take() else {
            return Ok(());
        };

        let mut scene = services.physics_2d.try_borrow_mut().map_err(|error| EcsError::ResourceRelease {
            resource: "2D collider body".to_string(),
            reason: error.to_string(),
        })?;
        scene.remove(body);
        Ok(())
    }

    fn on_copied(&mut self) {
        self.body = None;
    }

    fn on_pre_physics_update(&mut self, physics: &mut PhysicsContext<'_>) {
        if physics.has_rigid_body {
            if let Some(body) = self.body.take() {
                physics.scene_2d.remove(body);
            }
            return;
        }

        let position = physics.pose.position.xy() + self.offset;
        let angle = physics.pose.angle_2d();

        if let Some(body) = self.body.and_then(|handle| physics.scene_2d.body_mut(handle)) {
            body.position = position;
            body.angle = angle;
            body.shape = Some(self.shape());
            return;
        }

        self.body = Some(physics.scene_2d.add(Body2D {
            kind: BodyKind::Static,
            position,
            angle,
            shape: Some(self.shape()),
            ..Body2D::default()
        }));
    }

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "type", &mut self.collider_type)?;
        serialization::load_vec2(data, "offset", &mut self.offset)?;
        serialization::load_vec2(data, "size", &mut self.size)?;
        serialization::load(data, "radius", &mut self.radius)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "type", &self.collider_type)?;
        serialization::store_vec2(data, "offset", &self.offset)?;
        serialization::store_vec2(data, "size", &self.size)?;
        serialization::store(data, "radius", &self.radius)?;
        Ok(())
    }
}

impl ComponentKind for Collider2D {
    const TYPE: ComponentType = ComponentType::Collider2D;
}
