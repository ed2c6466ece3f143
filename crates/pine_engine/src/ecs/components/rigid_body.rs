//! Rigid body components
//!
//! A rigid body lazily creates its physics body on the first pre-physics
//! update, taking its shape from the sibling collider. Before each step it
//! teleports the body when the transform was moved by something other than
//! physics; after each step dynamic bodies write their pose back.

use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::math::{Pose, Quat, Vec3};
use crate::foundation::serialization;
use crate::physics::{Body2D, Body3D, BodyHandle, BodyKind, PhysicsContext};
use crate::services::Services;

/// Simulated 3D body
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    base: ComponentBase,
    body_type: BodyKind,
    mass: f32,
    gravity_enabled: bool,
    rotation_lock: [bool; 3],
    body: Option<BodyHandle>,
    synced_pose: Option<Pose>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::RigidBody),
            body_type: BodyKind::Dynamic,
            mass: 1.0,
            gravity_enabled: true,
            rotation_lock: [false; 3],
            body: None,
            synced_pose: None,
        }
    }
}

impl RigidBody {
    /// Simulation mode
    pub const fn body_type(&self) -> BodyKind {
        self.body_type
    }

    /// Set the simulation mode
    pub fn set_body_type(&mut self, body_type: BodyKind) {
        self.body_type = body_type;
    }

    /// Mass in kilograms
    pub const fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the mass
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
    }

    /// Whether scene gravity applies
    pub const fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Enable or disable gravity
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    /// Per-axis rotation locks (X, Y, Z)
    pub const fn rotation_lock(&self) -> [bool; 3] {
        self.rotation_lock
    }

    /// Set per-axis rotation locks
    pub fn set_rotation_lock(&mut self, lock: [bool; 3]) {
        self.rotation_lock = lock;
    }

    /// Handle of the physics body, `None` until the first physics step
    pub const fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    fn apply_settings(&self, body: &mut Body3D) {
        body.kind = self.body_type;
        body.mass = self.mass;
        body.gravity_enabled = self.gravity_enabled;
    }
}

impl Component for RigidBody {
    component_base!();

    fn on_destroyed(&mut self, services: &Services) -> Result<(), EcsError> {
        let Some(body) = self.body.take() else {
            return Ok(());
        };

        let mut scene = services.physics.try_borrow_mut().map_err(|error| EcsError::ResourceRelease {
            resource: "rigid body".to_string(),
            reason: error.to_string(),
        })?;
        scene.remove(body);
        Ok(())
    }

    fn on_copied(&mut self) {
        self.body = None;
        self.synced_pose = None;
    }

    fn on_pre_physics_update(&mut self, physics: &mut PhysicsContext<'_>) {
        let pose = physics.pose;

        if let Some(body) = self.body.and_then(|handle| physics.scene.body_mut(handle)) {
            self.apply_settings(body);
            body.shape = physics.shape;

            if !self.synced_pose.is_some_and(|synced| synced.approx_eq(&pose)) {
                body.position = pose.position;
                body.rotation = pose.rotation;
                if self.body_type == BodyKind::Dynamic {
                    body.linear_velocity = Vec3::zeros();
                }
            }
        } else {
            let mut body = Body3D {
                position: pose.position,
                rotation: pose.rotation,
                shape: physics.shape,
                ..Body3D::default()
            };
            self.apply_settings(&mut body);
            self.body = Some(physics.scene.add(body));
        }

        self.synced_pose = Some(pose);
    }

    fn on_post_physics_update(&mut self, physics: &mut PhysicsContext<'_>) {
        if self.body_type != BodyKind::Dynamic {
            return;
        }

        let Some(body) = self.body.and_then(|handle| physics.scene.body(handle)) else {
            return;
        };

        let mut rotation = body.rotation;
        if self.rotation_lock.iter().all(|&locked| locked) {
            rotation = physics.pose.rotation;
        }

        let pose = Pose::new(body.position, rotation);
        physics.pose = pose;
        physics.pose_changed = true;
        self.synced_pose = Some(pose);
    }

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "type", &mut self.body_type)?;
        serialization::load(data, "mass", &mut self.mass)?;
        serialization::load(data, "gravity", &mut self.gravity_enabled)?;
        serialization::load(data, "rotation_lock", &mut self.rotation_lock)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "type", &self.body_type)?;
        serialization::store(data, "mass", &self.mass)?;
        serialization::store(data, "gravity", &self.gravity_enabled)?;
        serialization::store(data, "rotation_lock", &self.rotation_lock)?;
        Ok(())
    }
}

impl ComponentKind for RigidBody {
    const TYPE: ComponentType = ComponentType::RigidBody;
}

/// Simulated 2D body
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody2D {
    base: ComponentBase,
    body_type: BodyKind,
    gravity_enabled: bool,
    body: Option<BodyHandle>,
    synced_pose: Option<Pose>,
}

impl Default for RigidBody2D {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::RigidBody2D),
            body_type: BodyKind::Dynamic,
            gravity_enabled: true,
            body: None,
            synced_pose: None,
        }
    }
}

impl RigidBody2D {
    /// Simulation mode
    pub const fn body_type(&self) -> BodyKind {
        self.body_type
    }

    /// Set the simulation mode
    pub fn set_body_type(&mut self, body_type: BodyKind) {
        self.body_type = body_type;
    }

    /// Whether scene gravity applies
    pub const fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Enable or disable gravity
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    /// Handle of the physics body, `None` until the first physics step
    pub const fn body(&self) -> Option<BodyHandle> {
        self.body
    }
}

impl Component for RigidBody2D {
    component_base!();

    fn on_destroyed(&mut self, services: &Services) -> Result<(), EcsError> {
        let Some(body) = self.body.take() else {
            return Ok(());
        };

        let mut scene = services.physics_2d.try_borrow_mut().map_err(|error| EcsError::ResourceRelease {
            resource: "2D rigid body".to_string(),
            reason: error.to_string(),
        })?;
        scene.remove(body);
        Ok(())
    }

    fn on_copied(&mut self) {
        self.body = None;
        self.synced_pose = None;
    }

    fn on_pre_physics_update(&mut self, physics: &mut PhysicsContext<'_>) {
        let pose = physics.pose;
        let position = pose.position.xy();
        let angle = pose.angle_2d();

        if let Some(body) = self.body.and_then(|handle| physics.scene_2d.body_mut(handle)) {
            body.kind = self.body_type;
            body.gravity_enabled = self.gravity_enabled;
            body.shape = physics.shape_2d;

            if !self.synced_pose.is_some_and(|synced| synced.approx_eq(&pose)) {
                body.position = position;
                body.angle = angle;
            }
        } else {
            self.body = Some(physics.scene_2d.add(Body2D {
                kind: self.body_type,
                position,
                angle,
                gravity_enabled: self.gravity_enabled,
                shape: physics.shape_2d,
                ..Body2D::default()
            }));
        }

        self.synced_pose = Some(pose);
    }

    fn on_post_physics_update(&mut self, physics: &mut PhysicsContext<'_>) {
        if self.body_type != BodyKind::Dynamic {
            return;
        }

        let Some(body) = self.body.and_then(|handle| physics.scene_2d.body(handle)) else {
            return;
        };

        let position = Vec3::new(body.position.x, body.position.y, physics.pose.position.z);
        let pose = Pose::new(position, Quat::from_euler_angles(0.0, 0.0, body.angle));
        physics.pose = pose;
        physics.pose_changed = true;
        self.synced_pose = Some(pose);
    }

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "type", &mut self.body_type)?;
        serialization::load(data, "gravity", &mut self.gravity_enabled)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "type", &self.body_type)?;
        serialization::store(data, "gravity", &self.gravity_enabled)?;
        Ok(())
    }
}

impl ComponentKind for RigidBody2D {
    const TYPE: ComponentType = ComponentType::RigidBody2D;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{PhysicsScene2D, PhysicsScene3D};
    use approx::assert_relative_eq;

    #[test]
    fn test_body_created_on_first_pre_update() {
        let mut scene = PhysicsScene3D::default();
        let mut scene_2d = PhysicsScene2D::default();
        let mut rigid_body = RigidBody::default();

        let mut context = PhysicsContext {
            pose: Pose::new(Vec3::new(0.0, 5.0, 0.0), Quat::identity()),
            pose_changed: false,
            has_rigid_body: true,
            shape: None,
            shape_2d: None,
            scene: &mut scene,
            scene_2d: &mut scene_2d,
        };
        rigid_body.on_pre_physics_update(&mut context);

        let handle = rigid_body.body().unwrap();
        assert_relative_eq!(scene.body(handle).unwrap().position.y, 5.0);
    }

    #[test]
    fn test_post_update_writes_pose() {
        let mut scene = PhysicsScene3D::new(Vec3::new(0.0, -10.0, 0.0));
        let mut scene_2d = PhysicsScene2D::default();
        let mut rigid_body = RigidBody::default();

        let mut context = PhysicsContext {
            pose: Pose::default(),
            pose_changed: false,
            has_rigid_body: true,
            shape: None,
            shape_2d: None,
            scene: &mut scene,
            scene_2d: &mut scene_2d,
        };
        rigid_body.on_pre_physics_update(&mut context);
        context.scene.step(1.0);
        rigid_body.on_post_physics_update(&mut context);

        assert!(context.pose_changed);
        assert_relative_eq!(context.pose.position.y, -10.0);
    }

    #[test]
    fn test_copy_resets_body_handle() {
        let mut rigid_body = RigidBody::default();
        rigid_body.body = Some(BodyHandle::default());
        rigid_body.set_mass(4.0);

        let mut data = Value::Null;
        rigid_body.save_data(&mut data).unwrap();
        let mut copy = RigidBody::default();
        copy.body = rigid_body.body;
        copy.load_data(&data).unwrap();
        copy.on_copied();

        assert_eq!(copy.body(), None);
        assert_relative_eq!(copy.mass(), 4.0);
    }
}
