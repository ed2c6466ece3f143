//! Physics stepping
//!
//! [`Physics3D`] and [`Physics2D`] accumulate frame time into fixed steps.
//! Each step pushes entity poses into the physics scenes through the
//! colliders' and rigid bodies' pre-physics hooks, advances the scene, then
//! lets the post-physics hooks pull simulated poses back into transforms.

pub mod scene;

pub use scene::{Body2D, Body3D, BodyHandle, BodyKind, PhysicsScene2D, PhysicsScene3D, Shape2D, Shape3D};

use crate::ecs::components::{Collider, Collider2D};
use crate::ecs::{ComponentType, Components, Entities};
use crate::foundation::math::Pose;

/// State handed to physics hooks for one component
pub struct PhysicsContext<'a> {
    /// World pose of the owning entity; hooks may overwrite it
    pub pose: Pose,

    /// Set by a hook that changed `pose`, written back to the transform
    pub pose_changed: bool,

    /// Whether the owning entity carries a rigid body of the stepped dimension
    pub has_rigid_body: bool,

    /// Shape of the entity's 3D collider, if any
    pub shape: Option<Shape3D>,

    /// Shape of the entity's 2D collider, if any
    pub shape_2d: Option<Shape2D>,

    /// 3D scene
    pub scene: &'a mut PhysicsScene3D,

    /// 2D scene
    pub scene_2d: &'a mut PhysicsScene2D,
}

/// Accumulates frame deltas into fixed physics steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep {
    time_step: f64,
    accumulator: f64,
}

impl FixedStep {
    /// Accumulator releasing time once `time_step` seconds have built up
    pub const fn new(time_step: f64) -> Self {
        Self { time_step, accumulator: 0.0 }
    }

    /// Configured step length
    pub const fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Add `delta_time`; returns the accumulated time once it reaches a step
    pub fn advance(&mut self, delta_time: f64) -> Option<f64> {
        self.accumulator += delta_time.max(0.0);

        if self.accumulator >= self.time_step {
            let elapsed = self.accumulator;
            self.accumulator = 0.0;
            Some(elapsed)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pre,
    Post,
}

/// Steps the 3D scene and runs `Collider`/`RigidBody` physics hooks
#[derive(Debug, Clone)]
pub struct Physics3D {
    fixed_step: FixedStep,
}

impl Physics3D {
    /// Create with the given fixed step
    pub const fn new(time_step: f64) -> Self {
        Self { fixed_step: FixedStep::new(time_step) }
    }

    /// Accumulate `delta_time` and step when due; returns whether a step ran
    pub fn update(&mut self, delta_time: f64, components: &mut Components, entities: &Entities) -> bool {
        let Some(elapsed) = self.fixed_step.advance(delta_time) else {
            return false;
        };

        let services = components.services().clone();
        let (Ok(mut scene), Ok(mut scene_2d)) = (services.physics.try_borrow_mut(), services.physics_2d.try_borrow_mut())
        else {
            log::warn!("Physics scene is borrowed elsewhere, skipping 3D step");
            return false;
        };

        let order = [ComponentType::Collider, ComponentType::RigidBody];
        run_hooks(Phase::Pre, order, ComponentType::RigidBody, components, entities, &mut scene, &mut scene_2d);

        #[allow(clippy::cast_possible_truncation)]
        let elapsed = elapsed as f32;
        scene.step(elapsed);

        run_hooks(Phase::Post, order, ComponentType::RigidBody, components, entities, &mut scene, &mut scene_2d);

        true
    }
}

/// Steps the 2D scene and runs `Collider2D`/`RigidBody2D` physics hooks
#[derive(Debug, Clone)]
pub struct Physics2D {
    fixed_step: FixedStep,
}

impl Physics2D {
    /// Create with the given fixed step
    pub const fn new(time_step: f64) -> Self {
        Self { fixed_step: FixedStep::new(time_step) }
    }

    /// Accumulate `delta_time` and step when due; returns whether a step ran
    pub fn update(&mut self, delta_time: f64, components: &mut Components, entities: &Entities) -> bool {
        let Some(elapsed) = self.fixed_step.advance(delta_time) else {
            return false;
        };

        let services = components.services().clone();
        let (Ok(mut scene), Ok(mut scene_2d)) = (services.physics.try_borrow_mut(), services.physics_2d.try_borrow_mut())
        else {
            log::warn!("Physics scene is borrowed elsewhere, skipping 2D step");
            return false;
        };

        let order = [ComponentType::Collider2D, ComponentType::RigidBody2D];
        run_hooks(Phase::Pre, order, ComponentType::RigidBody2D, components, entities, &mut scene, &mut scene_2d);

        #[allow(clippy::cast_possible_truncation)]
        let elapsed = elapsed as f32;
        scene_2d.step(elapsed);

        run_hooks(Phase::Post, order, ComponentType::RigidBody2D, components, entities, &mut scene, &mut scene_2d);

        true
    }
}

fn run_hooks(
    phase: Phase,
    order: [ComponentType; 2],
    rigid_body_type: ComponentType,
    components: &mut Components,
    entities: &Entities,
    scene: &mut PhysicsScene3D,
    scene_2d: &mut PhysicsScene2D,
) {
    for component_type in order {
        for handle in components.handles(component_type, entities, false) {
            let Some(key) = components.get_dyn(handle).and_then(|component| component.base().parent()) else {
                continue;
            };
            let (Some(entity), Some(pose)) = (entities.get(key), entities.world_pose(key, components)) else {
                continue;
            };

            let shape = entity
                .component(ComponentType::Collider)
                .and_then(|collider| components.get::<Collider>(collider))
                .map(Collider::shape);
            let shape_2d = entity
                .component(ComponentType::Collider2D)
                .and_then(|collider| components.get::<Collider2D>(collider))
                .map(Collider2D::shape);

            let mut context = PhysicsContext {
                pose,
                pose_changed: false,
                has_rigid_body: entity.has_component(rigid_body_type),
                shape,
                shape_2d,
                scene: &mut *scene,
                scene_2d: &mut *scene_2d,
            };

            if let Some(component) = components.get_dyn_mut(handle) {
                match phase {
                    Phase::Pre => component.on_pre_physics_update(&mut context),
                    Phase::Post => component.on_post_physics_update(&mut context),
                }
            }

            if context.pose_changed {
                entities.set_world_pose(key, context.pose, components);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_accumulates() {
        let mut step = FixedStep::new(0.1);

        assert_eq!(step.advance(0.04), None);
        assert_eq!(step.advance(0.04), None);

        let elapsed = step.advance(0.04).unwrap();
        assert!((elapsed - 0.12).abs() < 1e-9);
        assert_eq!(step.advance(0.0), None);
    }

    #[test]
    fn test_fixed_step_ignores_negative_delta() {
        let mut step = FixedStep::new(0.1);

        assert_eq!(step.advance(-1.0), None);
        assert!(step.advance(0.1).is_some());
    }
}
