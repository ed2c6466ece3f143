//! Physics body sets
//!
//! Minimal stand-ins for the external 3D and 2D solvers: bodies with a pose,
//! a velocity and an optional shape, integrated under gravity. Collision
//! response is left to the real solver.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Quat, Vec2, Vec3};

new_key_type! {
    /// Generational handle to a body in a physics scene
    pub struct BodyHandle;
}

/// How a body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves
    Static,
    /// Moved by its velocity only, ignores gravity
    Kinematic,
    /// Fully simulated
    #[default]
    Dynamic,
}

/// 3D collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape3D {
    /// Axis aligned box in body space
    Box {
        /// Half size along each axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Capsule along the Y axis
    Capsule {
        /// Radius
        radius: f32,
        /// Height of the cylindrical part
        height: f32,
    },
}

/// 2D collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape2D {
    /// Box in body space
    Box {
        /// Half size along each axis
        half_extents: Vec2,
    },
    /// Circle
    Circle {
        /// Radius
        radius: f32,
    },
}

/// Body in the 3D scene
#[derive(Debug, Clone, PartialEq)]
pub struct Body3D {
    /// Simulation mode
    pub kind: BodyKind,
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Linear velocity in units per second
    pub linear_velocity: Vec3,
    /// Mass in kilograms
    pub mass: f32,
    /// Apply scene gravity to dynamic bodies
    pub gravity_enabled: bool,
    /// Collision shape
    pub shape: Option<Shape3D>,
    /// Reports overlaps without colliding
    pub is_trigger: bool,
}

impl Default for Body3D {
    fn default() -> Self {
        Self {
            kind: BodyKind::default(),
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            linear_velocity: Vec3::zeros(),
            mass: 1.0,
            gravity_enabled: true,
            shape: None,
            is_trigger: false,
        }
    }
}

/// Body in the 2D scene
#[derive(Debug, Clone, PartialEq)]
pub struct Body2D {
    /// Simulation mode
    pub kind: BodyKind,
    /// World position
    pub position: Vec2,
    /// Rotation around Z in radians
    pub angle: f32,
    /// Linear velocity in units per second
    pub linear_velocity: Vec2,
    /// Apply scene gravity to dynamic bodies
    pub gravity_enabled: bool,
    /// Collision shape
    pub shape: Option<Shape2D>,
}

impl Default for Body2D {
    fn default() -> Self {
        Self {
            kind: BodyKind::default(),
            position: Vec2::zeros(),
            angle: 0.0,
            linear_velocity: Vec2::zeros(),
            gravity_enabled: true,
            shape: None,
        }
    }
}

/// Set of 3D bodies stepped together
#[derive(Debug, Clone)]
pub struct PhysicsScene3D {
    bodies: SlotMap<BodyHandle, Body3D>,
    gravity: Vec3,
}

impl PhysicsScene3D {
    /// Empty scene with the given gravity
    pub fn new(gravity: Vec3) -> Self {
        Self { bodies: SlotMap::with_key(), gravity }
    }

    /// Scene gravity
    pub const fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Replace scene gravity
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    /// Add a body and return its handle
    pub fn add(&mut self, body: Body3D) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body, `None` if the handle is stale
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body3D> {
        self.bodies.remove(handle)
    }

    /// Look up a body
    pub fn body(&self, handle: BodyHandle) -> Option<&Body3D> {
        self.bodies.get(handle)
    }

    /// Look up a body, mutable
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body3D> {
        self.bodies.get_mut(handle)
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when the scene holds no bodies
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advance every body by `delta_time` seconds
    pub fn step(&mut self, delta_time: f32) {
        for body in self.bodies.values_mut() {
            match body.kind {
                BodyKind::Static => {}
                BodyKind::Kinematic => body.position += body.linear_velocity * delta_time,
                BodyKind::Dynamic => {
                    if body.gravity_enabled {
                        body.linear_velocity += self.gravity * delta_time;
                    }
                    body.position += body.linear_velocity * delta_time;
                }
            }
        }
    }
}

impl Default for PhysicsScene3D {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

/// Set of 2D bodies stepped together
#[derive(Debug, Clone)]
pub struct PhysicsScene2D {
    bodies: SlotMap<BodyHandle, Body2D>,
    gravity: Vec2,
}

impl PhysicsScene2D {
    /// Empty scene with the given gravity
    pub fn new(gravity: Vec2) -> Self {
        Self { bodies: SlotMap::with_key(), gravity }
    }

    /// Scene gravity
    pub const fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Add a body and return its handle
    pub fn add(&mut self, body: Body2D) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Remove a body, `None` if the handle is stale
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body2D> {
        self.bodies.remove(handle)
    }

    /// Look up a body
    pub fn body(&self, handle: BodyHandle) -> Option<&Body2D> {
        self.bodies.get(handle)
    }

    /// Look up a body, mutable
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body2D> {
        self.bodies.get_mut(handle)
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when the scene holds no bodies
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advance every body by `delta_time` seconds
    pub fn step(&mut self, delta_time: f32) {
        for body in self.bodies.values_mut() {
            match body.kind {
                BodyKind::Static => {}
                BodyKind::Kinematic => body.position += body.linear_velocity * delta_time,
                BodyKind::Dynamic => {
                    if body.gravity_enabled {
                        body.linear_velocity += self.gravity * delta_time;
                    }
                    body.position += body.linear_velocity * delta_time;
                }
            }
        }
    }
}

impl Default for PhysicsScene2D {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -9.81))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dynamic_body_falls() {
        let mut scene = PhysicsScene3D::new(Vec3::new(0.0, -10.0, 0.0));
        let handle = scene.add(Body3D::default());

        scene.step(0.5);

        let body = scene.body(handle).unwrap();
        assert_relative_eq!(body.linear_velocity.y, -5.0);
        assert_relative_eq!(body.position.y, -2.5);
    }

    #[test]
    fn test_static_and_kinematic_ignore_gravity() {
        let mut scene = PhysicsScene3D::default();
        let fixed = scene.add(Body3D { kind: BodyKind::Static, ..Body3D::default() });
        let moving = scene.add(Body3D {
            kind: BodyKind::Kinematic,
            linear_velocity: Vec3::new(1.0, 0.0, 0.0),
            ..Body3D::default()
        });

        scene.step(1.0);

        assert_eq!(scene.body(fixed).unwrap().position, Vec3::zeros());
        assert_relative_eq!(scene.body(moving).unwrap().position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_removed_handle_is_stale() {
        let mut scene = PhysicsScene2D::default();
        let handle = scene.add(Body2D::default());

        assert!(scene.remove(handle).is_some());
        assert!(scene.body(handle).is_none());
        assert!(scene.remove(handle).is_none());
        assert!(scene.is_empty());
    }
}
