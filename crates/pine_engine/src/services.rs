//! Shared engine collaborators
//!
//! Components reach the scripting runtime and the physics scenes through a
//! [`Services`] value handed to their hooks instead of through globals.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::foundation::math::{Vec2, Vec3};
use crate::physics::{PhysicsScene2D, PhysicsScene3D};
use crate::scripting::{NullScriptRuntime, ScriptRuntime};

/// Collaborators shared by the world, the registries and component hooks
#[derive(Clone)]
pub struct Services {
    /// Managed scripting runtime
    pub scripts: Rc<dyn ScriptRuntime>,

    /// 3D physics scene
    pub physics: Rc<RefCell<PhysicsScene3D>>,

    /// 2D physics scene
    pub physics_2d: Rc<RefCell<PhysicsScene2D>>,
}

impl Services {
    /// Services with no scripting backend and empty physics scenes
    pub fn new(config: &EngineConfig) -> Self {
        let [x, y, z] = config.gravity;
        let [x2, y2] = config.gravity_2d;

        Self {
            scripts: Rc::new(NullScriptRuntime),
            physics: Rc::new(RefCell::new(PhysicsScene3D::new(Vec3::new(x, y, z)))),
            physics_2d: Rc::new(RefCell::new(PhysicsScene2D::new(Vec2::new(x2, y2)))),
        }
    }

    /// Replace the scripting runtime
    pub fn with_script_runtime(mut self, runtime: Rc<dyn ScriptRuntime>) -> Self {
        self.scripts = runtime;
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
