//! Frame orchestration scenarios driven through a recording script runtime

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::ecs::components::{RigidBody, Script, Transform};
use crate::ecs::ComponentType;
use crate::foundation::math::{self, Quat, Vec3};
use crate::scripting::{ScriptError, ScriptHandle, ScriptMethod, ScriptRuntime};
use crate::world::World;

/// Runtime that records every invocation; scripts whose path starts with
/// `Broken` throw on every call
#[derive(Default)]
struct RecordingRuntime {
    next_handle: Cell<u64>,
    paths: RefCell<HashMap<ScriptHandle, String>>,
    calls: RefCell<Vec<(String, ScriptMethod)>>,
    disposed: RefCell<Vec<ScriptHandle>>,
}

impl RecordingRuntime {
    fn allocate(&self) -> ScriptHandle {
        let handle = ScriptHandle(self.next_handle.get() + 1);
        self.next_handle.set(handle.0);
        handle
    }

    fn calls_of(&self, method: ScriptMethod) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, called)| *called == method)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl ScriptRuntime for RecordingRuntime {
    fn is_ready(&self) -> bool {
        true
    }

    fn create_component_object(&self, _component_type: ComponentType, _internal_id: u32) -> Option<ScriptHandle> {
        Some(self.allocate())
    }

    fn dispose_object(&self, handle: ScriptHandle) {
        self.disposed.borrow_mut().push(handle);
    }

    fn instantiate(&self, script_path: &str, _owner: Option<ScriptHandle>) -> Result<ScriptHandle, ScriptError> {
        if script_path == "Missing" {
            return Err(ScriptError::NotFound(script_path.to_string()));
        }

        let handle = self.allocate();
        self.paths.borrow_mut().insert(handle, script_path.to_string());
        Ok(handle)
    }

    fn invoke(&self, instance: ScriptHandle, method: ScriptMethod, _delta_time: f32) -> Result<(), ScriptError> {
        let path = self
            .paths
            .borrow()
            .get(&instance)
            .cloned()
            .ok_or(ScriptError::InvalidInstance(instance))?;

        self.calls.borrow_mut().push((path.clone(), method));

        if path.starts_with("Broken") {
            return Err(ScriptError::Exception {
                method: method.name(),
                message: "NullReferenceException".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityKey;
    use approx::assert_relative_eq;

    fn scripted_world(paths: &[&str]) -> (World, Rc<RecordingRuntime>, Vec<EntityKey>) {
        let runtime = Rc::new(RecordingRuntime::default());
        let mut world = World::with_script_runtime(EngineConfig::default(), runtime.clone()).unwrap();

        let keys = paths
            .iter()
            .map(|path| {
                let key = world.create_entity().unwrap();
                world.add_component::<Script>(key).unwrap();
                world.component_mut::<Script>(key).unwrap().set_script_path(*path);
                key
            })
            .collect();

        (world, runtime, keys)
    }

    #[test]
    fn test_pause_stops_scripts_but_not_physics() {
        let (mut world, runtime, keys) = scripted_world(&["Player"]);
        world.add_component::<RigidBody>(keys[0]).unwrap();
        world.setup();

        world.update_with_delta(0.1);
        assert_eq!(runtime.calls_of(ScriptMethod::Update).len(), 1);

        let before = world.component::<Transform>(keys[0]).unwrap().position().y;
        world.set_paused(true);
        for _ in 0..5 {
            world.update_with_delta(0.1);
        }
        world.render_with_delta(0.1);

        let after = world.component::<Transform>(keys[0]).unwrap().position().y;
        assert_eq!(runtime.calls_of(ScriptMethod::Update).len(), 1);
        assert_eq!(runtime.calls_of(ScriptMethod::Render).len(), 1);
        assert!(after < before, "body should keep falling while paused ({after} >= {before})");

        world.set_paused(false);
        world.update_with_delta(0.1);
        assert_eq!(runtime.calls_of(ScriptMethod::Update).len(), 2);
    }

    #[test]
    fn test_failing_script_does_not_stop_others() {
        let (mut world, runtime, _) = scripted_world(&["BrokenEnemy", "Missing", "Player"]);
        world.setup();

        world.update_with_delta(0.016);
        world.update_with_delta(0.016);

        assert_eq!(runtime.calls_of(ScriptMethod::Start), ["BrokenEnemy", "Player"]);
        assert_eq!(
            runtime.calls_of(ScriptMethod::Update),
            ["BrokenEnemy", "Player", "BrokenEnemy", "Player"]
        );
    }

    #[test]
    fn test_copied_script_is_instantiated_lazily() {
        let (mut world, runtime, keys) = scripted_world(&["Player"]);
        world.setup();

        let source = world.entities().get(keys[0]).unwrap().component(ComponentType::Script).unwrap();
        let copy = world.components_mut().copy(source).unwrap();
        assert_eq!(world.components().get::<Script>(copy).unwrap().instance(), None);

        world.update_with_delta(0.016);

        assert!(world.components().get::<Script>(copy).unwrap().instance().is_some());
        assert_eq!(runtime.calls_of(ScriptMethod::Update), ["Player", "Player"]);
    }

    #[test]
    fn test_delete_disposes_script_objects() {
        let (mut world, runtime, keys) = scripted_world(&["Player"]);
        world.setup();
        let instance = world.component::<Script>(keys[0]).unwrap().instance().unwrap();

        assert!(world.delete_entity(keys[0]));

        assert!(runtime.disposed.borrow().contains(&instance));
    }

    #[test]
    fn test_time_scale_scales_physics() {
        let mut slow = World::new(EngineConfig::default()).unwrap();
        let mut fast = World::new(EngineConfig::default()).unwrap();
        let slow_key = slow.create_entity().unwrap();
        let fast_key = fast.create_entity().unwrap();

        slow.add_component::<RigidBody>(slow_key).unwrap();
        fast.add_component::<RigidBody>(fast_key).unwrap();
        slow.set_time_scale(0.5);

        for _ in 0..4 {
            slow.update_with_delta(0.1);
            fast.update_with_delta(0.1);
        }

        let slow_y = slow.component::<Transform>(slow_key).unwrap().position().y;
        let fast_y = fast.component::<Transform>(fast_key).unwrap().position().y;
        assert!(slow_y > fast_y);
    }

    #[test]
    fn test_child_body_under_rotated_parent_falls_freely() {
        let mut world = World::new(EngineConfig::default()).unwrap();

        let parent = world.create_entity_named("Pivot").unwrap();
        world
            .component_mut::<Transform>(parent)
            .unwrap()
            .set_rotation(Quat::from_axis_angle(&Vec3::y_axis(), 37f32.to_radians()));

        let child = {
            let (entities, components) = world.ecs_mut();
            entities.create_child(parent, components).unwrap()
        };
        world.component_mut::<Transform>(child).unwrap().set_position(Vec3::new(1.0, 0.0, 0.0));
        world.add_component::<RigidBody>(child).unwrap();

        let root = world.create_entity_named("Reference").unwrap();
        world.component_mut::<Transform>(root).unwrap().set_position(Vec3::new(10.0, 0.0, 0.0));
        world.add_component::<RigidBody>(root).unwrap();

        for _ in 0..60 {
            world.update_with_delta(1.0 / 60.0);
        }

        let child_y = math::matrix_translation(&world.world_matrix(child).unwrap()).y;
        let root_y = world.component::<Transform>(root).unwrap().position().y;
        assert!(root_y < -4.0);
        assert_relative_eq!(child_y, root_y, epsilon = 1e-3);
    }
}
