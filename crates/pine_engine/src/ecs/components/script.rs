//! Script components
//!
//! [`Script`] binds an entity to a class in the managed scripting runtime;
//! the script manager instantiates and drives it. [`NativeScript`] hosts a
//! Rust behaviour directly and is driven by the component hooks.

use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::serialization;
use crate::scripting::ScriptHandle;
use crate::services::Services;

/// Managed script attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    base: ComponentBase,
    script_path: String,
    instance: Option<ScriptHandle>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::Script),
            script_path: String::new(),
            instance: None,
        }
    }
}

impl Script {
    /// Script asset path, empty when unassigned
    pub fn script_path(&self) -> &str {
        &self.script_path
    }

    /// Assign a script; the instance is recreated on the next script tick
    pub fn set_script_path(&mut self, path: impl Into<String>) {
        self.script_path = path.into();
        self.instance = None;
    }

    /// Live instance in the scripting runtime
    pub const fn instance(&self) -> Option<ScriptHandle> {
        self.instance
    }

    pub(crate) fn set_instance(&mut self, instance: Option<ScriptHandle>) {
        self.instance = instance;
    }
}

impl Component for Script {
    component_base!();

    fn on_destroyed(&mut self, services: &Services) -> Result<(), EcsError> {
        if let Some(instance) = self.instance.take() {
            services.scripts.dispose_object(instance);
        }
        Ok(())
    }

    fn on_copied(&mut self) {
        self.instance = None;
    }

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "script", &mut self.script_path)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "script", &self.script_path)?;
        Ok(())
    }
}

impl ComponentKind for Script {
    const TYPE: ComponentType = ComponentType::Script;
}

/// Rust-side behaviour hosted by a [`NativeScript`]
pub trait NativeBehaviour {
    /// Called when the world is set up
    fn on_setup(&mut self) {}

    /// Called every simulation tick
    fn on_update(&mut self, _delta_time: f32) {}

    /// Called every rendered frame
    fn on_render(&mut self, _delta_time: f32) {}
}

/// Hosts a [`NativeBehaviour`]
///
/// Behaviours are code, not data: they are neither serialized nor copied.
pub struct NativeScript {
    base: ComponentBase,
    behaviour: Option<Box<dyn NativeBehaviour>>,
}

impl Default for NativeScript {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::NativeScript),
            behaviour: None,
        }
    }
}

impl NativeScript {
    /// Install the hosted behaviour
    pub fn set_behaviour(&mut self, behaviour: Box<dyn NativeBehaviour>) {
        self.behaviour = Some(behaviour);
    }

    /// Remove and return the hosted behaviour
    pub fn take_behaviour(&mut self) -> Option<Box<dyn NativeBehaviour>> {
        self.behaviour.take()
    }

    /// Whether a behaviour is installed
    pub fn has_behaviour(&self) -> bool {
        self.behaviour.is_some()
    }
}

impl Component for NativeScript {
    component_base!();

    fn on_setup(&mut self, _services: &Services) {
        if let Some(behaviour) = self.behaviour.as_mut() {
            behaviour.on_setup();
        }
    }

    fn on_update(&mut self, delta_time: f32) {
        if let Some(behaviour) = self.behaviour.as_mut() {
            behaviour.on_update(delta_time);
        }
    }

    fn on_render(&mut self, delta_time: f32) {
        if let Some(behaviour) = self.behaviour.as_mut() {
            behaviour.on_render(delta_time);
        }
    }
}

impl ComponentKind for NativeScript {
    const TYPE: ComponentType = ComponentType::NativeScript;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter(Rc<Cell<u32>>);

    impl NativeBehaviour for Counter {
        fn on_update(&mut self, _delta_time: f32) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_native_script_forwards_updates() {
        let count = Rc::new(Cell::new(0));
        let mut script = NativeScript::default();
        script.set_behaviour(Box::new(Counter(count.clone())));

        script.on_update(0.1);
        script.on_update(0.1);
        script.on_render(0.1);

        assert_eq!(count.get(), 2);
        assert_eq!(script.component_type(), ComponentType::NativeScript);
    }

    #[test]
    fn test_script_path_reset_drops_instance() {
        let mut script = Script::default();
        script.set_instance(Some(ScriptHandle(4)));

        script.set_script_path("Player.cs");

        assert_eq!(script.instance(), None);
        assert_eq!(script.script_path(), "Player.cs");
    }
}
