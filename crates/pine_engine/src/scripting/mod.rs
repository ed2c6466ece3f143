//! Scripting runtime seam
//!
//! The managed scripting runtime lives outside the engine core. The core only
//! talks to it through [`ScriptRuntime`]: creating peer objects for entities
//! and components, instantiating script classes and invoking their lifecycle
//! methods. [`ScriptManager`] fans those calls out across every live
//! [`Script`] component.

use std::fmt;

use thiserror::Error;

use crate::ecs::components::Script;
use crate::ecs::{Component, ComponentType, Components, Entities};

/// Opaque handle to an object living in the scripting runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptHandle(pub u64);

impl fmt::Display for ScriptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle methods a script instance can implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptMethod {
    /// Called once when the world starts
    Start,
    /// Called every simulation tick
    Update,
    /// Called every rendered frame
    Render,
}

impl ScriptMethod {
    /// Method name as seen by scripts
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "OnStart",
            Self::Update => "OnUpdate",
            Self::Render => "OnRender",
        }
    }
}

/// Scripting failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No runtime is loaded
    #[error("Scripting runtime is not available")]
    Unavailable,

    /// The script class could not be found
    #[error("Script not found: {0}")]
    NotFound(String),

    /// The instance handle is unknown to the runtime
    #[error("Invalid script instance {0}")]
    InvalidInstance(ScriptHandle),

    /// A script method threw
    #[error("{method} failed: {message}")]
    Exception {
        /// Method that was invoked
        method: &'static str,
        /// Error text reported by the runtime
        message: String,
    },
}

/// Bridge to the managed scripting runtime
///
/// Methods take `&self`; runtimes that keep state use interior mutability.
pub trait ScriptRuntime {
    /// Whether scripts can be instantiated and invoked
    fn is_ready(&self) -> bool;

    /// Create the peer object mirroring a pooled component
    fn create_component_object(&self, _component_type: ComponentType, _internal_id: u32) -> Option<ScriptHandle> {
        None
    }

    /// Create the peer object mirroring an entity
    fn create_entity_object(&self, _entity_id: u32) -> Option<ScriptHandle> {
        None
    }

    /// Release a peer object or script instance
    fn dispose_object(&self, _handle: ScriptHandle) {}

    /// Instantiate the script class at `script_path`, attached to `owner`
    fn instantiate(&self, script_path: &str, owner: Option<ScriptHandle>) -> Result<ScriptHandle, ScriptError>;

    /// Invoke a lifecycle method on a script instance
    fn invoke(&self, instance: ScriptHandle, method: ScriptMethod, delta_time: f32) -> Result<(), ScriptError>;
}

/// Runtime used when no scripting backend is loaded
#[derive(Debug, Default, Clone, Copy)]
pub struct NullScriptRuntime;

impl ScriptRuntime for NullScriptRuntime {
    fn is_ready(&self) -> bool {
        false
    }

    fn instantiate(&self, _script_path: &str, _owner: Option<ScriptHandle>) -> Result<ScriptHandle, ScriptError> {
        Err(ScriptError::Unavailable)
    }

    fn invoke(&self, _instance: ScriptHandle, _method: ScriptMethod, _delta_time: f32) -> Result<(), ScriptError> {
        Err(ScriptError::Unavailable)
    }
}

/// Drives script lifecycle methods across every live [`Script`] component
///
/// Failures are logged with the script path and suppressed, so one broken
/// script never stops the others from running.
#[derive(Debug, Default)]
pub struct ScriptManager {
    started: bool,
}

impl ScriptManager {
    /// Create a script manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `on_start` has run since the last reset
    pub const fn started(&self) -> bool {
        self.started
    }

    /// Forget that scripts were started, e.g. after a level change
    pub fn reset(&mut self) {
        self.started = false;
    }

    /// Invoke `OnStart` on every script
    pub fn on_start(&mut self, components: &mut Components, entities: &Entities) {
        Self::run(components, entities, ScriptMethod::Start, 0.0);
        self.started = true;
    }

    /// Invoke `OnUpdate` on every script
    pub fn on_update(&mut self, components: &mut Components, entities: &Entities, delta_time: f32) {
        Self::run(components, entities, ScriptMethod::Update, delta_time);
    }

    /// Invoke `OnRender` on every script
    pub fn on_render(&mut self, components: &mut Components, entities: &Entities, delta_time: f32) {
        Self::run(components, entities, ScriptMethod::Render, delta_time);
    }

    fn run(components: &mut Components, entities: &Entities, method: ScriptMethod, delta_time: f32) {
        let runtime = components.services().scripts.clone();
        if !runtime.is_ready() {
            return;
        }

        for script in components.iter_mut::<Script>(entities, false) {
            if script.script_path().is_empty() {
                continue;
            }

            let instance = match script.instance() {
                Some(instance) => instance,
                None => match runtime.instantiate(script.script_path(), script.base().script_handle()) {
                    Ok(instance) => {
                        script.set_instance(Some(instance));
                        instance
                    }
                    Err(error) => {
                        log::error!("Failed to instantiate script {}: {}", script.script_path(), error);
                        continue;
                    }
                },
            };

            if let Err(error) = runtime.invoke(instance, method, delta_time) {
                log::error!("Script {}: {}", script.script_path(), error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_runtime_is_unavailable() {
        let runtime = NullScriptRuntime;

        assert!(!runtime.is_ready());
        assert_eq!(runtime.instantiate("Player", None), Err(ScriptError::Unavailable));
        assert_eq!(runtime.create_component_object(ComponentType::Script, 0), None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ScriptMethod::Update.name(), "OnUpdate");
        assert_eq!(ScriptError::Exception { method: "OnStart", message: "boom".into() }.to_string(), "OnStart failed: boom");
    }
}
