//! Component contract shared by every component type
//!
//! Every component carries a [`ComponentBase`] with the bookkeeping the
//! registry needs (type tag, slot index, standalone flag, owning entity) and
//! implements the [`Component`] hook surface. All hooks default to no-ops.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entities::Entities;
use super::entity::EntityKey;
use super::error::EcsError;
use crate::foundation::serialization;
use crate::physics::PhysicsContext;
use crate::scripting::ScriptHandle;
use crate::services::Services;

/// Closed set of component kinds
///
/// The discriminant is the dense index of the type's block inside the
/// registry, so the order here is load-bearing. `Transform` must stay first:
/// every entity's first component is its transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentType {
    /// Spatial transform, always component 0 of an entity
    Transform = 0,
    /// 3D model renderer
    ModelRenderer,
    /// Terrain renderer
    TerrainRenderer,
    /// Scene camera
    Camera,
    /// Light source
    Light,
    /// 3D collider
    Collider,
    /// 3D rigid body
    RigidBody,
    /// 2D collider
    Collider2D,
    /// 2D rigid body
    RigidBody2D,
    /// 2D sprite renderer
    SpriteRenderer,
    /// 2D tile-map renderer
    TilemapRenderer,
    /// Native (Rust) behaviour
    NativeScript,
    /// Managed script instance
    Script,
    /// Audio emitter
    AudioSource,
    /// Audio receiver
    AudioListener,
}

impl ComponentType {
    /// Number of component types
    pub const COUNT: usize = 15;

    /// Every component type in block index order
    pub const ALL: [Self; Self::COUNT] = [
        Self::Transform,
        Self::ModelRenderer,
        Self::TerrainRenderer,
        Self::Camera,
        Self::Light,
        Self::Collider,
        Self::RigidBody,
        Self::Collider2D,
        Self::RigidBody2D,
        Self::SpriteRenderer,
        Self::TilemapRenderer,
        Self::NativeScript,
        Self::Script,
        Self::AudioSource,
        Self::AudioListener,
    ];

    /// Dense block index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a type by block index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::ModelRenderer => "Model Renderer",
            Self::TerrainRenderer => "Terrain Renderer",
            Self::Camera => "Camera",
            Self::Light => "Light",
            Self::Collider => "Collider",
            Self::RigidBody => "Rigid Body",
            Self::Collider2D => "Collider 2D",
            Self::RigidBody2D => "Rigid Body 2D",
            Self::SpriteRenderer => "Sprite Renderer",
            Self::TilemapRenderer => "Tile-map Renderer",
            Self::NativeScript => "Native Script",
            Self::Script => "Script",
            Self::AudioSource => "Audio Source",
            Self::AudioListener => "Audio Listener",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generation-checked reference to a pooled component slot
///
/// `index` is the component's internal id. The generation changes every time
/// the slot is released, so a handle kept past `destroy` stops resolving
/// instead of aliasing whatever reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    component_type: ComponentType,
    index: u32,
    generation: u32,
}

impl ComponentHandle {
    pub(crate) const fn new(component_type: ComponentType, index: u32, generation: u32) -> Self {
        Self { component_type, index, generation }
    }

    /// Type of the referenced component
    pub const fn component_type(self) -> ComponentType {
        self.component_type
    }

    /// Slot index inside the type's block (the internal id)
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation the handle was issued for
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// State shared by every component instance
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBase {
    active: bool,
    standalone: bool,
    component_type: ComponentType,
    internal_id: u32,
    unique_id: u64,
    parent: Option<EntityKey>,
    script_handle: Option<ScriptHandle>,
}

impl ComponentBase {
    /// Fresh, active, unattached state for a component of `component_type`
    pub const fn new(component_type: ComponentType) -> Self {
        Self {
            active: true,
            standalone: false,
            component_type,
            internal_id: 0,
            unique_id: 0,
            parent: None,
            script_handle: None,
        }
    }

    /// Whether the component itself is enabled
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Enable or disable the component
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether the component lives outside the registry's blocks
    pub const fn standalone(&self) -> bool {
        self.standalone
    }

    /// Type tag
    pub const fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Slot index inside the type's block, 0 for standalone components
    pub const fn internal_id(&self) -> u32 {
        self.internal_id
    }

    /// Monotonic per-block creation counter
    pub const fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Owning entity, if attached
    pub const fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    /// Peer object in the scripting runtime, if any
    pub const fn script_handle(&self) -> Option<ScriptHandle> {
        self.script_handle
    }

    /// Component active AND owning entity active
    ///
    /// A component without an owning entity only depends on its own flag.
    pub fn is_world_enabled(&self, entities: &Entities) -> bool {
        self.active
            && self
                .parent
                .map_or(true, |parent| entities.get(parent).is_some_and(|entity| entity.active()))
    }

    pub(crate) fn set_standalone(&mut self, standalone: bool) {
        self.standalone = standalone;
    }

    pub(crate) fn set_slot(&mut self, internal_id: u32, unique_id: u64) {
        self.internal_id = internal_id;
        self.unique_id = unique_id;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityKey>) {
        self.parent = parent;
    }

    pub(crate) fn set_script_handle(&mut self, handle: Option<ScriptHandle>) {
        self.script_handle = handle;
    }

    pub(crate) fn take_script_handle(&mut self) -> Option<ScriptHandle> {
        self.script_handle.take()
    }
}

/// Behaviour every component implements
///
/// Hook order for pooled components: `on_created` (parent not yet assigned),
/// parent assignment by the entity, then `on_setup` when the world is set up,
/// `on_update`/`on_render`/physics hooks every frame, and `on_destroyed`
/// before the slot is released. Standalone components get `on_created` as
/// well, but no scripting peer.
pub trait Component: Any {
    /// Shared state
    fn base(&self) -> &ComponentBase;

    /// Shared state, mutable
    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Upcast for typed access
    fn as_any(&self) -> &dyn Any;

    /// Upcast for typed access, mutable
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Type tag
    fn component_type(&self) -> ComponentType {
        self.base().component_type()
    }

    /// Called once the slot has been populated
    fn on_created(&mut self, _services: &Services) {}

    /// Called before the slot is released
    ///
    /// Releases external resources (physics bodies, script instances). Must not
    /// touch slot bookkeeping; an error is logged and the slot is freed anyway.
    fn on_destroyed(&mut self, _services: &Services) -> Result<(), EcsError> {
        Ok(())
    }

    /// Called on a fresh data-level copy; drop handles that cannot be shared
    fn on_copied(&mut self) {}

    /// Called when the game world is (re)initialized
    fn on_setup(&mut self, _services: &Services) {}

    /// Called every simulation tick while the world is running
    fn on_update(&mut self, _delta_time: f32) {}

    /// Called every rendered frame, also while paused
    fn on_render(&mut self, _delta_time: f32) {}

    /// Push engine state into the physics scene before a step
    fn on_pre_physics_update(&mut self, _physics: &mut PhysicsContext<'_>) {}

    /// Pull the simulated state back after a step
    fn on_post_physics_update(&mut self, _physics: &mut PhysicsContext<'_>) {}

    /// Restore component fields from a JSON object
    fn load_data(&mut self, _data: &Value) -> Result<(), EcsError> {
        Ok(())
    }

    /// Write component fields into a JSON object
    fn save_data(&self, _data: &mut Value) -> Result<(), EcsError> {
        Ok(())
    }
}

/// A concrete component type with a fixed [`ComponentType`]
pub trait ComponentKind: Component + Default {
    /// Type tag of `Self`
    const TYPE: ComponentType;
}

impl dyn Component + '_ {
    /// Downcast to a concrete component
    pub fn downcast_ref<T: ComponentKind>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to a concrete component, mutable
    pub fn downcast_mut<T: ComponentKind>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Serialize a component including its active flag
pub fn save_component(component: &dyn Component) -> Result<Value, EcsError> {
    let mut data = Value::Object(Map::new());
    serialization::store(&mut data, "active", &component.base().active())?;
    component.save_data(&mut data)?;
    Ok(data)
}

/// Restore a component written by [`save_component`]
pub fn load_component(component: &mut dyn Component, data: &Value) -> Result<(), EcsError> {
    let mut active = component.base().active();
    serialization::load(data, "active", &mut active)?;
    component.base_mut().set_active(active);
    component.load_data(data)
}

/// Implements the accessor half of [`Component`] for a struct with a `base` field
macro_rules! component_base {
    () => {
        fn base(&self) -> &$crate::ecs::ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::ecs::ComponentBase {
            &mut self.base
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

pub(crate) use component_base;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_is_index_zero() {
        assert_eq!(ComponentType::Transform.index(), 0);
        assert_eq!(ComponentType::ALL[0], ComponentType::Transform);
    }

    #[test]
    fn test_all_matches_discriminants() {
        for (index, component_type) in ComponentType::ALL.iter().enumerate() {
            assert_eq!(component_type.index(), index);
            assert_eq!(ComponentType::from_index(index), Some(*component_type));
        }

        assert_eq!(ComponentType::from_index(ComponentType::COUNT), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ComponentType::RigidBody2D.to_string(), "Rigid Body 2D");
        assert_eq!(ComponentType::TilemapRenderer.to_string(), "Tile-map Renderer");
    }

    #[test]
    fn test_base_defaults() {
        let base = ComponentBase::new(ComponentType::Light);

        assert!(base.active());
        assert!(!base.standalone());
        assert_eq!(base.parent(), None);
        assert_eq!(base.script_handle(), None);
        assert_eq!(base.component_type(), ComponentType::Light);
    }
}
