//! Entity - a game object made of components

use slotmap::new_key_type;

use super::component::{ComponentHandle, ComponentType};
use crate::scripting::ScriptHandle;

new_key_type! {
    /// Generational key of an entity inside [`super::Entities`]
    pub struct EntityKey;
}

/// A game object
///
/// The entity only references its components; the registry owns them. The
/// first component is always the entity's Transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: u32,
    name: String,
    active: bool,
    is_static: bool,
    temporary: bool,
    pub(crate) components: Vec<ComponentHandle>,
    pub(crate) children: Vec<EntityKey>,
    pub(crate) parent: Option<EntityKey>,
    pub(crate) script_handle: Option<ScriptHandle>,
}

impl Entity {
    pub(crate) fn new(id: u32) -> Self {
        Self {
            id,
            name: "Entity".to_string(),
            active: true,
            is_static: false,
            temporary: false,
            components: Vec::new(),
            children: Vec::new(),
            parent: None,
            script_handle: None,
        }
    }

    /// Registry-unique id, starting at 1
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether the entity and its components take part in the frame
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Enable or disable the entity
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Static entities are not expected to move
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Mark the entity static
    pub fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
    }

    /// Temporary entities survive level reloads
    pub const fn temporary(&self) -> bool {
        self.temporary
    }

    /// Mark the entity temporary
    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// Component handles in attachment order
    pub fn components(&self) -> &[ComponentHandle] {
        &self.components
    }

    /// First component of the given type
    pub fn component(&self, component_type: ComponentType) -> Option<ComponentHandle> {
        self.components
            .iter()
            .copied()
            .find(|handle| handle.component_type() == component_type)
    }

    /// Whether any component of the given type is attached
    pub fn has_component(&self, component_type: ComponentType) -> bool {
        self.component(component_type).is_some()
    }

    /// Handle of the entity's Transform
    ///
    /// # Panics
    ///
    /// Panics if the entity has no components; every entity created through
    /// [`super::Entities`] carries a Transform from the start.
    pub fn transform(&self) -> ComponentHandle {
        match self.components.first() {
            Some(handle) => *handle,
            None => panic!("entity {} ({}) has no components", self.id, self.name),
        }
    }

    /// Child entities in order
    pub fn children(&self) -> &[EntityKey] {
        &self.children
    }

    /// Parent entity, if any
    pub const fn parent(&self) -> Option<EntityKey> {
        self.parent
    }

    /// Peer object in the scripting runtime, if any
    pub const fn script_handle(&self) -> Option<ScriptHandle> {
        self.script_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_defaults() {
        let entity = Entity::new(7);

        assert_eq!(entity.id(), 7);
        assert_eq!(entity.name(), "Entity");
        assert!(entity.active());
        assert!(!entity.is_static());
        assert!(!entity.temporary());
        assert!(entity.components().is_empty());
        assert_eq!(entity.component(ComponentType::Transform), None);
    }

    #[test]
    #[should_panic(expected = "has no components")]
    fn test_transform_of_empty_entity_panics() {
        let entity = Entity::new(1);
        let _ = entity.transform();
    }

    #[test]
    fn test_component_lookup_by_type() {
        let mut entity = Entity::new(1);
        entity.components.push(ComponentHandle::new(ComponentType::Transform, 0, 0));
        entity.components.push(ComponentHandle::new(ComponentType::Light, 3, 1));
        entity.components.push(ComponentHandle::new(ComponentType::Light, 4, 0));

        assert_eq!(entity.transform().component_type(), ComponentType::Transform);
        assert_eq!(entity.component(ComponentType::Light).map(ComponentHandle::index), Some(3));
        assert!(!entity.has_component(ComponentType::Camera));
    }
}
