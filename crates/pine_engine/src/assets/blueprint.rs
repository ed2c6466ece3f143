//! Blueprint asset
//!
//! A blueprint is a detached copy of an entity and its children. The copied
//! components are standalone, so they never show up in block iteration and
//! never touch physics or scripting until the blueprint is spawned.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AssetError;
use crate::ecs::components::Transform;
use crate::ecs::{
    load_component, save_component, Component, ComponentHandle, ComponentType, Components, EcsError, Entities, EntityKey,
};

/// Detached entity stored by a [`Blueprint`]
pub struct BlueprintEntity {
    name: String,
    active: bool,
    is_static: bool,
    components: Vec<Box<dyn Component>>,
    children: Vec<BlueprintEntity>,
}

impl BlueprintEntity {
    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the spawned entity starts active
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Whether the spawned entity is flagged static
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Standalone component copies, Transform first
    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }

    /// Detached children
    pub fn children(&self) -> &[BlueprintEntity] {
        &self.children
    }

    /// Number of entities in this subtree, including `self`
    pub fn entity_count(&self) -> usize {
        1 + self.children.iter().map(Self::entity_count).sum::<usize>()
    }

    fn snapshot(key: EntityKey, entities: &Entities, components: &Components) -> Result<Self, EcsError> {
        let entity = entities.get(key).ok_or(EcsError::InvalidEntity)?;

        let copies = entity
            .components()
            .iter()
            .map(|&handle| components.copy_standalone(handle))
            .collect::<Result<Vec<_>, _>>()?;

        let children = entity
            .children()
            .iter()
            .map(|&child| Self::snapshot(child, entities, components))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: entity.name().to_string(),
            active: entity.active(),
            is_static: entity.is_static(),
            components: copies,
            children,
        })
    }

    fn spawn(
        &self,
        parent: Option<EntityKey>,
        entities: &mut Entities,
        components: &mut Components,
    ) -> Result<EntityKey, EcsError> {
        let key = match parent {
            Some(parent) => entities.create_child(parent, components)?,
            None => entities.create(components)?,
        };

        if let Err(error) = self.populate(key, entities, components) {
            entities.delete(key, components);
            return Err(error);
        }

        Ok(key)
    }

    fn populate(&self, key: EntityKey, entities: &mut Entities, components: &mut Components) -> Result<(), EcsError> {
        if let Some(entity) = entities.get_mut(key) {
            entity.set_name(self.name.as_str());
            entity.set_active(self.active);
            entity.set_static(self.is_static);
        }

        for component in &self.components {
            if component.component_type() == ComponentType::Transform {
                let data = save_component(component.as_ref())?;
                let transform = entities
                    .component_mut::<Transform>(key, components)
                    .ok_or(EcsError::InvalidHandle(ComponentType::Transform))?;
                load_component(transform, &data)?;
                transform.on_copied();
                continue;
            }

            attach_copy(key, component.as_ref(), entities, components)?;
        }

        for child in &self.children {
            child.spawn(Some(key), entities, components)?;
        }

        Ok(())
    }

    fn release(self, components: &Components) {
        for component in self.components {
            components.destroy_standalone(component);
        }
        for child in self.children {
            child.release(components);
        }
    }

    fn to_document(&self) -> Result<EntityDocument, EcsError> {
        let components = self
            .components
            .iter()
            .map(|component| {
                Ok(ComponentDocument {
                    component_type: component.component_type(),
                    data: save_component(component.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>, EcsError>>()?;

        let children = self
            .children
            .iter()
            .map(Self::to_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EntityDocument {
            name: self.name.clone(),
            active: self.active,
            is_static: self.is_static,
            components,
            children,
        })
    }

    fn from_document(document: EntityDocument, components: &Components) -> Result<Self, AssetError> {
        if document.components.first().map(|component| component.component_type) != Some(ComponentType::Transform) {
            return Err(AssetError::InvalidFormat(format!(
                "blueprint entity '{}' does not start with a Transform",
                document.name
            )));
        }

        let mut copies = Vec::with_capacity(document.components.len());
        for entry in &document.components {
            let mut component = components.create_standalone(entry.component_type)?;
            load_component(component.as_mut(), &entry.data)?;
            copies.push(component);
        }

        let children = document
            .children
            .into_iter()
            .map(|child| Self::from_document(child, components))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: document.name,
            active: document.active,
            is_static: document.is_static,
            components: copies,
            children,
        })
    }
}

/// Copy `source` into a pooled slot owned by `key`
///
/// The slot is released again when the entity refuses it.
fn attach_copy(
    key: EntityKey,
    source: &dyn Component,
    entities: &mut Entities,
    components: &mut Components,
) -> Result<ComponentHandle, EcsError> {
    let handle = components.copy_from(source)?;
    if let Err(error) = entities.attach_component(key, handle, components) {
        components.destroy(handle);
        return Err(error);
    }
    Ok(handle)
}

#[derive(Serialize, Deserialize)]
struct ComponentDocument {
    #[serde(rename = "type")]
    component_type: ComponentType,
    #[serde(default)]
    data: Value,
}

const fn default_active() -> bool {
    true
}

#[derive(Serialize, Deserialize)]
struct EntityDocument {
    name: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default, rename = "static")]
    is_static: bool,
    #[serde(default)]
    components: Vec<ComponentDocument>,
    #[serde(default)]
    children: Vec<EntityDocument>,
}

/// Reusable snapshot of an entity subtree
#[derive(Default)]
pub struct Blueprint {
    entity: Option<BlueprintEntity>,
}

impl Blueprint {
    /// Empty blueprint
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entity is stored
    pub const fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    /// The stored entity
    pub const fn entity(&self) -> Option<&BlueprintEntity> {
        self.entity.as_ref()
    }

    /// Snapshot `key` and its children, replacing the stored entity
    pub fn create_from_entity(
        &mut self,
        key: EntityKey,
        entities: &Entities,
        components: &Components,
    ) -> Result<(), EcsError> {
        let snapshot = BlueprintEntity::snapshot(key, entities, components)?;
        self.dispose(components);
        self.entity = Some(snapshot);
        Ok(())
    }

    /// Instantiate the stored entity in the world, returns the new root
    ///
    /// A spawn that fails part way deletes what it already created.
    pub fn spawn(&self, entities: &mut Entities, components: &mut Components) -> Result<EntityKey, EcsError> {
        let entity = self.entity.as_ref().ok_or(EcsError::InvalidEntity)?;
        entity.spawn(None, entities, components)
    }

    /// Serialize the stored entity, `null` when empty
    pub fn to_json(&self) -> Result<Value, AssetError> {
        match &self.entity {
            Some(entity) => Ok(serde_json::to_value(entity.to_document()?)?),
            None => Ok(Value::Null),
        }
    }

    /// Rebuild a blueprint from [`Self::to_json`] output
    pub fn from_json(data: &Value, components: &Components) -> Result<Self, AssetError> {
        if data.is_null() {
            return Ok(Self::default());
        }

        let document = EntityDocument::deserialize(data)?;
        Ok(Self { entity: Some(BlueprintEntity::from_document(document, components)?) })
    }

    /// Release the stored components
    pub fn dispose(&mut self, components: &Components) {
        if let Some(entity) = self.entity.take() {
            entity.release(components);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ecs::components::{Light, SpriteRenderer};
    use crate::foundation::math::Vec3;
    use crate::services::Services;
    use approx::assert_relative_eq;

    fn setup() -> (Entities, Components) {
        let services = Services::default();
        let components = Components::new(&EngineConfig::default(), services.clone()).unwrap();
        (Entities::new(services), components)
    }

    fn sample_entity(entities: &mut Entities, components: &mut Components) -> EntityKey {
        let root = entities.create_named("Lamp", components).unwrap();
        entities
            .component_mut::<Transform>(root, components)
            .unwrap()
            .set_position(Vec3::new(1.0, 2.0, 3.0));
        let light = entities.add_component::<Light>(root, components).unwrap();
        components.get_mut::<Light>(light).unwrap().set_spot_cone(20.0, 10.0);

        let child = entities.create_child(root, components).unwrap();
        entities.get_mut(child).unwrap().set_name("Bulb");
        entities.add_component::<SpriteRenderer>(child, components).unwrap();

        root
    }

    #[test]
    fn test_snapshot_is_standalone() {
        let (mut entities, mut components) = setup();
        let root = sample_entity(&mut entities, &mut components);

        let mut blueprint = Blueprint::new();
        blueprint.create_from_entity(root, &entities, &components).unwrap();

        let stored = blueprint.entity().unwrap();
        assert_eq!(stored.name(), "Lamp");
        assert_eq!(stored.entity_count(), 2);
        assert!(stored.components().iter().all(|component| component.base().standalone()));
        assert_eq!(components.iter::<Light>(&entities, true).count(), 1);
    }

    #[test]
    fn test_spawn_recreates_subtree() {
        let (mut entities, mut components) = setup();
        let root = sample_entity(&mut entities, &mut components);

        let mut blueprint = Blueprint::new();
        blueprint.create_from_entity(root, &entities, &components).unwrap();
        let spawned = blueprint.spawn(&mut entities, &mut components).unwrap();

        assert_ne!(spawned, root);
        assert_eq!(entities.len(), 4);
        assert_eq!(entities.get(spawned).unwrap().children().len(), 1);

        let position = entities.component::<Transform>(spawned, &components).unwrap().position();
        assert_relative_eq!(position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(components.iter::<Light>(&entities, false).count(), 2);
    }

    #[test]
    fn test_json_roundtrip() {
        let (mut entities, mut components) = setup();
        let root = sample_entity(&mut entities, &mut components);

        let mut blueprint = Blueprint::new();
        blueprint.create_from_entity(root, &entities, &components).unwrap();

        let data = blueprint.to_json().unwrap();
        let restored = Blueprint::from_json(&data, &components).unwrap();

        let stored = restored.entity().unwrap();
        assert_eq!(stored.children()[0].name(), "Bulb");
        assert_eq!(stored.components()[1].component_type(), ComponentType::Light);
    }

    #[test]
    fn test_document_without_transform_is_rejected() {
        let (_, components) = setup();
        let data = serde_json::json!({
            "name": "Broken",
            "components": [{ "type": "Light", "data": {} }],
        });

        assert!(matches!(
            Blueprint::from_json(&data, &components),
            Err(AssetError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_spawn_empty_blueprint_fails() {
        let (mut entities, mut components) = setup();

        assert!(Blueprint::new().spawn(&mut entities, &mut components).is_err());
        assert!(entities.is_empty());
    }

    #[test]
    fn test_refused_copy_releases_its_slot() {
        let (mut entities, mut components) = setup();
        let light = components.create_standalone(ComponentType::Light).unwrap();

        let owner = entities.create(&mut components).unwrap();
        assert!(entities.delete(owner, &mut components));

        let result = attach_copy(owner, light.as_ref(), &mut entities, &mut components);

        assert!(matches!(result, Err(EcsError::InvalidEntity)));
        assert_eq!(components.block::<Light>().unwrap().len(), 0);
        assert!(components.destroy_standalone(light));
    }
}
