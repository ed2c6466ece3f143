//! Level asset
//!
//! A level is a list of root [`Blueprint`]s plus scene settings. Loading a
//! level replaces every non-temporary entity in the world with the level's
//! contents.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AssetError, Blueprint};
use crate::ecs::{Components, EcsError, EntityKey};
use crate::foundation::math::{Vec3, Vec4};
use crate::world::World;

/// Scene-wide settings stored with a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    /// Ambient light colour
    pub ambient_color: Vec3,

    /// Fog colour
    pub fog_color: Vec4,

    /// Distance at which fog starts
    pub fog_distance: f32,

    /// Fog density, 0 disables fog
    pub fog_intensity: f32,

    /// Spawn-order index of the entity holding the scene camera
    pub camera_entity: Option<usize>,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::new(0.05, 0.05, 0.05),
            fog_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            fog_distance: 30.0,
            fog_intensity: 0.0,
            camera_entity: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LevelDocument {
    #[serde(default)]
    blueprints: Vec<Value>,
    #[serde(default)]
    settings: LevelSettings,
}

/// Saved world contents
#[derive(Default)]
pub struct Level {
    blueprints: Vec<Blueprint>,
    settings: LevelSettings,
}

impl Level {
    /// Empty level
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of root blueprints
    pub fn blueprint_count(&self) -> usize {
        self.blueprints.len()
    }

    /// Root blueprints in spawn order
    pub fn blueprints(&self) -> &[Blueprint] {
        &self.blueprints
    }

    /// Scene settings
    pub const fn settings(&self) -> &LevelSettings {
        &self.settings
    }

    /// Scene settings, mutable
    pub fn settings_mut(&mut self) -> &mut LevelSettings {
        &mut self.settings
    }

    /// Snapshot every non-temporary root entity of `world`
    ///
    /// Children are captured through their root. The world's scene camera
    /// is remembered by its position in spawn order.
    pub fn create_from_world(&mut self, world: &World) -> Result<(), EcsError> {
        let entities = world.entities();
        let components = world.components();

        let roots: Vec<EntityKey> = entities
            .iter()
            .filter(|(_, entity)| entity.parent().is_none() && !entity.temporary())
            .map(|(key, _)| key)
            .collect();

        let mut blueprints = Vec::with_capacity(roots.len());
        for &root in &roots {
            let mut blueprint = Blueprint::new();
            blueprint.create_from_entity(root, entities, components)?;
            blueprints.push(blueprint);
        }

        let mut spawn_order = Vec::new();
        for &root in &roots {
            collect_subtree(root, world, &mut spawn_order);
        }
        self.settings.camera_entity = world
            .scene_camera()
            .and_then(|camera| spawn_order.iter().position(|&key| key == camera));

        self.clear_blueprints(components);
        self.blueprints = blueprints;

        log::info!("Captured level with {} root entities", self.blueprints.len());
        Ok(())
    }

    /// Replace the world's contents with this level and make it active
    ///
    /// Temporary entities survive. A blueprint that fails to spawn aborts
    /// the load; entities spawned before it stay in the world.
    pub fn load(self: &Rc<Self>, world: &mut World) -> Result<(), AssetError> {
        let removed = {
            let (entities, components) = world.ecs_mut();
            entities.delete_all(false, components)
        };
        log::debug!("Level load removed {} entities", removed);

        let offset = world.entities().len();
        for blueprint in &self.blueprints {
            let (entities, components) = world.ecs_mut();
            blueprint.spawn(entities, components)?;
        }

        let camera = self
            .settings
            .camera_entity
            .and_then(|index| world.entities().list().get(offset + index).copied());
        world.set_scene_camera(camera);

        world.set_active_level(self, true)?;

        log::info!("Loaded level ({} entities)", world.entities().len());
        Ok(())
    }

    /// Release every stored blueprint
    pub fn clear_blueprints(&mut self, components: &Components) {
        for blueprint in &mut self.blueprints {
            blueprint.dispose(components);
        }
        self.blueprints.clear();
    }

    /// Serialize blueprints and settings
    pub fn to_json(&self) -> Result<Value, AssetError> {
        let blueprints = self
            .blueprints
            .iter()
            .map(Blueprint::to_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(serde_json::to_value(LevelDocument {
            blueprints,
            settings: self.settings.clone(),
        })?)
    }

    /// Rebuild a level from [`Self::to_json`] output
    pub fn from_json(data: &Value, components: &Components) -> Result<Self, AssetError> {
        let document = LevelDocument::deserialize(data)?;

        let blueprints = document
            .blueprints
            .iter()
            .map(|blueprint| Blueprint::from_json(blueprint, components))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { blueprints, settings: document.settings })
    }

    /// Write the level as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), AssetError> {
        let content = serde_json::to_string_pretty(&self.to_json()?)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read a level written by [`Self::save_to_file`]
    pub fn load_from_file<P: AsRef<Path>>(path: P, components: &Components) -> Result<Self, AssetError> {
        let content = fs::read_to_string(path)?;
        let data: Value = serde_json::from_str(&content)?;
        Self::from_json(&data, components)
    }
}

fn collect_subtree(key: EntityKey, world: &World, order: &mut Vec<EntityKey>) {
    order.push(key);
    if let Some(entity) = world.entities().get(key) {
        for &child in entity.children() {
            collect_subtree(child, world, order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ecs::components::{Camera, Light};

    fn populated_world() -> World {
        let mut world = World::new(EngineConfig::default()).unwrap();

        let lamp = world.create_entity_named("Lamp").unwrap();
        world.add_component::<Light>(lamp).unwrap();

        let camera = world.create_entity_named("Camera").unwrap();
        world.add_component::<Camera>(camera).unwrap();
        world.set_scene_camera(Some(camera));

        let marker = world.create_entity_named("Marker").unwrap();
        world.entities_mut().get_mut(marker).unwrap().set_temporary(true);

        world
    }

    #[test]
    fn test_create_from_world_skips_temporary() {
        let world = populated_world();

        let mut level = Level::new();
        level.create_from_world(&world).unwrap();

        assert_eq!(level.blueprint_count(), 2);
        assert_eq!(level.settings().camera_entity, Some(1));
    }

    #[test]
    fn test_load_replaces_world_contents() {
        let mut world = populated_world();

        let mut level = Level::new();
        level.create_from_world(&world).unwrap();
        let level = Rc::new(level);

        world.create_entity_named("Extra").unwrap();
        level.load(&mut world).unwrap();

        let names: Vec<&str> = world.entities().iter().map(|(_, entity)| entity.name()).collect();
        assert_eq!(names, ["Marker", "Lamp", "Camera"]);

        let camera = world.scene_camera().unwrap();
        assert_eq!(world.entities().get(camera).unwrap().name(), "Camera");
        assert!(Rc::ptr_eq(&world.active_level().unwrap(), &level));
    }

    #[test]
    fn test_file_roundtrip() {
        let world = populated_world();
        let mut level = Level::new();
        level.create_from_world(&world).unwrap();
        level.settings_mut().fog_intensity = 0.5;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.json");
        level.save_to_file(&path).unwrap();

        let loaded = Level::load_from_file(&path, world.components()).unwrap();
        assert_eq!(loaded.blueprint_count(), 2);
        assert_eq!(loaded.settings(), level.settings());
    }
}
