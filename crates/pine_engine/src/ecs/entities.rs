//! Entity registry
//!
//! [`Entities`] keeps every live entity in a generational slot map plus the
//! canonical insertion-ordered key list. Component lifetime is delegated to
//! [`Components`]: creating an entity allocates its Transform, deleting it
//! destroys every attached component and, recursively, every child.

use slotmap::SlotMap;

use super::component::{ComponentHandle, ComponentKind, ComponentType};
use super::components::Transform;
use super::entity::{Entity, EntityKey};
use super::error::EcsError;
use super::registry::Components;
use crate::foundation::math::{self, Mat4, Pose, Vec3, Vec4};
use crate::services::Services;

/// Every live entity, in list order
pub struct Entities {
    entities: SlotMap<EntityKey, Entity>,
    order: Vec<EntityKey>,
    next_id: u32,
    services: Services,
}

impl Default for Entities {
    fn default() -> Self {
        Self::new(Services::default())
    }
}

impl Entities {
    /// Empty registry; ids start at 1
    pub fn new(services: Services) -> Self {
        Self {
            entities: SlotMap::with_key(),
            order: Vec::new(),
            next_id: 1,
            services,
        }
    }

    /// Create an entity carrying a fresh Transform
    pub fn create(&mut self, components: &mut Components) -> Result<EntityKey, EcsError> {
        let transform = components.create(ComponentType::Transform)?;

        let mut entity = Entity::new(self.next_id);
        self.next_id += 1;

        entity.components.push(transform);
        entity.script_handle = self.services.scripts.create_entity_object(entity.id());

        let key = self.entities.insert(entity);
        self.order.push(key);

        if let Some(component) = components.get_dyn_mut(transform) {
            component.base_mut().set_parent(Some(key));
        }

        Ok(key)
    }

    /// Create an entity with a name
    pub fn create_named(&mut self, name: &str, components: &mut Components) -> Result<EntityKey, EcsError> {
        let key = self.create(components)?;
        if let Some(entity) = self.entities.get_mut(key) {
            entity.set_name(name);
        }
        Ok(key)
    }

    /// Create an entity and parent it under `parent`
    pub fn create_child(&mut self, parent: EntityKey, components: &mut Components) -> Result<EntityKey, EcsError> {
        if !self.contains(parent) {
            return Err(EcsError::InvalidEntity);
        }

        let child = self.create(components)?;
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Look up an entity
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Look up an entity, mutable
    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// Whether `key` refers to a live entity
    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when there are no entities
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in list order
    pub fn list(&self) -> &[EntityKey] {
        &self.order
    }

    /// Entities in list order
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> + '_ {
        self.order
            .iter()
            .filter_map(|&key| self.entities.get(key).map(|entity| (key, entity)))
    }

    /// First entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityKey> {
        self.iter().find(|(_, entity)| entity.name() == name).map(|(key, _)| key)
    }

    /// Entity with the given id
    pub fn find_by_id(&self, id: u32) -> Option<EntityKey> {
        self.iter().find(|(_, entity)| entity.id() == id).map(|(key, _)| key)
    }

    /// Move an entity to position `new_index` of the list
    pub fn move_entity(&mut self, key: EntityKey, new_index: usize) -> Result<(), EcsError> {
        let current = self
            .order
            .iter()
            .position(|&entry| entry == key)
            .ok_or(EcsError::InvalidEntity)?;

        if new_index >= self.order.len() {
            return Err(EcsError::IndexOutOfRange { index: new_index, len: self.order.len() });
        }

        let key = self.order.remove(current);
        self.order.insert(new_index, key);
        Ok(())
    }

    /// Delete an entity, its components and all of its children
    ///
    /// Returns false if `key` is not a live entity.
    pub fn delete(&mut self, key: EntityKey, components: &mut Components) -> bool {
        let Some(entity) = self.entities.remove(key) else {
            return false;
        };

        if let Some(parent) = entity.parent.and_then(|parent| self.entities.get_mut(parent)) {
            parent.children.retain(|&child| child != key);
        }
        self.order.retain(|&entry| entry != key);

        for handle in &entity.components {
            components.destroy(*handle);
        }

        for child in &entity.children {
            self.delete(*child, components);
        }

        if let Some(peer) = entity.script_handle {
            self.services.scripts.dispose_object(peer);
        }

        true
    }

    /// Delete every entity, keeping temporary ones unless `include_temporary`
    ///
    /// Returns the number of entities removed, children included.
    pub fn delete_all(&mut self, include_temporary: bool, components: &mut Components) -> usize {
        let before = self.len();

        components.set_defer_highest_index(true);

        let keys: Vec<EntityKey> = self.order.clone();
        for key in keys {
            let Some(entity) = self.entities.get(key) else {
                continue;
            };
            if entity.temporary() && !include_temporary {
                continue;
            }
            self.delete(key, components);
        }

        components.set_defer_highest_index(false);
        components.recompute_highest_indices();

        before - self.len()
    }

    /// Create a component of type `T` and attach it
    pub fn add_component<T: ComponentKind>(
        &mut self,
        key: EntityKey,
        components: &mut Components,
    ) -> Result<ComponentHandle, EcsError> {
        self.add_component_of(key, T::TYPE, components)
    }

    /// Create a component of `component_type` and attach it
    ///
    /// A second Transform is rejected with [`EcsError::DuplicateTransform`].
    pub fn add_component_of(
        &mut self,
        key: EntityKey,
        component_type: ComponentType,
        components: &mut Components,
    ) -> Result<ComponentHandle, EcsError> {
        let entity = self.entities.get(key).ok_or(EcsError::InvalidEntity)?;
        if component_type == ComponentType::Transform && entity.has_component(ComponentType::Transform) {
            return Err(EcsError::DuplicateTransform);
        }

        let handle = components.create(component_type)?;
        self.attach_component(key, handle, components)?;
        Ok(handle)
    }

    /// Attach an existing pooled component, detaching it from its previous owner
    pub fn attach_component(
        &mut self,
        key: EntityKey,
        handle: ComponentHandle,
        components: &mut Components,
    ) -> Result<(), EcsError> {
        let entity = self.entities.get(key).ok_or(EcsError::InvalidEntity)?;
        if handle.component_type() == ComponentType::Transform && entity.has_component(ComponentType::Transform) {
            return Err(EcsError::DuplicateTransform);
        }

        let component = components
            .get_dyn_mut(handle)
            .ok_or(EcsError::InvalidHandle(handle.component_type()))?;

        if let Some(previous) = component.base().parent().and_then(|owner| self.entities.get_mut(owner)) {
            previous.components.retain(|&attached| attached != handle);
        }
        component.base_mut().set_parent(Some(key));

        if let Some(entity) = self.entities.get_mut(key) {
            entity.components.push(handle);
        }

        Ok(())
    }

    /// Detach and destroy a component
    ///
    /// Returns false if the entity does not own `handle` or `handle` is the
    /// entity's Transform.
    pub fn remove_component(&mut self, key: EntityKey, handle: ComponentHandle, components: &mut Components) -> bool {
        let Some(entity) = self.entities.get_mut(key) else {
            return false;
        };
        let Some(position) = entity.components.iter().position(|&attached| attached == handle) else {
            return false;
        };

        if position == 0 && handle.component_type() == ComponentType::Transform {
            log::warn!("Refusing to remove the Transform of entity {}", entity.id());
            return false;
        }

        entity.components.remove(position);
        components.destroy(handle);
        true
    }

    /// Destroy every component except the Transform
    pub fn clear_components(&mut self, key: EntityKey, components: &mut Components) -> bool {
        let Some(entity) = self.entities.get_mut(key) else {
            return false;
        };

        let keep = usize::from(!entity.components.is_empty());
        for handle in entity.components.drain(keep..) {
            components.destroy(handle);
        }

        true
    }

    /// Typed lookup of the first component of type `T` on an entity
    pub fn component<'a, T: ComponentKind>(&self, key: EntityKey, components: &'a Components) -> Option<&'a T> {
        let handle = self.entities.get(key)?.component(T::TYPE)?;
        components.get::<T>(handle)
    }

    /// Typed lookup of the first component of type `T` on an entity, mutable
    pub fn component_mut<'a, T: ComponentKind>(
        &self,
        key: EntityKey,
        components: &'a mut Components,
    ) -> Option<&'a mut T> {
        let handle = self.entities.get(key)?.component(T::TYPE)?;
        components.get_mut::<T>(handle)
    }

    /// Make `child` a child of `parent`, unlinking it from its previous parent
    ///
    /// Fails with [`EcsError::HierarchyCycle`] if `child` is `parent` or one
    /// of its ancestors.
    pub fn add_child(&mut self, parent: EntityKey, child: EntityKey) -> Result<(), EcsError> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(EcsError::InvalidEntity);
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(EcsError::HierarchyCycle);
            }
            ancestor = self.entities.get(current).and_then(Entity::parent);
        }

        let previous = self.entities.get(child).and_then(Entity::parent);
        if let Some(previous) = previous.and_then(|previous| self.entities.get_mut(previous)) {
            previous.children.retain(|&entry| entry != child);
        }

        if let Some(entity) = self.entities.get_mut(child) {
            entity.parent = Some(parent);
        }
        if let Some(entity) = self.entities.get_mut(parent) {
            entity.children.push(child);
        }

        Ok(())
    }

    /// Unlink `child` from `parent` without destroying it
    pub fn remove_child(&mut self, parent: EntityKey, child: EntityKey) -> bool {
        let Some(entity) = self.entities.get_mut(parent) else {
            return false;
        };
        let Some(position) = entity.children.iter().position(|&entry| entry == child) else {
            return false;
        };

        entity.children.remove(position);
        if let Some(child) = self.entities.get_mut(child) {
            child.parent = None;
        }

        true
    }

    /// World matrix of an entity: the parent chain's matrices times the local TRS
    pub fn world_matrix(&self, key: EntityKey, components: &Components) -> Option<Mat4> {
        let mut matrix = Mat4::identity();
        let mut current = Some(key);

        while let Some(entity_key) = current {
            let entity = self.entities.get(entity_key)?;
            let local = entity
                .component(ComponentType::Transform)
                .and_then(|handle| components.get::<Transform>(handle))
                .map_or_else(Mat4::identity, Transform::local_matrix);

            matrix = local * matrix;
            current = entity.parent();
        }

        Some(matrix)
    }

    /// World position and rotation of an entity
    pub fn world_pose(&self, key: EntityKey, components: &Components) -> Option<Pose> {
        let position = math::matrix_translation(&self.world_matrix(key, components)?);

        let mut rotation = math::Quat::identity();
        let mut current = Some(key);
        while let Some(entity_key) = current {
            let entity = self.entities.get(entity_key)?;
            if let Some(transform) = entity
                .component(ComponentType::Transform)
                .and_then(|handle| components.get::<Transform>(handle))
            {
                rotation = transform.rotation() * rotation;
            }
            current = entity.parent();
        }

        Some(Pose::new(position, rotation))
    }

    /// Move an entity so that its world pose equals `pose`
    ///
    /// The Transform's local values are solved against the parent's world
    /// pose. Returns false if the entity or its Transform is gone.
    pub fn set_world_pose(&self, key: EntityKey, pose: Pose, components: &mut Components) -> bool {
        let Some(entity) = self.entities.get(key) else {
            return false;
        };

        let (position, rotation) = match entity.parent() {
            Some(parent) => {
                let Some(parent_matrix) = self.world_matrix(parent, components) else {
                    return false;
                };
                let Some(parent_pose) = self.world_pose(parent, components) else {
                    return false;
                };
                let Some(inverse) = parent_matrix.try_inverse() else {
                    return false;
                };

                let local = inverse * Vec4::new(pose.position.x, pose.position.y, pose.position.z, 1.0);
                (Vec3::new(local.x, local.y, local.z), parent_pose.rotation.inverse() * pose.rotation)
            }
            None => (pose.position, pose.rotation),
        };

        let Some(transform) = entity
            .component(ComponentType::Transform)
            .and_then(|handle| components.get_mut::<Transform>(handle))
        else {
            return false;
        };

        transform.set_position(position);
        transform.set_rotation(rotation);
        true
    }

    /// Refresh the cached world matrix of every Transform
    pub fn update_transforms(&self, components: &mut Components) {
        for (key, entity) in self.iter() {
            if entity.parent().is_some() {
                continue;
            }
            self.update_transform_tree(key, &Mat4::identity(), components);
        }
    }

    fn update_transform_tree(&self, key: EntityKey, parent_matrix: &Mat4, components: &mut Components) {
        let Some(entity) = self.entities.get(key) else {
            return;
        };

        let mut matrix = *parent_matrix;
        if let Some(transform) = entity
            .component(ComponentType::Transform)
            .and_then(|handle| components.get_mut::<Transform>(handle))
        {
            matrix = parent_matrix * transform.local_matrix();
            transform.set_transformation_matrix(matrix);
        }

        for &child in entity.children() {
            self.update_transform_tree(child, &matrix, components);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ecs::components::Light;
    use approx::assert_relative_eq;

    fn setup() -> (Entities, Components) {
        let services = Services::default();
        let components = Components::new(&EngineConfig::default(), services.clone()).unwrap();
        (Entities::new(services), components)
    }

    #[test]
    fn test_ids_start_at_one() {
        let (mut entities, mut components) = setup();
        let first = entities.create(&mut components).unwrap();
        let second = entities.create(&mut components).unwrap();

        assert_eq!(entities.get(first).unwrap().id(), 1);
        assert_eq!(entities.get(second).unwrap().id(), 2);
        assert_eq!(entities.find_by_id(2), Some(second));
    }

    #[test]
    fn test_transform_is_first_component() {
        let (mut entities, mut components) = setup();
        let key = entities.create(&mut components).unwrap();
        entities.add_component::<Light>(key, &mut components).unwrap();

        let entity = entities.get(key).unwrap();
        assert_eq!(entity.transform().component_type(), ComponentType::Transform);
        assert_eq!(components.get_dyn(entity.transform()).unwrap().base().parent(), Some(key));
    }

    #[test]
    fn test_second_transform_rejected() {
        let (mut entities, mut components) = setup();
        let key = entities.create(&mut components).unwrap();

        let result = entities.add_component::<Transform>(key, &mut components);
        assert!(matches!(result, Err(EcsError::DuplicateTransform)));
        assert_eq!(entities.get(key).unwrap().components().len(), 1);
    }

    #[test]
    fn test_remove_component() {
        let (mut entities, mut components) = setup();
        let key = entities.create(&mut components).unwrap();
        let light = entities.add_component::<Light>(key, &mut components).unwrap();
        let transform = entities.get(key).unwrap().transform();

        assert!(!entities.remove_component(key, transform, &mut components));
        assert!(entities.remove_component(key, light, &mut components));
        assert!(!entities.remove_component(key, light, &mut components));
        assert!(!components.contains(light));
    }

    #[test]
    fn test_clear_components_keeps_transform() {
        let (mut entities, mut components) = setup();
        let key = entities.create(&mut components).unwrap();
        let light = entities.add_component::<Light>(key, &mut components).unwrap();

        assert!(entities.clear_components(key, &mut components));

        let entity = entities.get(key).unwrap();
        assert_eq!(entity.components().len(), 1);
        assert!(components.contains(entity.transform()));
        assert!(!components.contains(light));
    }

    #[test]
    fn test_delete_is_recursive() {
        let (mut entities, mut components) = setup();
        let root = entities.create_named("root", &mut components).unwrap();
        let child = entities.create_child(root, &mut components).unwrap();
        let grandchild = entities.create_child(child, &mut components).unwrap();
        let child_transform = entities.get(child).unwrap().transform();

        assert!(entities.delete(root, &mut components));

        assert!(entities.is_empty());
        assert!(!entities.contains(grandchild));
        assert!(!components.contains(child_transform));
        assert!(!entities.delete(root, &mut components));
    }

    #[test]
    fn test_delete_child_unlinks_parent() {
        let (mut entities, mut components) = setup();
        let root = entities.create(&mut components).unwrap();
        let child = entities.create_child(root, &mut components).unwrap();

        entities.delete(child, &mut components);

        assert!(entities.get(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_delete_all_keeps_temporary() {
        let (mut entities, mut components) = setup();
        let kept = entities.create(&mut components).unwrap();
        entities.get_mut(kept).unwrap().set_temporary(true);
        entities.create(&mut components).unwrap();
        entities.create(&mut components).unwrap();

        assert_eq!(entities.delete_all(false, &mut components), 2);
        assert_eq!(entities.list(), &[kept]);

        assert_eq!(entities.delete_all(true, &mut components), 1);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_hierarchy_cycle_rejected() {
        let (mut entities, mut components) = setup();
        let root = entities.create(&mut components).unwrap();
        let child = entities.create_child(root, &mut components).unwrap();

        assert!(matches!(entities.add_child(child, root), Err(EcsError::HierarchyCycle)));
        assert!(matches!(entities.add_child(root, root), Err(EcsError::HierarchyCycle)));
    }

    #[test]
    fn test_reparenting_and_remove_child() {
        let (mut entities, mut components) = setup();
        let first = entities.create(&mut components).unwrap();
        let second = entities.create(&mut components).unwrap();
        let child = entities.create_child(first, &mut components).unwrap();

        entities.add_child(second, child).unwrap();
        assert!(entities.get(first).unwrap().children().is_empty());
        assert_eq!(entities.get(child).unwrap().parent(), Some(second));

        assert!(entities.remove_child(second, child));
        assert!(!entities.remove_child(second, child));
        assert!(entities.contains(child));
        assert_eq!(entities.get(child).unwrap().parent(), None);
    }

    #[test]
    fn test_move_entity() {
        let (mut entities, mut components) = setup();
        let a = entities.create(&mut components).unwrap();
        let b = entities.create(&mut components).unwrap();
        let c = entities.create(&mut components).unwrap();

        entities.move_entity(c, 0).unwrap();
        assert_eq!(entities.list(), &[c, a, b]);

        assert!(matches!(entities.move_entity(a, 3), Err(EcsError::IndexOutOfRange { index: 3, len: 3 })));
    }

    #[test]
    fn test_find_by_name() {
        let (mut entities, mut components) = setup();
        entities.create(&mut components).unwrap();
        let player = entities.create_named("Player", &mut components).unwrap();

        assert_eq!(entities.find_by_name("Player"), Some(player));
        assert_eq!(entities.find_by_name("Enemy"), None);
    }

    #[test]
    fn test_world_matrix_composes_parent() {
        let (mut entities, mut components) = setup();
        let parent = entities.create(&mut components).unwrap();
        let child = entities.create_child(parent, &mut components).unwrap();

        let transform = entities.component_mut::<Transform>(parent, &mut components).unwrap();
        transform.set_position(Vec3::new(10.0, 0.0, 0.0));
        transform.set_euler_angles(&Vec3::new(0.0, 90.0, 0.0));
        entities
            .component_mut::<Transform>(child, &mut components)
            .unwrap()
            .set_position(Vec3::new(0.0, 0.0, 1.0));

        let matrix = entities.world_matrix(child, &components).unwrap();
        assert_relative_eq!(math::matrix_translation(&matrix), Vec3::new(11.0, 0.0, 0.0), epsilon = 1e-5);

        entities.update_transforms(&mut components);
        let cached = entities.component::<Transform>(child, &components).unwrap().world_position();
        assert_relative_eq!(cached, Vec3::new(11.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_set_world_pose_solves_local() {
        let (mut entities, mut components) = setup();
        let parent = entities.create(&mut components).unwrap();
        let child = entities.create_child(parent, &mut components).unwrap();
        entities
            .component_mut::<Transform>(parent, &mut components)
            .unwrap()
            .set_position(Vec3::new(5.0, 0.0, 0.0));

        let pose = Pose::new(Vec3::new(5.0, 3.0, 0.0), math::Quat::identity());
        assert!(entities.set_world_pose(child, pose, &mut components));

        let local = entities.component::<Transform>(child, &components).unwrap().position();
        assert_relative_eq!(local, Vec3::new(0.0, 3.0, 0.0), epsilon = 1e-5);
    }
}
