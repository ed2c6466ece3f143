//! Component lifecycle scenarios: slot reuse, growth, copies and bulk deletes

use crate::config::{BlockCapacity, BlockGrowth, EngineConfig};
use crate::ecs::components::{Collider, Light, RigidBody, SpriteRenderer, Transform};
use crate::ecs::{save_component, Component, ComponentType, Components, Entities};
use crate::foundation::math::{Vec3, Vec4};
use crate::physics::BodyKind;
use crate::services::Services;
use crate::world::World;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn registries(config: &EngineConfig) -> (Entities, Components) {
        let services = Services::new(config);
        let components = Components::new(config, services.clone()).unwrap();
        (Entities::new(services), components)
    }

    #[test]
    fn test_destroyed_slot_is_reused() {
        let (entities, mut components) = registries(&EngineConfig::default());

        let first = components.create(ComponentType::Light).unwrap();
        let second = components.create(ComponentType::Light).unwrap();
        assert_eq!((first.index(), second.index()), (0, 1));

        assert!(components.destroy(first));
        let third = components.create(ComponentType::Light).unwrap();

        assert_eq!(third.index(), 0);
        assert_ne!(third.generation(), first.generation());
        assert!(components.get_dyn(first).is_none());
        assert_eq!(components.iter::<Light>(&entities, true).count(), 2);
    }

    #[test]
    fn test_scattered_holes_are_refilled() {
        let (_, mut components) = registries(&EngineConfig::default());
        let handles: Vec<_> = (0..20).map(|_| components.create(ComponentType::Light).unwrap()).collect();

        let holes = [3, 7, 11, 15, 19];
        for &index in &holes {
            assert!(components.destroy(handles[index]));
        }

        let mut refilled: Vec<u32> = (0..holes.len())
            .map(|_| components.create(ComponentType::Light).unwrap().index())
            .collect();
        refilled.sort_unstable();

        assert_eq!(refilled, [3, 7, 11, 15, 19]);
        assert_eq!(components.block::<Light>().unwrap().len(), 20);
    }

    #[test]
    fn test_growth_keeps_components_in_place() {
        let mut config = EngineConfig::default().with_block_growth(BlockGrowth::Fixed(2));
        config.block_capacities.push(BlockCapacity { component: ComponentType::Light, capacity: 4 });
        let (_, mut components) = registries(&config);

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let handle = components.create(ComponentType::Light).unwrap();
                #[allow(clippy::cast_precision_loss)]
                let red = i as f32;
                components.get_mut::<Light>(handle).unwrap().set_color(Vec3::new(red, 0.0, 0.0));
                handle
            })
            .collect();

        let block = components.block::<Light>().unwrap();
        assert_eq!(block.capacity(), 6);

        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(handle.index() as usize, i);
            #[allow(clippy::cast_precision_loss)]
            let expected = i as f32;
            assert_relative_eq!(components.get::<Light>(*handle).unwrap().color().x, expected);
        }
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (_, mut components) = registries(&EngineConfig::default());
        let handle = components.create(ComponentType::Camera).unwrap();

        assert!(components.destroy(handle));
        assert!(!components.destroy(handle));

        let stats = components
            .stats()
            .into_iter()
            .find(|stats| stats.component_type == ComponentType::Camera)
            .unwrap();
        assert_eq!(stats.len, 0);
        assert_eq!(stats.highest_index, None);
    }

    #[test]
    fn test_iteration_skips_holes_and_inactive() {
        let (mut entities, mut components) = registries(&EngineConfig::default());

        let owners: Vec<_> = (0..5).map(|_| entities.create(&mut components).unwrap()).collect();
        let lights: Vec<_> = owners
            .iter()
            .map(|&owner| entities.add_component::<Light>(owner, &mut components).unwrap())
            .collect();

        assert!(entities.remove_component(owners[1], lights[1], &mut components));
        assert!(entities.remove_component(owners[3], lights[3], &mut components));
        components.get_dyn_mut(lights[2]).unwrap().base_mut().set_active(false);

        let active: Vec<u32> = components
            .iter::<Light>(&entities, false)
            .map(|light| light.base().internal_id())
            .collect();
        assert_eq!(active, [0, 4]);

        let all: Vec<u32> = components
            .iter::<Light>(&entities, true)
            .map(|light| light.base().internal_id())
            .collect();
        assert_eq!(all, [0, 2, 4]);

        entities.get_mut(owners[4]).unwrap().set_active(false);
        assert_eq!(components.iter::<Light>(&entities, false).count(), 1);
    }

    #[test]
    #[should_panic(expected = "has no components")]
    fn test_transform_of_componentless_entity_panics() {
        let (mut entities, mut components) = registries(&EngineConfig::default());
        let key = entities.create(&mut components).unwrap();

        entities.get_mut(key).unwrap().components.clear();
        let _ = entities.get(key).unwrap().transform();
    }

    #[test]
    fn test_every_entity_starts_with_transform() {
        let (mut entities, mut components) = registries(&EngineConfig::default());
        let key = entities.create(&mut components).unwrap();
        entities.add_component::<Light>(key, &mut components).unwrap();

        let entity = entities.get(key).unwrap();
        assert_eq!(entity.components()[0].component_type(), ComponentType::Transform);
        assert_eq!(entity.transform(), entity.components()[0]);
        assert!(entities.component::<Transform>(key, &components).is_some());
    }

    #[test]
    fn test_copy_matches_source_data() {
        let mut world = World::new(EngineConfig::default()).unwrap();
        let entity = world.create_entity().unwrap();
        let rigid_body = world.add_component::<RigidBody>(entity).unwrap();
        {
            let source = world.component_mut::<RigidBody>(entity).unwrap();
            source.set_body_type(BodyKind::Kinematic);
            source.set_mass(7.0);
            source.set_gravity_enabled(false);
            source.set_rotation_lock([true, false, true]);
        }

        world.update_with_delta(0.05);
        assert!(world.component::<RigidBody>(entity).unwrap().body().is_some());

        let copy = world.components_mut().copy(rigid_body).unwrap();
        let source = world.components().get_dyn(rigid_body).unwrap();
        let copied = world.components().get::<RigidBody>(copy).unwrap();

        assert_eq!(save_component(copied).unwrap(), save_component(source).unwrap());
        assert_eq!(copied.body(), None);
        assert_eq!(copied.base().parent(), None);
    }

    #[test]
    fn test_standalone_sprite_copy() {
        let (mut entities, mut components) = registries(&EngineConfig::default());

        let owner = entities.create_named("A", &mut components).unwrap();
        let sprite = entities.add_component::<SpriteRenderer>(owner, &mut components).unwrap();
        {
            let source = components.get_mut::<SpriteRenderer>(sprite).unwrap();
            source.set_texture("tex.png");
            source.set_color(Vec4::new(1.0, 0.5, 0.25, 1.0));
        }

        let copy = components.copy_standalone(sprite).unwrap();
        let copied = copy.downcast_ref::<SpriteRenderer>().unwrap();

        assert!(copy.base().standalone());
        assert_eq!(copied.texture(), "tex.png");
        assert_relative_eq!(copied.color().y, 0.5);

        let pooled: Vec<Option<_>> = components
            .iter::<SpriteRenderer>(&entities, true)
            .map(|sprite| sprite.base().parent())
            .collect();
        assert_eq!(pooled, [Some(owner)]);

        assert!(components.destroy_standalone(copy));
        assert_eq!(components.iter::<SpriteRenderer>(&entities, true).count(), 1);
    }

    #[test]
    fn test_bulk_collider_delete() {
        let mut world = World::new(EngineConfig::default()).unwrap();

        let owners: Vec<_> = (0..200)
            .map(|_| {
                let key = world.create_entity().unwrap();
                world.add_component::<Collider>(key).unwrap();
                key
            })
            .collect();

        for key in owners.iter().step_by(2) {
            assert!(world.delete_entity(*key));
        }

        let colliders: Vec<u32> = world
            .components()
            .iter::<Collider>(world.entities(), false)
            .map(|collider| collider.base().internal_id())
            .collect();

        assert_eq!(colliders.len(), 100);
        assert!(colliders.iter().all(|id| id % 2 == 1));
        assert_eq!(world.entities().len(), 100);
    }
}
