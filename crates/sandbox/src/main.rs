//! Sandbox - falling crates demo
//!
//! Spawns a static floor, a camera and a pile of crates from a blueprint,
//! lets gravity drop them and recycles every crate that falls out of the scene.

use pine_engine::prelude::*;
use rand::Rng;

/// Optional configuration file next to the working directory
const CONFIG_PATH: &str = "sandbox.toml";

/// Crates alive at any time
const CRATE_COUNT: usize = 24;

/// Crates below this height are recycled
const KILL_HEIGHT: f32 = -20.0;

/// Logs once per simulated second
struct Heartbeat {
    elapsed: f32,
}

impl NativeBehaviour for Heartbeat {
    fn on_update(&mut self, delta_time: f32) {
        self.elapsed += delta_time;
        if self.elapsed >= 1.0 {
            self.elapsed = 0.0;
            log::debug!("Heartbeat");
        }
    }
}

#[derive(Default)]
struct Sandbox {
    crate_blueprint: Blueprint,
    crates: Vec<EntityKey>,
    recycled: u32,
}

impl Sandbox {
    fn spawn_floor(world: &mut World) -> Result<(), AppError> {
        let floor = world.create_entity_named("Floor")?;
        world.add_component::<Collider>(floor)?;

        if let Some(collider) = world.component_mut::<Collider>(floor) {
            collider.set_size(Vec3::new(40.0, 1.0, 40.0));
        }
        if let Some(transform) = world.component_mut::<Transform>(floor) {
            transform.set_position(Vec3::new(0.0, -1.0, 0.0));
        }
        if let Some(entity) = world.entities_mut().get_mut(floor) {
            entity.set_static(true);
        }

        Ok(())
    }

    fn spawn_camera(world: &mut World) -> Result<(), AppError> {
        let camera = world.create_entity_named("Camera")?;
        world.add_component::<Camera>(camera)?;
        world.add_component::<AudioListener>(camera)?;

        if let Some(transform) = world.component_mut::<Transform>(camera) {
            transform.set_position(Vec3::new(0.0, 8.0, -25.0));
        }
        world.set_scene_camera(Some(camera));

        Ok(())
    }

    fn build_crate_blueprint(&mut self, world: &mut World) -> Result<(), AppError> {
        let template = world.create_entity_named("Crate")?;
        world.add_component::<RigidBody>(template)?;
        world.add_component::<Collider>(template)?;
        world.add_component::<ModelRenderer>(template)?;

        if let Some(renderer) = world.component_mut::<ModelRenderer>(template) {
            renderer.set_model("models/crate.obj");
        }
        if let Some(rigid_body) = world.component_mut::<RigidBody>(template) {
            rigid_body.set_mass(2.5);
        }

        self.crate_blueprint
            .create_from_entity(template, world.entities(), world.components())
            .map_err(EngineError::from)?;
        world.delete_entity(template);

        Ok(())
    }

    fn spawn_crate(&mut self, world: &mut World) -> Result<(), AppError> {
        let mut rng = rand::thread_rng();

        let (entities, components) = world.ecs_mut();
        let key = self.crate_blueprint.spawn(entities, components).map_err(EngineError::from)?;

        if let Some(transform) = world.component_mut::<Transform>(key) {
            transform.set_position(Vec3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(5.0..30.0),
                rng.gen_range(-10.0..10.0),
            ));
        }

        self.crates.push(key);
        Ok(())
    }

    fn recycle_fallen(&mut self, world: &mut World) -> Result<(), AppError> {
        let fallen: Vec<EntityKey> = self
            .crates
            .iter()
            .copied()
            .filter(|&key| {
                world
                    .component::<Transform>(key)
                    .is_some_and(|transform| transform.position().y < KILL_HEIGHT)
            })
            .collect();

        for key in fallen {
            self.crates.retain(|&entry| entry != key);
            world.delete_entity(key);
            self.recycled += 1;
            self.spawn_crate(world)?;
        }

        Ok(())
    }
}

impl Application for Sandbox {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let world = engine.world_mut();

        Self::spawn_floor(world)?;
        Self::spawn_camera(world)?;
        self.build_crate_blueprint(world)?;

        for _ in 0..CRATE_COUNT {
            self.spawn_crate(world)?;
        }

        let heart = world.create_entity_named("Heart")?;
        world.add_component::<NativeScript>(heart)?;
        if let Some(script) = world.component_mut::<NativeScript>(heart) {
            script.set_behaviour(Box::new(Heartbeat { elapsed: 0.0 }));
        }

        log::info!("Sandbox ready with {} entities", world.entities().len());
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        self.recycle_fallen(engine.world_mut())?;

        if engine.frame_count() % 120 == 0 {
            let world = engine.world();
            let lowest = self
                .crates
                .iter()
                .filter_map(|&key| world.component::<Transform>(key))
                .map(|transform| transform.position().y)
                .fold(f32::INFINITY, f32::min);

            log::info!("Frame {}: lowest crate at y = {:.2}", engine.frame_count(), lowest);
        }

        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        engine.world().components().log_stats();
        self.crate_blueprint.dispose(engine.world().components());

        log::info!("Recycled {} crates", self.recycled);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = if std::path::Path::new(CONFIG_PATH).exists() {
        EngineConfig::load_from_file(CONFIG_PATH)?
    } else {
        EngineConfig::default().with_target_fps(60).with_frame_limit(600)
    };

    let mut app = Sandbox::default();
    Engine::run(config, &mut app)?;

    Ok(())
}
