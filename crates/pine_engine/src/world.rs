//! World orchestration
//!
//! [`World`] is the engine context: it owns the component and entity
//! registries, the physics steppers and the script manager, and drives the
//! per-frame order.
//!
//! ## Frame order
//!
//! ```text
//! update:  physics (3D, 2D) -> scripts OnUpdate -> on_update hooks
//! render:  world matrices -> cameras -> scripts OnRender -> on_render hooks
//! ```
//!
//! While paused, physics keeps stepping (unless `pause_physics` is set) and
//! the scripted/component updates stop. Rendering always runs.

use std::rc::{Rc, Weak};

use crate::assets::{AssetError, Level};
use crate::config::EngineConfig;
use crate::ecs::components::{Camera, Transform};
use crate::ecs::{Component, ComponentHandle, ComponentKind, ComponentType, Components, Entities, EntityKey};
use crate::engine::EngineError;
use crate::foundation::math::Mat4;
use crate::foundation::time::FrameTimer;
use crate::physics::{Physics2D, Physics3D};
use crate::scripting::{ScriptManager, ScriptRuntime};
use crate::services::Services;

/// Engine context owning every entity and component
pub struct World {
    config: EngineConfig,
    services: Services,
    components: Components,
    entities: Entities,
    physics_3d: Physics3D,
    physics_2d: Physics2D,
    scripts: ScriptManager,
    active_level: Option<Weak<Level>>,
    scene_camera: Option<EntityKey>,
    paused: bool,
    time_scale: f32,
    update_timer: FrameTimer,
    render_timer: FrameTimer,
}

impl World {
    /// Create an empty world without a scripting backend
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let services = Services::new(&config);
        Self::with_services(config, services)
    }

    /// Create an empty world that talks to `runtime`
    pub fn with_script_runtime(config: EngineConfig, runtime: Rc<dyn ScriptRuntime>) -> Result<Self, EngineError> {
        let services = Services::new(&config).with_script_runtime(runtime);
        Self::with_services(config, services)
    }

    /// Create an empty world sharing explicit collaborators
    pub fn with_services(config: EngineConfig, services: Services) -> Result<Self, EngineError> {
        config.validate()?;

        let components = Components::new(&config, services.clone())?;
        let entities = Entities::new(services.clone());

        Ok(Self {
            physics_3d: Physics3D::new(config.physics_time_step),
            physics_2d: Physics2D::new(config.physics_time_step),
            config,
            services,
            components,
            entities,
            scripts: ScriptManager::new(),
            active_level: None,
            scene_camera: None,
            paused: false,
            time_scale: 1.0,
            update_timer: FrameTimer::new(),
            render_timer: FrameTimer::new(),
        })
    }

    /// Configuration the world was built with
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared collaborators
    pub const fn services(&self) -> &Services {
        &self.services
    }

    /// Component registry
    pub const fn components(&self) -> &Components {
        &self.components
    }

    /// Component registry, mutable
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// Entity registry
    pub const fn entities(&self) -> &Entities {
        &self.entities
    }

    /// Entity registry, mutable
    pub fn entities_mut(&mut self) -> &mut Entities {
        &mut self.entities
    }

    /// Both registries at once, for operations that need them together
    pub fn ecs_mut(&mut self) -> (&mut Entities, &mut Components) {
        (&mut self.entities, &mut self.components)
    }

    /// Run `on_setup` on every component, then start scripts
    pub fn setup(&mut self) {
        self.components.setup();
        self.scripts.on_start(&mut self.components, &self.entities);

        self.update_timer.reset();
        self.render_timer.reset();

        log::info!("World setup complete ({} entities)", self.entities.len());
    }

    /// Advance the simulation by the wall-clock time since the last update
    ///
    /// The first call after creation or [`Self::setup`] advances by zero.
    pub fn update(&mut self) {
        #[allow(clippy::cast_possible_truncation)]
        let delta_time = self.update_timer.tick() as f32;
        self.update_with_delta(delta_time);
    }

    /// Advance the simulation by `delta_time` seconds, before time scaling
    pub fn update_with_delta(&mut self, delta_time: f32) {
        let delta_time = delta_time * self.time_scale;

        if !(self.paused && self.config.pause_physics) {
            let step = f64::from(delta_time);
            self.physics_3d.update(step, &mut self.components, &self.entities);
            self.physics_2d.update(step, &mut self.components, &self.entities);
        }

        if self.paused {
            return;
        }

        self.scripts.on_update(&mut self.components, &self.entities, delta_time);

        for component_type in ComponentType::ALL {
            self.components
                .for_each_mut(component_type, &self.entities, false, |component| {
                    component.on_update(delta_time);
                });
        }
    }

    /// Prepare a frame using the wall-clock time since the last render
    pub fn render(&mut self) {
        #[allow(clippy::cast_possible_truncation)]
        let delta_time = self.render_timer.tick() as f32;
        self.render_with_delta(delta_time);
    }

    /// Prepare a frame: refresh matrices and run render hooks
    ///
    /// Runs while paused so the last simulated state stays visible.
    pub fn render_with_delta(&mut self, delta_time: f32) {
        self.entities.update_transforms(&mut self.components);
        self.update_cameras();

        self.scripts.on_render(&mut self.components, &self.entities, delta_time);

        for component_type in ComponentType::ALL {
            self.components
                .for_each_mut(component_type, &self.entities, false, |component| {
                    component.on_render(delta_time);
                });
        }
    }

    fn update_cameras(&mut self) {
        for handle in self.components.handles(ComponentType::Camera, &self.entities, false) {
            let Some(world_matrix) = self
                .components
                .get_dyn(handle)
                .and_then(|camera| camera.base().parent())
                .and_then(|key| self.entities.get(key))
                .and_then(|entity| self.components.get::<Transform>(entity.transform()))
                .map(|transform| *transform.transformation_matrix())
            else {
                continue;
            };

            if let Some(camera) = self.components.get_mut::<Camera>(handle) {
                camera.build_matrices(&world_matrix);
            }
        }
    }

    /// Pause or resume scripted updates
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::debug!("World {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// Whether scripted updates are paused
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Multiplier applied to every update delta; negative values clamp to 0
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale.max(0.0);
    }

    /// Current time scale
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Make `level` the active level
    ///
    /// Without `ignore_load` this loads the level, which replaces the world's
    /// contents and calls back here with `ignore_load` set. With it, the
    /// level is only recorded and every world matrix is refreshed.
    pub fn set_active_level(&mut self, level: &Rc<Level>, ignore_load: bool) -> Result<(), AssetError> {
        if !ignore_load {
            return level.load(self);
        }

        self.active_level = Some(Rc::downgrade(level));
        self.scripts.reset();
        self.entities.update_transforms(&mut self.components);
        Ok(())
    }

    /// The active level, if it is still alive
    pub fn active_level(&self) -> Option<Rc<Level>> {
        self.active_level.as_ref().and_then(Weak::upgrade)
    }

    /// Entity whose camera renders the scene
    pub const fn scene_camera(&self) -> Option<EntityKey> {
        self.scene_camera
    }

    /// Choose the scene camera entity
    pub fn set_scene_camera(&mut self, entity: Option<EntityKey>) {
        self.scene_camera = entity;
    }

    /// Refresh the cached world matrix of every Transform
    pub fn update_transforms(&mut self) {
        self.entities.update_transforms(&mut self.components);
    }

    /// World matrix of `entity` computed from the current local transforms
    pub fn world_matrix(&self, entity: EntityKey) -> Option<Mat4> {
        self.entities.world_matrix(entity, &self.components)
    }

    /// Create an entity carrying a Transform
    pub fn create_entity(&mut self) -> Result<EntityKey, EngineError> {
        Ok(self.entities.create(&mut self.components)?)
    }

    /// Create a named entity
    pub fn create_entity_named(&mut self, name: &str) -> Result<EntityKey, EngineError> {
        Ok(self.entities.create_named(name, &mut self.components)?)
    }

    /// Delete an entity with its components and children
    pub fn delete_entity(&mut self, entity: EntityKey) -> bool {
        if self.scene_camera == Some(entity) {
            self.scene_camera = None;
        }
        self.entities.delete(entity, &mut self.components)
    }

    /// Attach a new component of type `T` to `entity`
    pub fn add_component<T: ComponentKind>(&mut self, entity: EntityKey) -> Result<ComponentHandle, EngineError> {
        Ok(self.entities.add_component::<T>(entity, &mut self.components)?)
    }

    /// First component of type `T` on `entity`
    pub fn component<T: ComponentKind>(&self, entity: EntityKey) -> Option<&T> {
        self.entities.component::<T>(entity, &self.components)
    }

    /// First component of type `T` on `entity`, mutable
    pub fn component_mut<T: ComponentKind>(&mut self, entity: EntityKey) -> Option<&mut T> {
        self.entities.component_mut::<T>(entity, &mut self.components)
    }

    /// Delete every entity and tear the component registry down
    pub fn shutdown(&mut self) {
        if self.components.is_shut_down() {
            return;
        }

        self.entities.delete_all(true, &mut self.components);
        self.components.shutdown();
        self.active_level = None;
        self.scene_camera = None;
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.shutdown();
    }
}
