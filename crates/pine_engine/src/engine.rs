//! Core engine implementation

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::{
    application::Application,
    assets::AssetError,
    config::{ConfigError, EngineConfig},
    ecs::EcsError,
    foundation::{logging, time::FrameTimer},
    world::World,
};

/// Main engine struct
///
/// The engine owns the world and drives the main loop.
pub struct Engine {
    /// World containing all entities and components
    pub world: World,

    /// Frame timing
    timer: FrameTimer,

    /// Frames completed by the main loop
    frame_count: u64,

    /// Engine configuration
    config: EngineConfig,

    /// Whether the engine should continue running
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        logging::init_with_level(&config.log_level);
        log::info!("Initializing engine...");

        let world = World::new(config.clone())
            .map_err(|e| EngineError::InitializationFailed(format!("World: {e}")))?;

        Ok(Self {
            world,
            timer: FrameTimer::new(),
            frame_count: 0,
            config,
            running: true,
        })
    }

    /// Run the engine main loop with the given application
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        let mut engine = Self::new(config)?;

        app.initialize(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        engine.world.setup();

        log::info!("Starting main loop...");

        while engine.running {
            let frame_start = Instant::now();

            #[allow(clippy::cast_possible_truncation)]
            let delta_time = engine.timer.tick() as f32;

            app.update(&mut engine, delta_time)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {e}")))?;

            engine.world.update_with_delta(delta_time);
            engine.world.render_with_delta(delta_time);

            app.render(&mut engine)
                .map_err(|e| EngineError::ApplicationError(format!("App render: {e}")))?;

            engine.end_frame(frame_start);
        }

        app.cleanup(&mut engine);
        engine.world.shutdown();

        log::info!("Engine shutdown complete after {} frames", engine.frame_count);
        Ok(())
    }

    fn end_frame(&mut self, frame_start: Instant) {
        self.frame_count += 1;

        if self.config.frame_limit.is_some_and(|limit| self.frame_count >= limit) {
            log::info!("Frame limit of {} reached", self.frame_count);
            self.running = false;
            return;
        }

        if let Some(fps) = self.config.target_fps {
            let budget = Duration::from_secs_f64(1.0 / f64::from(fps));
            if let Some(remaining) = budget.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Get the world
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Get the engine configuration
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f64 {
        self.timer.delta_time()
    }

    /// Frames completed so far
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Component or entity error
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),

    /// Asset system error
    #[error("Asset system error: {0}")]
    Asset(#[from] AssetError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppError;

    #[derive(Default)]
    struct CountingApp {
        updates: u32,
        cleaned_up: bool,
    }

    impl Application for CountingApp {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            engine.world_mut().create_entity_named("Player")?;
            Ok(())
        }

        fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
            self.updates += 1;
            Ok(())
        }

        fn cleanup(&mut self, engine: &mut Engine) {
            self.cleaned_up = engine.world().entities().find_by_name("Player").is_some();
        }
    }

    #[test]
    fn test_run_stops_at_frame_limit() {
        let mut app = CountingApp::default();

        Engine::run(EngineConfig::default().with_frame_limit(3), &mut app).unwrap();

        assert_eq!(app.updates, 3);
        assert!(app.cleaned_up);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_max_object_count(0);

        assert!(matches!(Engine::new(config), Err(EngineError::InitializationFailed(_))));
    }
}
