//! # Pine Engine
//!
//! Core of a 3D/2D game engine: slab-allocated component storage, the entity
//! graph and the per-frame physics/update/render orchestration.
//!
//! ## Features
//!
//! - **Component Blocks**: One growable slab per component type with occupancy tracking
//! - **Generational Handles**: Stale component and entity references stop resolving
//! - **Entity Hierarchy**: Parent/child entities with cached world matrices
//! - **Physics Stepping**: Fixed-step 3D and 2D body scenes driven by collider hooks
//! - **Scripting Seam**: Pluggable managed runtime behind [`scripting::ScriptRuntime`]
//! - **Levels & Blueprints**: JSON snapshots of entity subtrees
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pine_engine::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let player = engine.world_mut().create_entity_named("Player")?;
//!         engine.world_mut().add_component::<RigidBody>(player)?;
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default().with_frame_limit(600);
//!     let mut app = MyApp;
//!     Engine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod physics;
pub mod scripting;
pub mod services;
pub mod world;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use config::EngineConfig;
pub use engine::{Engine, EngineError};
pub use world::World;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, Blueprint, Level, LevelSettings},
        config::{BlockGrowth, Config, EngineConfig},
        ecs::{
            components::{
                AudioListener, AudioSource, Camera, Collider, Collider2D, Light, ModelRenderer, NativeBehaviour,
                NativeScript, RigidBody, RigidBody2D, Script, SpriteRenderer, TerrainRenderer, TilemapRenderer,
                Transform,
            },
            Component, ComponentHandle, ComponentKind, ComponentType, Components, EcsError, Entities, Entity,
            EntityKey,
        },
        foundation::{
            math::{Mat4, Quat, Vec2, Vec3, Vec4},
            time::{FrameTimer, Stopwatch},
        },
        physics::BodyKind,
        scripting::{ScriptError, ScriptHandle, ScriptRuntime},
        services::Services,
        AppError, Application, Engine, EngineError, World,
    };
}
