//! Asset types stored outside the world
//!
//! - [`Blueprint`]: snapshot of an entity subtree, spawnable any number of times
//! - [`Level`]: a set of root blueprints plus scene settings

pub mod blueprint;
pub mod level;

pub use blueprint::{Blueprint, BlueprintEntity};
pub use level::{Level, LevelSettings};

use thiserror::Error;

use crate::ecs::EcsError;

/// Asset loading and saving errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Reading or writing the asset file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The asset document is not valid JSON or has the wrong shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Creating the components or entities of the asset failed
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),

    /// The document parsed but does not describe a valid asset
    #[error("Invalid asset format: {0}")]
    InvalidFormat(String),
}
