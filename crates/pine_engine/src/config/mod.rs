//! Configuration system
//!
//! Engine settings are plain serde structures that can be loaded from and
//! saved to TOML or RON files, picked by file extension.

pub use serde::{Serialize, Deserialize};

use crate::ecs::ComponentType;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How a component block grows once every slot is occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockGrowth {
    /// Grow by a fixed number of slots
    Fixed(u32),

    /// Double the current capacity
    Doubling,
}

impl Default for BlockGrowth {
    fn default() -> Self {
        Self::Fixed(128)
    }
}

impl BlockGrowth {
    /// Capacity after one growth step from `current`
    pub fn next_capacity(self, current: usize) -> usize {
        match self {
            Self::Fixed(increment) => current + (increment.max(1) as usize),
            Self::Doubling => (current * 2).max(1),
        }
    }
}

/// Initial slot count for one component type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCapacity {
    /// Component type the override applies to
    pub component: ComponentType,

    /// Number of slots allocated up front
    pub capacity: u32,
}

/// # Engine Configuration
///
/// Core engine behavior: logging, component storage sizing, physics stepping
/// and frame pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,

    /// Default number of slots allocated for each component block
    pub max_object_count: u32,

    /// Per-type initial capacities that replace `max_object_count`
    pub block_capacities: Vec<BlockCapacity>,

    /// Growth policy for full component blocks
    pub block_growth: BlockGrowth,

    /// Fixed physics sub-step in seconds
    pub physics_time_step: f64,

    /// Freeze physics while the world is paused
    ///
    /// Off by default: physics keeps stepping while paused and only scripted
    /// updates stop.
    pub pause_physics: bool,

    /// Gravity applied by the 3D physics scene
    pub gravity: [f32; 3],

    /// Gravity applied by the 2D physics scene
    pub gravity_2d: [f32; 2],

    /// Target FPS for frame rate limiting
    pub target_fps: Option<u32>,

    /// Stop the main loop after this many frames
    pub frame_limit: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            max_object_count: 512,
            block_capacities: vec![
                BlockCapacity { component: ComponentType::TerrainRenderer, capacity: 32 },
                BlockCapacity { component: ComponentType::Camera, capacity: 32 },
                BlockCapacity { component: ComponentType::NativeScript, capacity: 1 },
            ],
            block_growth: BlockGrowth::default(),
            physics_time_step: 1.0 / 120.0,
            pause_physics: false,
            gravity: [0.0, -9.81, 0.0],
            gravity_2d: [0.0, -9.81],
            target_fps: None, // Unlimited by default
            frame_limit: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the default block capacity
    pub fn with_max_object_count(mut self, count: u32) -> Self {
        self.max_object_count = count;
        self
    }

    /// Set the block growth policy
    pub fn with_block_growth(mut self, growth: BlockGrowth) -> Self {
        self.block_growth = growth;
        self
    }

    /// Freeze physics while paused
    pub fn with_pause_physics(mut self, enabled: bool) -> Self {
        self.pause_physics = enabled;
        self
    }

    /// Set target FPS
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = Some(fps);
        self
    }

    /// Stop the main loop after `frames` frames
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Initial capacity for a component block
    pub fn block_capacity(&self, component: ComponentType) -> u32 {
        self.block_capacities
            .iter()
            .rev()
            .find(|entry| entry.component == component)
            .map_or(self.max_object_count, |entry| entry.capacity)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_object_count == 0 {
            return Err(ConfigError::Invalid("max_object_count must be at least 1".to_string()));
        }

        if let BlockGrowth::Fixed(0) = self.block_growth {
            return Err(ConfigError::Invalid("fixed block growth must be at least 1".to_string()));
        }

        if !(self.physics_time_step.is_finite() && self.physics_time_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "physics_time_step must be positive, got {}",
                self.physics_time_step
            )));
        }

        if self.target_fps == Some(0) {
            return Err(ConfigError::Invalid("target_fps must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_capacity_overrides() {
        let config = EngineConfig::default();

        assert_eq!(config.block_capacity(ComponentType::Transform), 512);
        assert_eq!(config.block_capacity(ComponentType::Camera), 32);
        assert_eq!(config.block_capacity(ComponentType::NativeScript), 1);
    }

    #[test]
    fn test_growth_policies() {
        assert_eq!(BlockGrowth::Fixed(128).next_capacity(512), 640);
        assert_eq!(BlockGrowth::Doubling.next_capacity(512), 1024);
        assert_eq!(BlockGrowth::Doubling.next_capacity(0), 1);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::default().with_max_object_count(0).validate().is_err());
        assert!(EngineConfig::default()
            .with_block_growth(BlockGrowth::Fixed(0))
            .validate()
            .is_err());

        let mut config = EngineConfig::default();
        config.physics_time_step = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let path = path.to_str().unwrap();

        let config = EngineConfig::default()
            .with_block_growth(BlockGrowth::Doubling)
            .with_pause_physics(true);
        config.save_to_file(path).unwrap();

        assert_eq!(EngineConfig::load_from_file(path).unwrap(), config);
    }

    #[test]
    fn test_ron_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.ron");
        let path = path.to_str().unwrap();

        let config = EngineConfig::default().with_frame_limit(10).with_log_level("debug");
        config.save_to_file(path).unwrap();

        assert_eq!(EngineConfig::load_from_file(path).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("max_object_count = 64\n").unwrap();

        assert_eq!(config.max_object_count, 64);
        assert_eq!(config.block_growth, BlockGrowth::Fixed(128));
        assert!(!config.pause_physics);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.yaml");

        let result = EngineConfig::default().save_to_file(path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
        assert!(!path.exists());
    }
}
