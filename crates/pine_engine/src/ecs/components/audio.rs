//! Audio components
//!
//! The audio backend polls the playback state of every [`AudioSource`] and
//! positions sounds relative to the active [`AudioListener`].

use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::serialization;
use crate::services::Services;

/// Playback state of an audio source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not playing, restarts from the beginning
    #[default]
    Stopped,
    /// Playing
    Playing,
    /// Paused, resumes where it stopped
    Paused,
}

/// Sound emitter
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    base: ComponentBase,
    clip: String,
    volume: f32,
    looping: bool,
    play_on_start: bool,
    state: PlaybackState,
}

impl Default for AudioSource {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::AudioSource),
            clip: String::new(),
            volume: 1.0,
            looping: false,
            play_on_start: false,
            state: PlaybackState::default(),
        }
    }
}

impl AudioSource {
    /// Audio clip asset path
    pub fn clip(&self) -> &str {
        &self.clip
    }

    /// Set the audio clip
    pub fn set_clip(&mut self, clip: impl Into<String>) {
        self.clip = clip.into();
    }

    /// Volume in `0.0..=1.0`
    pub const fn volume(&self) -> f32 {
        self.volume
    }

    /// Set the volume, clamped to `0.0..=1.0`
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Restart when the clip ends
    pub const fn looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable looping
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Start playing when the world is set up
    pub const fn play_on_start(&self) -> bool {
        self.play_on_start
    }

    /// Enable or disable play on start
    pub fn set_play_on_start(&mut self, enabled: bool) {
        self.play_on_start = enabled;
    }

    /// Current playback state
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Start or resume playback
    pub fn play(&mut self) {
        self.state = PlaybackState::Playing;
    }

    /// Pause playback
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }
}

impl Component for AudioSource {
    component_base!();

    fn on_setup(&mut self, _services: &Services) {
        if self.play_on_start && !self.clip.is_empty() {
            self.play();
        }
    }

    fn on_copied(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "clip", &mut self.clip)?;
        serialization::load(data, "volume", &mut self.volume)?;
        serialization::load(data, "loop", &mut self.looping)?;
        serialization::load(data, "play_on_start", &mut self.play_on_start)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "clip", &self.clip)?;
        serialization::store(data, "volume", &self.volume)?;
        serialization::store(data, "loop", &self.looping)?;
        serialization::store(data, "play_on_start", &self.play_on_start)?;
        Ok(())
    }
}

impl ComponentKind for AudioSource {
    const TYPE: ComponentType = ComponentType::AudioSource;
}

/// Sound receiver, usually on the camera entity
#[derive(Debug, Clone, PartialEq)]
pub struct AudioListener {
    base: ComponentBase,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self { base: ComponentBase::new(ComponentType::AudioListener) }
    }
}

impl Component for AudioListener {
    component_base!();
}

impl ComponentKind for AudioListener {
    const TYPE: ComponentType = ComponentType::AudioListener;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_on_start() {
        let mut source = AudioSource::default();
        source.set_clip("music.ogg");
        source.set_play_on_start(true);

        source.on_setup(&Services::default());
        assert_eq!(source.state(), PlaybackState::Playing);

        source.pause();
        assert_eq!(source.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_pause_when_stopped_stays_stopped() {
        let mut source = AudioSource::default();

        source.pause();
        assert_eq!(source.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut source = AudioSource::default();
        source.set_volume(3.0);

        assert!((source.volume() - 1.0).abs() < f32::EPSILON);
    }
}
