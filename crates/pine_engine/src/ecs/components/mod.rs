//! Built-in component types
//!
//! One concrete type per [`ComponentType`]. Each implements [`Component`] for
//! its hooks and serialization and [`ComponentKind`] for its type tag.

pub mod audio;
pub mod camera;
pub mod collider;
pub mod light;
pub mod renderers;
pub mod rigid_body;
pub mod script;
pub mod transform;

pub use audio::{AudioListener, AudioSource, PlaybackState};
pub use camera::{Camera, CameraType};
pub use collider::{Collider, Collider2D, Collider2DType, ColliderLayers, ColliderType};
pub use light::{Light, LightType};
pub use renderers::{ModelRenderer, SpriteRenderer, SpriteScalingMode, TerrainRenderer, TilemapRenderer};
pub use rigid_body::{RigidBody, RigidBody2D};
pub use script::{NativeBehaviour, NativeScript, Script};
pub use transform::Transform;

use super::component::{Component, ComponentKind, ComponentType};
use super::error::EcsError;
use super::storage::{ComponentDataBlock, ComponentStorage};
use crate::config::BlockGrowth;

fn boxed_block<T: ComponentKind>(capacity: usize, growth: BlockGrowth) -> Result<Box<dyn ComponentStorage>, EcsError> {
    Ok(Box::new(ComponentDataBlock::<T>::new(capacity, growth)?))
}

/// Allocate the block backing `component_type`
pub(crate) fn new_block(
    component_type: ComponentType,
    capacity: usize,
    growth: BlockGrowth,
) -> Result<Box<dyn ComponentStorage>, EcsError> {
    match component_type {
        ComponentType::Transform => boxed_block::<Transform>(capacity, growth),
        ComponentType::ModelRenderer => boxed_block::<ModelRenderer>(capacity, growth),
        ComponentType::TerrainRenderer => boxed_block::<TerrainRenderer>(capacity, growth),
        ComponentType::Camera => boxed_block::<Camera>(capacity, growth),
        ComponentType::Light => boxed_block::<Light>(capacity, growth),
        ComponentType::Collider => boxed_block::<Collider>(capacity, growth),
        ComponentType::RigidBody => boxed_block::<RigidBody>(capacity, growth),
        ComponentType::Collider2D => boxed_block::<Collider2D>(capacity, growth),
        ComponentType::RigidBody2D => boxed_block::<RigidBody2D>(capacity, growth),
        ComponentType::SpriteRenderer => boxed_block::<SpriteRenderer>(capacity, growth),
        ComponentType::TilemapRenderer => boxed_block::<TilemapRenderer>(capacity, growth),
        ComponentType::NativeScript => boxed_block::<NativeScript>(capacity, growth),
        ComponentType::Script => boxed_block::<Script>(capacity, growth),
        ComponentType::AudioSource => boxed_block::<AudioSource>(capacity, growth),
        ComponentType::AudioListener => boxed_block::<AudioListener>(capacity, growth),
    }
}

/// Fresh default instance of `component_type`, outside any block
pub fn new_component(component_type: ComponentType) -> Box<dyn Component> {
    match component_type {
        ComponentType::Transform => Box::new(Transform::default()),
        ComponentType::ModelRenderer => Box::new(ModelRenderer::default()),
        ComponentType::TerrainRenderer => Box::new(TerrainRenderer::default()),
        ComponentType::Camera => Box::new(Camera::default()),
        ComponentType::Light => Box::new(Light::default()),
        ComponentType::Collider => Box::new(Collider::default()),
        ComponentType::RigidBody => Box::new(RigidBody::default()),
        ComponentType::Collider2D => Box::new(Collider2D::default()),
        ComponentType::RigidBody2D => Box::new(RigidBody2D::default()),
        ComponentType::SpriteRenderer => Box::new(SpriteRenderer::default()),
        ComponentType::TilemapRenderer => Box::new(TilemapRenderer::default()),
        ComponentType::NativeScript => Box::new(NativeScript::default()),
        ComponentType::Script => Box::new(Script::default()),
        ComponentType::AudioSource => Box::new(AudioSource::default()),
        ComponentType::AudioListener => Box::new(AudioListener::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_matching_type_tag() {
        for component_type in ComponentType::ALL {
            assert_eq!(new_component(component_type).component_type(), component_type);
        }
    }

    #[test]
    fn test_blocks_store_matching_type() {
        for component_type in ComponentType::ALL {
            let block = new_block(component_type, 1, BlockGrowth::default()).unwrap();
            assert_eq!(block.component_type(), component_type);
        }
    }
}
