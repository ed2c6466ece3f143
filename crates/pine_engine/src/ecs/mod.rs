//! Entity-Component storage
//!
//! Components live in typed slab blocks owned by [`Components`]; entities are
//! kept by [`Entities`] and only hold handles into those blocks.

pub mod component;
pub mod components;
pub mod entities;
pub mod entity;
pub mod error;
pub mod registry;
pub mod storage;

#[cfg(test)]
mod tests;

pub use component::{
    load_component, save_component, Component, ComponentBase, ComponentHandle, ComponentKind, ComponentType,
};
pub use entities::Entities;
pub use entity::{Entity, EntityKey};
pub use error::EcsError;
pub use registry::{BlockStats, Components};
pub use storage::{ComponentDataBlock, ComponentDataBlockIter, ComponentDataBlockIterMut, ComponentStorage};
