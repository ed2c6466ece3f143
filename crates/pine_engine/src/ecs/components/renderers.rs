//! Renderer components
//!
//! Renderers only describe what to draw; the rendering backend walks their
//! blocks with `Components::iter` and reads the owning entity's world matrix.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::math::Vec4;
use crate::foundation::serialization;

/// Draws a model asset
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRenderer {
    base: ComponentBase,
    model: String,
    material_override: Option<String>,
    mesh_index: Option<u32>,
    stencil_override: Option<u8>,
}

impl Default for ModelRenderer {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::ModelRenderer),
            model: String::new(),
            material_override: None,
            mesh_index: None,
            stencil_override: None,
        }
    }
}

impl ModelRenderer {
    /// Model asset path
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Set the model asset path
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// Material replacing the model's own materials
    pub fn material_override(&self) -> Option<&str> {
        self.material_override.as_deref()
    }

    /// Set or clear the material override
    pub fn set_material_override(&mut self, material: Option<String>) {
        self.material_override = material;
    }

    /// Only draw this mesh of the model
    pub const fn mesh_index(&self) -> Option<u32> {
        self.mesh_index
    }

    /// Restrict drawing to one mesh, or draw all with `None`
    pub fn set_mesh_index(&mut self, index: Option<u32>) {
        self.mesh_index = index;
    }

    /// Stencil reference written while drawing, used for outlines
    pub const fn stencil_override(&self) -> Option<u8> {
        self.stencil_override
    }

    /// Set or clear the stencil reference
    pub fn set_stencil_override(&mut self, value: Option<u8>) {
        self.stencil_override = value;
    }
}

impl Component for ModelRenderer {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "model", &mut self.model)?;
        serialization::load(data, "material", &mut self.material_override)?;
        serialization::load(data, "mesh_index", &mut self.mesh_index)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "model", &self.model)?;
        serialization::store(data, "material", &self.material_override)?;
        serialization::store(data, "mesh_index", &self.mesh_index)?;
        Ok(())
    }
}

impl ComponentKind for ModelRenderer {
    const TYPE: ComponentType = ComponentType::ModelRenderer;
}

/// Draws a terrain asset
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainRenderer {
    base: ComponentBase,
    terrain: String,
}

impl Default for TerrainRenderer {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::TerrainRenderer),
            terrain: String::new(),
        }
    }
}

impl TerrainRenderer {
    /// Terrain asset path
    pub fn terrain(&self) -> &str {
        &self.terrain
    }

    /// Set the terrain asset path
    pub fn set_terrain(&mut self, terrain: impl Into<String>) {
        self.terrain = terrain.into();
    }
}

impl Component for TerrainRenderer {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "terrain", &mut self.terrain)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "terrain", &self.terrain)?;
        Ok(())
    }
}

impl ComponentKind for TerrainRenderer {
    const TYPE: ComponentType = ComponentType::TerrainRenderer;
}

/// How a sprite fills the entity's scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpriteScalingMode {
    /// Stretch the texture over the whole quad
    #[default]
    Stretch,
    /// Repeat the texture at its native size
    Repeat,
}

/// Draws a textured quad in the 2D pass
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteRenderer {
    base: ComponentBase,
    texture: String,
    color: Vec4,
    scaling_mode: SpriteScalingMode,
    order: i32,
}

impl Default for SpriteRenderer {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::SpriteRenderer),
            texture: String::new(),
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
            scaling_mode: SpriteScalingMode::default(),
            order: 0,
        }
    }
}

impl SpriteRenderer {
    /// Texture asset path
    pub fn texture(&self) -> &str {
        &self.texture
    }

    /// Set the texture asset path
    pub fn set_texture(&mut self, texture: impl Into<String>) {
        self.texture = texture.into();
    }

    /// Tint colour (RGBA)
    pub const fn color(&self) -> Vec4 {
        self.color
    }

    /// Set the tint colour
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Scaling mode
    pub const fn scaling_mode(&self) -> SpriteScalingMode {
        self.scaling_mode
    }

    /// Set the scaling mode
    pub fn set_scaling_mode(&mut self, mode: SpriteScalingMode) {
        self.scaling_mode = mode;
    }

    /// Draw order, higher draws later
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// Set the draw order
    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Component for SpriteRenderer {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "texture", &mut self.texture)?;
        serialization::load_vec4(data, "color", &mut self.color)?;
        serialization::load(data, "scaling", &mut self.scaling_mode)?;
        serialization::load(data, "order", &mut self.order)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "texture", &self.texture)?;
        serialization::store_vec4(data, "color", &self.color)?;
        serialization::store(data, "scaling", &self.scaling_mode)?;
        serialization::store(data, "order", &self.order)?;
        Ok(())
    }
}

impl ComponentKind for SpriteRenderer {
    const TYPE: ComponentType = ComponentType::SpriteRenderer;
}

/// Draws a tile-map asset in the 2D pass
#[derive(Debug, Clone, PartialEq)]
pub struct TilemapRenderer {
    base: ComponentBase,
    tilemap: String,
    order: i32,
}

impl Default for TilemapRenderer {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::TilemapRenderer),
            tilemap: String::new(),
            order: 0,
        }
    }
}

impl TilemapRenderer {
    /// Tile-map asset path
    pub fn tilemap(&self) -> &str {
        &self.tilemap
    }

    /// Set the tile-map asset path
    pub fn set_tilemap(&mut self, tilemap: impl Into<String>) {
        self.tilemap = tilemap.into();
    }

    /// Draw order, higher draws later
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// Set the draw order
    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Component for TilemapRenderer {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "tilemap", &mut self.tilemap)?;
        serialization::load(data, "order", &mut self.order)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "tilemap", &self.tilemap)?;
        serialization::store(data, "order", &self.order)?;
        Ok(())
    }
}

impl ComponentKind for TilemapRenderer {
    const TYPE: ComponentType = ComponentType::TilemapRenderer;
}
