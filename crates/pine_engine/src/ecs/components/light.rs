//! Light component

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecs::component::component_base;
use crate::ecs::{Component, ComponentBase, ComponentKind, ComponentType, EcsError};
use crate::foundation::math::Vec3;
use crate::foundation::serialization;

/// Kind of light source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightType {
    /// Infinitely distant, lights along the entity's forward axis
    #[default]
    Directional,
    /// Radiates from the entity's position
    PointLight,
    /// Cone along the entity's forward axis
    SpotLight,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    base: ComponentBase,
    light_type: LightType,
    color: Vec3,
    /// Constant, linear and quadratic attenuation factors
    attenuation: Vec3,
    spot_radius: f32,
    spot_cutoff: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            base: ComponentBase::new(ComponentType::Light),
            light_type: LightType::default(),
            color: Vec3::new(1.0, 1.0, 1.0),
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            spot_radius: 12.5,
            spot_cutoff: 17.5,
        }
    }
}

impl Light {
    /// Kind of light
    pub const fn light_type(&self) -> LightType {
        self.light_type
    }

    /// Set the kind of light
    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
    }

    /// Light colour (RGB)
    pub const fn color(&self) -> Vec3 {
        self.color
    }

    /// Set the light colour
    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    /// Attenuation factors
    pub const fn attenuation(&self) -> Vec3 {
        self.attenuation
    }

    /// Set attenuation factors
    pub fn set_attenuation(&mut self, attenuation: Vec3) {
        self.attenuation = attenuation;
    }

    /// Inner spot cone angle in degrees
    pub const fn spot_radius(&self) -> f32 {
        self.spot_radius
    }

    /// Outer spot cone angle in degrees
    pub const fn spot_cutoff(&self) -> f32 {
        self.spot_cutoff
    }

    /// Set the spot cone angles in degrees
    pub fn set_spot_cone(&mut self, radius: f32, cutoff: f32) {
        self.spot_radius = radius;
        self.spot_cutoff = cutoff.max(radius);
    }

    /// Light intensity at `distance` from a point or spot light
    pub fn intensity_at(&self, distance: f32) -> f32 {
        match self.light_type {
            LightType::Directional => 1.0,
            LightType::PointLight | LightType::SpotLight => {
                let falloff = self.attenuation.z.mul_add(
                    distance * distance,
                    self.attenuation.y.mul_add(distance, self.attenuation.x),
                );
                if falloff > 0.0 {
                    1.0 / falloff
                } else {
                    1.0
                }
            }
        }
    }
}

impl Component for Light {
    component_base!();

    fn load_data(&mut self, data: &Value) -> Result<(), EcsError> {
        serialization::load(data, "type", &mut self.light_type)?;
        serialization::load_vec3(data, "color", &mut self.color)?;
        serialization::load_vec3(data, "attenuation", &mut self.attenuation)?;
        serialization::load(data, "spot_radius", &mut self.spot_radius)?;
        serialization::load(data, "spot_cutoff", &mut self.spot_cutoff)?;
        Ok(())
    }

    fn save_data(&self, data: &mut Value) -> Result<(), EcsError> {
        serialization::store(data, "type", &self.light_type)?;
        serialization::store_vec3(data, "color", &self.color)?;
        serialization::store_vec3(data, "attenuation", &self.attenuation)?;
        serialization::store(data, "spot_radius", &self.spot_radius)?;
        serialization::store(data, "spot_cutoff", &self.spot_cutoff)?;
        Ok(())
    }
}

impl ComponentKind for Light {
    const TYPE: ComponentType = ComponentType::Light;
}
