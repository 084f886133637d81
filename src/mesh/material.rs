//! Metallic-roughness surface materials.

use serde::{Deserialize, Serialize};

/// A glTF-style PBR material. Tiles copy the materials they reference
/// into their own (compacted) material list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            name: None,
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 0.0,
            roughness_factor: 1.0,
            double_sided: false,
        }
    }
}

impl Material {
    pub fn with_color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Material {
            base_color_factor: [r, g, b, a],
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
