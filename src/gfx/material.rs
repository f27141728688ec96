use glam::Vec4;

use crate::asset::Handle;
use crate::renderer::Texture;

/// Phong surface description referenced by key from drawables.
#[derive(Debug, Clone, PartialEq)]
pub struct PhongMaterialData {
    pub ambient_color: Vec4,
    pub diffuse_color: Vec4,
    pub specular_color: Vec4,
    pub shininess: f32,
    pub ambient_texture: Option<Handle<Texture>>,
    pub diffuse_texture: Option<Handle<Texture>>,
    pub specular_texture: Option<Handle<Texture>>,
}

impl Default for PhongMaterialData {
    fn default() -> Self {
        Self {
            ambient_color: Vec4::new(0.1, 0.1, 0.1, 1.0),
            diffuse_color: Vec4::new(0.7, 0.7, 0.7, 1.0),
            specular_color: Vec4::new(0.2, 0.2, 0.2, 1.0),
            shininess: 80.0,
            ambient_texture: None,
            diffuse_texture: None,
            specular_texture: None,
        }
    }
}

impl PhongMaterialData {
    pub fn with_colors(ambient: Vec4, diffuse: Vec4, specular: Vec4) -> Self {
        Self {
            ambient_color: ambient,
            diffuse_color: diffuse,
            specular_color: specular,
            ..Self::default()
        }
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_ambient_texture(mut self, texture: Handle<Texture>) -> Self {
        self.ambient_texture = Some(texture);
        self
    }

    pub fn with_diffuse_texture(mut self, texture: Handle<Texture>) -> Self {
        self.diffuse_texture = Some(texture);
        self
    }

    pub fn with_specular_texture(mut self, texture: Handle<Texture>) -> Self {
        self.specular_texture = Some(texture);
        self
    }
}
