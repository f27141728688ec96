use glam::{Mat4, Vec3};

use super::keys::shadow_receiver_shader_key;
use crate::asset::Handle;
use crate::renderer::Texture;
use crate::resource::ResourceKey;

/// Bias applied to every newly created receiver variant.
pub const DEFAULT_SHADOW_BIAS: f32 = 0.001;

pub const SHADOW_RECEIVER_UNIFORM_BINDING: u32 = 0;
pub const SHADOW_RECEIVER_TEXTURE_BINDING: u32 = 1;
pub const SHADOW_RECEIVER_SAMPLER_BINDING: u32 = 2;

/// Darkens a surface by sampling a layered shadow map.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowReceiverShader {
    layer_count: u32,
    transformation_projection: Mat4,
    model: Mat4,
    shadowmap_matrices: Vec<Mat4>,
    light_direction: Vec3,
    shadow_bias: f32,
    shadowmap_texture: Option<Handle<Texture>>,
}

impl ShadowReceiverShader {
    pub fn new(layer_count: u32) -> Self {
        Self {
            layer_count,
            transformation_projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
            shadowmap_matrices: vec![Mat4::IDENTITY; layer_count as usize],
            light_direction: Vec3::Z,
            shadow_bias: 0.0,
            shadowmap_texture: None,
        }
    }

    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }

    pub fn variant_key(&self) -> ResourceKey {
        shadow_receiver_shader_key(self.layer_count)
    }

    /// Object-local to clip space.
    pub fn set_transformation_projection_matrix(&mut self, matrix: Mat4) -> &mut Self {
        self.transformation_projection = matrix;
        self
    }

    /// Object-local to world space.
    pub fn set_model_matrix(&mut self, matrix: Mat4) -> &mut Self {
        self.model = matrix;
        self
    }

    /// World to shadow-texture space, one matrix per layer. Extra matrices
    /// beyond the layer count are ignored.
    pub fn set_shadowmap_matrices(&mut self, matrices: &[Mat4]) -> &mut Self {
        if matrices.len() > self.layer_count as usize {
            log::warn!(
                "Shadow receiver has {} layers, ignoring {} extra matrices",
                self.layer_count,
                matrices.len() - self.layer_count as usize
            );
        }
        for (dst, src) in self.shadowmap_matrices.iter_mut().zip(matrices) {
            *dst = *src;
        }
        self
    }

    /// World-space direction towards the light.
    pub fn set_light_direction(&mut self, direction: Vec3) -> &mut Self {
        self.light_direction = direction;
        self
    }

    /// Usually between 0.0001 and 0.001.
    pub fn set_shadow_bias(&mut self, bias: f32) -> &mut Self {
        self.shadow_bias = bias;
        self
    }

    /// `None` unbinds, so a shared variant never keeps another light's map.
    pub fn set_shadowmap_texture(&mut self, texture: Option<Handle<Texture>>) -> &mut Self {
        self.shadowmap_texture = texture;
        self
    }

    pub fn transformation_projection_matrix(&self) -> Mat4 {
        self.transformation_projection
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn shadowmap_matrices(&self) -> &[Mat4] {
        &self.shadowmap_matrices
    }

    pub fn light_direction(&self) -> Vec3 {
        self.light_direction
    }

    pub fn shadow_bias(&self) -> f32 {
        self.shadow_bias
    }

    pub fn shadowmap_texture(&self) -> Option<Handle<Texture>> {
        self.shadowmap_texture
    }

    pub fn wgsl_source(&self) -> String {
        format!(
            "const SHADOW_LAYER_COUNT: u32 = {}u;\nconst SHADOW_LAYER_ARRAY_LEN: u32 = {}u;\n{}",
            self.layer_count,
            self.layer_count.max(1),
            include_str!("../../shader/shadow_receiver.wgsl")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrices_fill_layers_in_order() {
        let mut shader = ShadowReceiverShader::new(2);
        let a = Mat4::from_scale(Vec3::splat(2.0));
        let b = Mat4::from_translation(Vec3::X);
        let c = Mat4::from_translation(Vec3::Y);
        shader.set_shadowmap_matrices(&[a, b, c]);
        assert_eq!(shader.shadowmap_matrices(), &[a, b]);
    }

    #[test]
    fn source_is_specialised_for_layer_count() {
        let source = ShadowReceiverShader::new(3).wgsl_source();
        assert!(source.starts_with("const SHADOW_LAYER_COUNT: u32 = 3u;"));
        assert_eq!(ShadowReceiverShader::new(3).variant_key().as_str(), "shadow-receiver-3");
    }
}
