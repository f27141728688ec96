use glam::Mat4;

use super::keys::shadow_caster_shader_key;
use crate::resource::ResourceKey;

/// Depth-only program used when rendering into shadow maps.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowCasterShader {
    transformation: Mat4,
}

impl Default for ShadowCasterShader {
    fn default() -> Self {
        Self::new()
    }
}

impl ShadowCasterShader {
    pub fn new() -> Self {
        Self {
            transformation: Mat4::IDENTITY,
        }
    }

    pub fn variant_key(&self) -> ResourceKey {
        shadow_caster_shader_key()
    }

    /// Object-local to shadow clip space.
    pub fn set_transformation_matrix(&mut self, matrix: Mat4) -> &mut Self {
        self.transformation = matrix;
        self
    }

    pub fn transformation_matrix(&self) -> Mat4 {
        self.transformation
    }

    pub fn wgsl_source(&self) -> String {
        include_str!("../../shader/shadow_caster.wgsl").to_string()
    }
}
