use glam::Mat4;

use super::drawable::{DrawContext, Drawable};
use super::shaders::{shadow_caster_shader_key, ShadowCasterShader};
use crate::asset::{Handle, Mesh};
use crate::renderer::ShaderProgram;
use crate::resource::{Resource, ResourceDataState, ResourcePolicy, ShaderManager};
use crate::scene::Camera;

/// Depth-only drawable rendered from a shadow light's point of view.
pub struct ShadowCasterDrawable {
    node: hecs::Entity,
    mesh: Handle<Mesh>,
    shader: Resource<ShadowCasterShader>,
}

impl ShadowCasterDrawable {
    pub fn new(node: hecs::Entity, mesh: Handle<Mesh>, shader_manager: &ShaderManager) -> Self {
        let key = shadow_caster_shader_key();
        let shader = shader_manager
            .get::<ShadowCasterShader>(&key)
            .unwrap_or_else(|| {
                shader_manager.set(
                    key,
                    ShadowCasterShader::new(),
                    ResourceDataState::Final,
                    ResourcePolicy::ReferenceCounted,
                )
            });
        Self { node, mesh, shader }
    }

    pub fn shader(&self) -> &Resource<ShadowCasterShader> {
        &self.shader
    }
}

impl Drawable for ShadowCasterDrawable {
    fn draw(&mut self, transformation: &Mat4, shadow_camera: &Camera, ctx: &mut DrawContext<'_>) {
        let mut shader = self.shader.borrow_mut();
        shader.set_transformation_matrix(shadow_camera.projection_matrix() * *transformation);
        ctx.target.draw(self.mesh, ShaderProgram::ShadowCaster(&shader));
    }

    fn node(&self) -> hecs::Entity {
        self.node
    }
}
