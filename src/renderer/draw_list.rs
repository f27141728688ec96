use crate::asset::{Handle, Mesh};
use crate::gfx::shaders::{PhongShader, ShadowCasterShader, ShadowReceiverShader};
use crate::resource::ResourceKey;

/// Program state a drawable hands to the target for a single draw.
#[derive(Debug, Clone, Copy)]
pub enum ShaderProgram<'a> {
    Phong(&'a PhongShader),
    ShadowReceiver(&'a ShadowReceiverShader),
    ShadowCaster(&'a ShadowCasterShader),
}

impl ShaderProgram<'_> {
    pub fn variant_key(&self) -> ResourceKey {
        match self {
            ShaderProgram::Phong(shader) => shader.variant_key(),
            ShaderProgram::ShadowReceiver(shader) => shader.variant_key(),
            ShaderProgram::ShadowCaster(shader) => shader.variant_key(),
        }
    }

    pub fn to_snapshot(&self) -> ProgramSnapshot {
        match *self {
            ShaderProgram::Phong(shader) => ProgramSnapshot::Phong(shader.clone()),
            ShaderProgram::ShadowReceiver(shader) => {
                ProgramSnapshot::ShadowReceiver(shader.clone())
            }
            ShaderProgram::ShadowCaster(shader) => ProgramSnapshot::ShadowCaster(shader.clone()),
        }
    }
}

/// Uniform state captured at draw time. Later draws through the same cached
/// shader do not affect an already recorded snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgramSnapshot {
    Phong(PhongShader),
    ShadowReceiver(ShadowReceiverShader),
    ShadowCaster(ShadowCasterShader),
}

impl ProgramSnapshot {
    pub fn variant_key(&self) -> ResourceKey {
        match self {
            ProgramSnapshot::Phong(shader) => shader.variant_key(),
            ProgramSnapshot::ShadowReceiver(shader) => shader.variant_key(),
            ProgramSnapshot::ShadowCaster(shader) => shader.variant_key(),
        }
    }

    pub fn wgsl_source(&self) -> String {
        match self {
            ProgramSnapshot::Phong(shader) => shader.wgsl_source(),
            ProgramSnapshot::ShadowReceiver(shader) => shader.wgsl_source(),
            ProgramSnapshot::ShadowCaster(shader) => shader.wgsl_source(),
        }
    }

    pub fn as_phong(&self) -> Option<&PhongShader> {
        match self {
            ProgramSnapshot::Phong(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn as_shadow_receiver(&self) -> Option<&ShadowReceiverShader> {
        match self {
            ProgramSnapshot::ShadowReceiver(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn as_shadow_caster(&self) -> Option<&ShadowCasterShader> {
        match self {
            ProgramSnapshot::ShadowCaster(shader) => Some(shader),
            _ => None,
        }
    }

    pub fn is_depth_only(&self) -> bool {
        matches!(self, ProgramSnapshot::ShadowCaster(_))
    }
}

/// Sink for the draws a drawable emits.
pub trait DrawTarget {
    fn draw(&mut self, mesh: Handle<Mesh>, program: ShaderProgram<'_>);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub mesh: Handle<Mesh>,
    pub program: ProgramSnapshot,
}

/// Draws recorded in submission order.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter()
    }
}

impl DrawTarget for DrawList {
    fn draw(&mut self, mesh: Handle<Mesh>, program: ShaderProgram<'_>) {
        self.commands.push(DrawCommand {
            mesh,
            program: program.to_snapshot(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::shaders::PhongFlags;
    use glam::Mat4;

    #[test]
    fn recorded_state_is_a_snapshot() {
        let mut list = DrawList::new();
        let mut shader = ShadowCasterShader::new();
        shader.set_transformation_matrix(Mat4::from_scale(glam::Vec3::splat(2.0)));
        list.draw(Handle::new(0), ShaderProgram::ShadowCaster(&shader));
        shader.set_transformation_matrix(Mat4::IDENTITY);

        let recorded = list.commands()[0].program.as_shadow_caster().unwrap();
        assert_eq!(
            recorded.transformation_matrix(),
            Mat4::from_scale(glam::Vec3::splat(2.0))
        );
        assert!(list.commands()[0].program.is_depth_only());
    }

    #[test]
    fn commands_keep_submission_order() {
        let mut list = DrawList::new();
        let phong = PhongShader::new(PhongFlags::OBJECT_ID, 1);
        let receiver = ShadowReceiverShader::new(2);
        list.draw(Handle::new(3), ShaderProgram::Phong(&phong));
        list.draw(Handle::new(1), ShaderProgram::ShadowReceiver(&receiver));

        let keys: Vec<_> = list.iter().map(|c| c.program.variant_key()).collect();
        assert_eq!(keys, vec![phong.variant_key(), receiver.variant_key()]);
        assert_eq!(list.commands()[1].mesh, Handle::new(1));

        list.clear();
        assert!(list.is_empty());
    }
}
