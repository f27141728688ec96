// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::gfx::shaders::{PhongShader, ShadowCasterShader, ShadowReceiverShader};

/// Fixed part of `PhongUniforms`; light positions and colors follow as two
/// `vec4` arrays of `max(light_count, 1)` entries each.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
pub struct PhongUniformHeader {
    pub transformation: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub ambient_color: [f32; 4],
    pub diffuse_color: [f32; 4],
    pub specular_color: [f32; 4],
    pub shininess: f32,
    pub object_id: u32,
    pub light_count: u32,
    pub _padding: u32,
}

impl PhongUniformHeader {
    pub fn from_shader(shader: &PhongShader) -> Self {
        Self {
            transformation: shader.transformation_matrix().to_cols_array_2d(),
            projection: shader.projection_matrix().to_cols_array_2d(),
            // mat3x3 columns pad to vec4 anyway
            normal_matrix: Mat4::from_mat3(shader.normal_matrix()).to_cols_array_2d(),
            ambient_color: shader.ambient_color().to_array(),
            diffuse_color: shader.diffuse_color().to_array(),
            specular_color: shader.specular_color().to_array(),
            shininess: shader.shininess(),
            object_id: shader.object_id(),
            light_count: shader.light_count(),
            _padding: 0,
        }
    }
}

/// Fixed part of `ShadowReceiverUniforms`; the layer matrices follow.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
pub struct ShadowReceiverHeader {
    pub transformation_projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub light_direction_bias: [f32; 4],
}

impl ShadowReceiverHeader {
    pub fn from_shader(shader: &ShadowReceiverShader) -> Self {
        Self {
            transformation_projection: shader.transformation_projection_matrix().to_cols_array_2d(),
            model: shader.model_matrix().to_cols_array_2d(),
            light_direction_bias: shader
                .light_direction()
                .extend(shader.shadow_bias())
                .to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, PartialEq, Debug)]
pub struct ShadowCasterUniform {
    pub transformation: [[f32; 4]; 4],
}

impl ShadowCasterUniform {
    pub fn from_shader(shader: &ShadowCasterShader) -> Self {
        Self {
            transformation: shader.transformation_matrix().to_cols_array_2d(),
        }
    }
}

/// Bytes for the whole Phong uniform block of `shader`'s variant.
pub fn pack_phong(shader: &PhongShader) -> Vec<u8> {
    let array_len = shader.light_count().max(1) as usize;
    let mut positions = vec![[0.0f32; 4]; array_len];
    let mut colors = vec![[0.0f32; 4]; array_len];
    for (slot, position) in positions.iter_mut().zip(shader.light_positions()) {
        *slot = position.extend(1.0).to_array();
    }
    for (slot, color) in colors.iter_mut().zip(shader.light_colors()) {
        *slot = color.to_array();
    }

    let header = PhongUniformHeader::from_shader(shader);
    let mut bytes = Vec::with_capacity(phong_uniform_size(shader.light_count()));
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(bytemuck::cast_slice(&positions));
    bytes.extend_from_slice(bytemuck::cast_slice(&colors));
    bytes
}

pub fn phong_uniform_size(light_count: u32) -> usize {
    std::mem::size_of::<PhongUniformHeader>()
        + 2 * light_count.max(1) as usize * std::mem::size_of::<Vec4>()
}

/// Bytes for the whole shadow receiver uniform block. Unset layers are
/// packed as identity.
pub fn pack_shadow_receiver(shader: &ShadowReceiverShader) -> Vec<u8> {
    let array_len = shader.layer_count().max(1) as usize;
    let mut matrices = vec![Mat4::IDENTITY.to_cols_array_2d(); array_len];
    for (slot, matrix) in matrices.iter_mut().zip(shader.shadowmap_matrices()) {
        *slot = matrix.to_cols_array_2d();
    }

    let header = ShadowReceiverHeader::from_shader(shader);
    let mut bytes = Vec::with_capacity(shadow_receiver_uniform_size(shader.layer_count()));
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(bytemuck::cast_slice(&matrices));
    bytes
}

pub fn shadow_receiver_uniform_size(layer_count: u32) -> usize {
    std::mem::size_of::<ShadowReceiverHeader>()
        + layer_count.max(1) as usize * std::mem::size_of::<Mat4>()
}

pub fn pack_shadow_caster(shader: &ShadowCasterShader) -> Vec<u8> {
    bytemuck::bytes_of(&ShadowCasterUniform::from_shader(shader)).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::shaders::PhongFlags;
    use glam::Vec3;

    #[test]
    fn header_sizes_match_wgsl_layouts() {
        // three mat4, three vec4, four scalars
        assert_eq!(std::mem::size_of::<PhongUniformHeader>(), 256);
        // two mat4, one vec4
        assert_eq!(std::mem::size_of::<ShadowReceiverHeader>(), 144);
        assert_eq!(std::mem::size_of::<ShadowCasterUniform>(), 64);
    }

    #[test]
    fn phong_block_carries_one_slot_per_light() {
        let mut shader = PhongShader::new(PhongFlags::OBJECT_ID, 2);
        shader
            .set_object_id(7)
            .set_light_positions(&[Vec3::X, Vec3::Y])
            .set_light_colors(&[Vec4::ONE, Vec4::new(1.0, 0.0, 0.0, 1.0)]);

        let bytes = pack_phong(&shader);
        assert_eq!(bytes.len(), phong_uniform_size(2));
        assert_eq!(bytes.len(), 256 + 4 * 16);

        let header: PhongUniformHeader = bytemuck::pod_read_unaligned(&bytes[..256]);
        assert_eq!(header.object_id, 7);
        assert_eq!(header.light_count, 2);

        let slot = |i: usize| -> [f32; 4] {
            bytemuck::pod_read_unaligned(&bytes[256 + 16 * i..256 + 16 * (i + 1)])
        };
        assert_eq!(slot(1), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(slot(3), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn lightless_variant_still_packs_a_slot() {
        let shader = PhongShader::new(PhongFlags::empty(), 0);
        assert_eq!(pack_phong(&shader).len(), 256 + 2 * 16);
    }

    #[test]
    fn receiver_block_packs_bias_next_to_direction() {
        let mut shader = ShadowReceiverShader::new(3);
        shader
            .set_light_direction(Vec3::Z)
            .set_shadow_bias(0.001)
            .set_shadowmap_matrices(&[Mat4::from_scale(Vec3::splat(2.0))]);

        let bytes = pack_shadow_receiver(&shader);
        assert_eq!(bytes.len(), shadow_receiver_uniform_size(3));

        let header: ShadowReceiverHeader = bytemuck::pod_read_unaligned(&bytes[..144]);
        assert_eq!(header.light_direction_bias, [0.0, 0.0, 1.0, 0.001]);

        let matrix = |i: usize| -> [[f32; 4]; 4] {
            bytemuck::pod_read_unaligned(&bytes[144 + 64 * i..144 + 64 * (i + 1)])
        };
        assert_eq!(matrix(0)[0][0], 2.0);
        assert_eq!(matrix(2), Mat4::IDENTITY.to_cols_array_2d());
    }
}
