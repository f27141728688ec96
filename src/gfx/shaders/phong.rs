use std::fmt::Write;

use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec3, Vec4};

use super::keys::phong_shader_key;
use crate::asset::Handle;
use crate::renderer::Texture;
use crate::resource::ResourceKey;

bitflags! {
    /// Features compiled into a Phong variant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PhongFlags: u8 {
        const AMBIENT_TEXTURE = 1 << 0;
        const DIFFUSE_TEXTURE = 1 << 1;
        const SPECULAR_TEXTURE = 1 << 2;
        /// Writes the object id to the second color attachment.
        const OBJECT_ID = 1 << 6;
    }
}

impl PhongFlags {
    pub fn has_textures(self) -> bool {
        self.intersects(Self::AMBIENT_TEXTURE | Self::DIFFUSE_TEXTURE | Self::SPECULAR_TEXTURE)
    }
}

/// Bind slots of a Phong variant, in binding order.
pub const PHONG_UNIFORM_BINDING: u32 = 0;
pub const PHONG_SAMPLER_BINDING: u32 = 1;
pub const PHONG_AMBIENT_TEXTURE_BINDING: u32 = 2;
pub const PHONG_DIFFUSE_TEXTURE_BINDING: u32 = 3;
pub const PHONG_SPECULAR_TEXTURE_BINDING: u32 = 4;

/// Phong program specialised for a light count and a flag set.
///
/// Holds the per-draw uniform state; the GPU pipeline for the variant is
/// built by the backend from [`PhongShader::wgsl_source`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhongShader {
    flags: PhongFlags,
    light_count: u32,
    transformation: Mat4,
    projection: Mat4,
    normal_matrix: Mat3,
    ambient_color: Vec4,
    diffuse_color: Vec4,
    specular_color: Vec4,
    shininess: f32,
    object_id: u32,
    light_positions: Vec<Vec3>,
    light_colors: Vec<Vec4>,
    ambient_texture: Option<Handle<Texture>>,
    diffuse_texture: Option<Handle<Texture>>,
    specular_texture: Option<Handle<Texture>>,
}

impl PhongShader {
    pub fn new(flags: PhongFlags, light_count: u32) -> Self {
        let ambient_color = if flags.contains(PhongFlags::AMBIENT_TEXTURE) {
            Vec4::ONE
        } else {
            Vec4::new(0.0, 0.0, 0.0, 1.0)
        };
        Self {
            flags,
            light_count,
            transformation: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
            ambient_color,
            diffuse_color: Vec4::ONE,
            specular_color: Vec4::ONE,
            shininess: 80.0,
            object_id: 0,
            light_positions: vec![Vec3::Z; light_count as usize],
            light_colors: vec![Vec4::ONE; light_count as usize],
            ambient_texture: None,
            diffuse_texture: None,
            specular_texture: None,
        }
    }

    pub fn flags(&self) -> PhongFlags {
        self.flags
    }

    pub fn light_count(&self) -> u32 {
        self.light_count
    }

    pub fn variant_key(&self) -> ResourceKey {
        phong_shader_key(self.light_count, self.flags)
    }

    pub fn set_transformation_matrix(&mut self, matrix: Mat4) -> &mut Self {
        self.transformation = matrix;
        self
    }

    pub fn set_projection_matrix(&mut self, matrix: Mat4) -> &mut Self {
        self.projection = matrix;
        self
    }

    pub fn set_normal_matrix(&mut self, matrix: Mat3) -> &mut Self {
        self.normal_matrix = matrix;
        self
    }

    pub fn set_ambient_color(&mut self, color: Vec4) -> &mut Self {
        self.ambient_color = color;
        self
    }

    pub fn set_diffuse_color(&mut self, color: Vec4) -> &mut Self {
        self.diffuse_color = color;
        self
    }

    pub fn set_specular_color(&mut self, color: Vec4) -> &mut Self {
        self.specular_color = color;
        self
    }

    pub fn set_shininess(&mut self, shininess: f32) -> &mut Self {
        self.shininess = shininess;
        self
    }

    pub fn set_object_id(&mut self, id: u32) -> &mut Self {
        self.object_id = id;
        self
    }

    /// Expects exactly `light_count` positions, in camera space.
    pub fn set_light_positions(&mut self, positions: &[Vec3]) -> &mut Self {
        if positions.len() != self.light_count as usize {
            log::warn!(
                "Phong shader expects {} light positions, got {}",
                self.light_count,
                positions.len()
            );
            return self;
        }
        self.light_positions.clear();
        self.light_positions.extend_from_slice(positions);
        self
    }

    /// Expects exactly `light_count` colors.
    pub fn set_light_colors(&mut self, colors: &[Vec4]) -> &mut Self {
        if colors.len() != self.light_count as usize {
            log::warn!(
                "Phong shader expects {} light colors, got {}",
                self.light_count,
                colors.len()
            );
            return self;
        }
        self.light_colors.clear();
        self.light_colors.extend_from_slice(colors);
        self
    }

    pub fn bind_ambient_texture(&mut self, texture: Handle<Texture>) -> &mut Self {
        if self.require_flag(PhongFlags::AMBIENT_TEXTURE) {
            self.ambient_texture = Some(texture);
        }
        self
    }

    pub fn bind_diffuse_texture(&mut self, texture: Handle<Texture>) -> &mut Self {
        if self.require_flag(PhongFlags::DIFFUSE_TEXTURE) {
            self.diffuse_texture = Some(texture);
        }
        self
    }

    pub fn bind_specular_texture(&mut self, texture: Handle<Texture>) -> &mut Self {
        if self.require_flag(PhongFlags::SPECULAR_TEXTURE) {
            self.specular_texture = Some(texture);
        }
        self
    }

    fn require_flag(&self, flag: PhongFlags) -> bool {
        let present = self.flags.contains(flag);
        if !present {
            log::warn!(
                "Phong variant {} was not compiled with {:?}, ignoring texture",
                self.variant_key(),
                flag
            );
        }
        present
    }

    pub fn transformation_matrix(&self) -> Mat4 {
        self.transformation
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn normal_matrix(&self) -> Mat3 {
        self.normal_matrix
    }

    pub fn ambient_color(&self) -> Vec4 {
        self.ambient_color
    }

    pub fn diffuse_color(&self) -> Vec4 {
        self.diffuse_color
    }

    pub fn specular_color(&self) -> Vec4 {
        self.specular_color
    }

    pub fn shininess(&self) -> f32 {
        self.shininess
    }

    pub fn object_id(&self) -> u32 {
        self.object_id
    }

    pub fn light_positions(&self) -> &[Vec3] {
        &self.light_positions
    }

    pub fn light_colors(&self) -> &[Vec4] {
        &self.light_colors
    }

    pub fn ambient_texture(&self) -> Option<Handle<Texture>> {
        self.ambient_texture
    }

    pub fn diffuse_texture(&self) -> Option<Handle<Texture>> {
        self.diffuse_texture
    }

    pub fn specular_texture(&self) -> Option<Handle<Texture>> {
        self.specular_texture
    }

    /// WGSL for this variant: a generated preamble with the light count,
    /// texture bindings and samplers, followed by the shared Phong body.
    pub fn wgsl_source(&self) -> String {
        let mut source = String::new();
        let _ = writeln!(source, "const LIGHT_COUNT: u32 = {}u;", self.light_count);
        let _ = writeln!(
            source,
            "const LIGHT_ARRAY_LEN: u32 = {}u;",
            self.light_count.max(1)
        );
        let _ = writeln!(
            source,
            "const HAS_OBJECT_ID: bool = {};",
            self.flags.contains(PhongFlags::OBJECT_ID)
        );

        if self.flags.has_textures() {
            let _ = writeln!(
                source,
                "@group(0) @binding({}) var material_sampler: sampler;",
                PHONG_SAMPLER_BINDING
            );
        }

        let slots = [
            ("ambient", PhongFlags::AMBIENT_TEXTURE, PHONG_AMBIENT_TEXTURE_BINDING),
            ("diffuse", PhongFlags::DIFFUSE_TEXTURE, PHONG_DIFFUSE_TEXTURE_BINDING),
            ("specular", PhongFlags::SPECULAR_TEXTURE, PHONG_SPECULAR_TEXTURE_BINDING),
        ];
        for (name, flag, binding) in slots {
            if self.flags.contains(flag) {
                let _ = writeln!(
                    source,
                    "@group(0) @binding({binding}) var {name}_texture: texture_2d<f32>;\n\
                     fn sample_{name}(uv: vec2<f32>) -> vec4<f32> {{\n    \
                     return textureSample({name}_texture, material_sampler, uv);\n}}"
                );
            } else {
                let _ = writeln!(
                    source,
                    "fn sample_{name}(uv: vec2<f32>) -> vec4<f32> {{\n    return vec4<f32>(1.0);\n}}"
                );
            }
        }

        source.push_str(include_str!("../../shader/phong.wgsl"));
        source
    }
}
