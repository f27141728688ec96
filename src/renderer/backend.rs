use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::draw_list::{DrawCommand, DrawList, ProgramSnapshot};
use super::pipeline_builder::PipelineBuilder;
use super::texture::SHADOW_MAP_FORMAT;
use super::uniforms;
use super::{Depth, Texture, Vertex};
use crate::asset::{Assets, Handle, Mesh};
use crate::gfx::shaders::phong::{
    PHONG_AMBIENT_TEXTURE_BINDING, PHONG_DIFFUSE_TEXTURE_BINDING, PHONG_SAMPLER_BINDING,
    PHONG_SPECULAR_TEXTURE_BINDING, PHONG_UNIFORM_BINDING,
};
use crate::gfx::shaders::shadow_receiver::{
    SHADOW_RECEIVER_SAMPLER_BINDING, SHADOW_RECEIVER_TEXTURE_BINDING,
    SHADOW_RECEIVER_UNIFORM_BINDING,
};
use crate::gfx::shaders::{PhongFlags, PhongShader, ShadowReceiverShader};
use crate::resource::ResourceKey;
use crate::settings::RenderSettings;

/// Attachments of one color pass. `object_id` must be an
/// [`ObjectIdTarget`](super::ObjectIdTarget) view and `depth` a
/// [`Depth`] view of the same size as `color`.
pub struct FrameTargets<'a> {
    pub color: &'a wgpu::TextureView,
    pub object_id: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

struct VariantPipeline {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
}

struct PreparedDraw {
    key: ResourceKey,
    mesh: Handle<Mesh>,
    bind_group: wgpu::BindGroup,
}

/// Turns recorded draw lists into wgpu passes. One render pipeline is built
/// per shader variant key and reused for every later draw of that variant.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    settings: RenderSettings,
    pipelines: HashMap<ResourceKey, VariantPipeline>,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn phong_layout_entries(flags: PhongFlags) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![uniform_entry(
        PHONG_UNIFORM_BINDING,
        wgpu::ShaderStages::VERTEX_FRAGMENT,
    )];
    if !flags.has_textures() {
        return entries;
    }

    entries.push(wgpu::BindGroupLayoutEntry {
        binding: PHONG_SAMPLER_BINDING,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    for (flag, binding) in [
        (PhongFlags::AMBIENT_TEXTURE, PHONG_AMBIENT_TEXTURE_BINDING),
        (PhongFlags::DIFFUSE_TEXTURE, PHONG_DIFFUSE_TEXTURE_BINDING),
        (PhongFlags::SPECULAR_TEXTURE, PHONG_SPECULAR_TEXTURE_BINDING),
    ] {
        if flags.contains(flag) {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
    }
    entries
}

pub(crate) fn shadow_receiver_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    vec![
        uniform_entry(
            SHADOW_RECEIVER_UNIFORM_BINDING,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
        ),
        wgpu::BindGroupLayoutEntry {
            binding: SHADOW_RECEIVER_TEXTURE_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                view_dimension: wgpu::TextureViewDimension::D2Array,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: SHADOW_RECEIVER_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
            count: None,
        },
    ]
}

pub(crate) fn shadow_caster_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    vec![uniform_entry(0, wgpu::ShaderStages::VERTEX)]
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        settings: RenderSettings,
    ) -> Self {
        log::info!(
            "Drawable backend: color {:?}, shadow maps {}px, up to {} lights",
            color_format,
            settings.shadow_map_size,
            settings.max_light_count
        );
        Self {
            device: device.clone(),
            queue: queue.clone(),
            color_format,
            settings,
            pipelines: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Number of variant pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Layered depth texture sized from the settings, to be registered as a
    /// shadow light's texture.
    pub fn create_shadow_map(&self, label: &str, layers: u32) -> Texture {
        Texture::shadow_array(&self.device, label, layers, self.settings.shadow_map_size)
    }

    /// Upload a texture through the backend's queue.
    pub fn load_texture(
        &self,
        path: impl AsRef<std::path::Path>,
        is_srgb: bool,
    ) -> Result<Texture, String> {
        Texture::from_path(&self.device, &self.queue, path, is_srgb)
    }

    /// Record the color pass for every Phong and shadow receiver draw in
    /// `list`. Returns the number of draws issued.
    pub fn submit(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &FrameTargets<'_>,
        assets: &Assets,
        list: &DrawList,
    ) -> usize {
        let prepared: Vec<PreparedDraw> = list
            .iter()
            .filter(|command| !command.program.is_depth_only())
            .filter_map(|command| self.prepare(command, assets))
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("DrawablesColorPass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: targets.color,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.settings.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: targets.object_id,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.record(&mut pass, &prepared, assets)
    }

    /// Record a depth-only pass for the shadow caster draws in `list` into
    /// one layer of a shadow map. Returns the number of draws issued.
    pub fn submit_shadow_layer(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        layer_view: &wgpu::TextureView,
        assets: &Assets,
        list: &DrawList,
    ) -> usize {
        let prepared: Vec<PreparedDraw> = list
            .iter()
            .filter(|command| command.program.is_depth_only())
            .filter_map(|command| self.prepare(command, assets))
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ShadowCasterPass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: layer_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.record(&mut pass, &prepared, assets)
    }

    fn record(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        prepared: &[PreparedDraw],
        assets: &Assets,
    ) -> usize {
        let mut issued = 0;
        for draw in prepared {
            let (Some(variant), Some(mesh)) =
                (self.pipelines.get(&draw.key), assets.meshes.get(draw.mesh))
            else {
                continue;
            };
            pass.set_pipeline(&variant.pipeline);
            pass.set_bind_group(0, &draw.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
            pass.set_index_buffer(mesh.index_buffer().slice(..), mesh.index_format());
            pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
            issued += 1;
        }
        log::trace!("Issued {} of {} prepared draws", issued, prepared.len());
        issued
    }

    fn prepare(&mut self, command: &DrawCommand, assets: &Assets) -> Option<PreparedDraw> {
        if assets.meshes.get(command.mesh).is_none() {
            log::warn!("Skipping draw of unknown mesh {:?}", command.mesh);
            return None;
        }
        if let ProgramSnapshot::Phong(shader) = &command.program {
            if shader.light_count() > self.settings.max_light_count {
                log::warn!(
                    "Skipping '{}': more than {} lights",
                    shader.variant_key(),
                    self.settings.max_light_count
                );
                return None;
            }
        }

        let key = command.program.variant_key();
        if !self.pipelines.contains_key(&key) {
            let variant = self.build_pipeline(&command.program);
            log::info!("Built pipeline for shader variant '{}'", key);
            self.pipelines.insert(key.clone(), variant);
        }
        let layout = &self.pipelines.get(&key)?.bind_group_layout;

        let bind_group = match &command.program {
            ProgramSnapshot::Phong(shader) => self.phong_bind_group(layout, shader, assets)?,
            ProgramSnapshot::ShadowReceiver(shader) => {
                self.shadow_receiver_bind_group(layout, shader, assets)?
            }
            ProgramSnapshot::ShadowCaster(shader) => {
                let buffer = self.uniform_buffer(
                    "ShadowCasterUniforms",
                    &uniforms::pack_shadow_caster(shader),
                );
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("ShadowCasterBindGroup"),
                    layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                })
            }
        };

        Some(PreparedDraw {
            key,
            mesh: command.mesh,
            bind_group,
        })
    }

    fn uniform_buffer(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }

    fn phong_bind_group(
        &self,
        layout: &wgpu::BindGroupLayout,
        shader: &PhongShader,
        assets: &Assets,
    ) -> Option<wgpu::BindGroup> {
        let buffer = self.uniform_buffer("PhongUniforms", &uniforms::pack_phong(shader));

        let mut textures: Vec<(u32, &Texture)> = Vec::new();
        for (flag, binding, handle) in [
            (
                PhongFlags::AMBIENT_TEXTURE,
                PHONG_AMBIENT_TEXTURE_BINDING,
                shader.ambient_texture(),
            ),
            (
                PhongFlags::DIFFUSE_TEXTURE,
                PHONG_DIFFUSE_TEXTURE_BINDING,
                shader.diffuse_texture(),
            ),
            (
                PhongFlags::SPECULAR_TEXTURE,
                PHONG_SPECULAR_TEXTURE_BINDING,
                shader.specular_texture(),
            ),
        ] {
            if !shader.flags().contains(flag) {
                continue;
            }
            let Some(texture) = handle.and_then(|h| assets.textures.get(h)) else {
                log::warn!(
                    "Skipping '{}': {:?} is not bound to a loaded texture",
                    shader.variant_key(),
                    flag
                );
                return None;
            };
            textures.push((binding, texture));
        }

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: PHONG_UNIFORM_BINDING,
            resource: buffer.as_entire_binding(),
        }];
        if let Some((_, first)) = textures.first() {
            entries.push(wgpu::BindGroupEntry {
                binding: PHONG_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&first.sampler),
            });
        }
        for (binding, texture) in &textures {
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PhongBindGroup"),
            layout,
            entries: &entries,
        }))
    }

    fn shadow_receiver_bind_group(
        &self,
        layout: &wgpu::BindGroupLayout,
        shader: &ShadowReceiverShader,
        assets: &Assets,
    ) -> Option<wgpu::BindGroup> {
        let Some(texture) = shader
            .shadowmap_texture()
            .and_then(|handle| assets.textures.get(handle))
        else {
            log::warn!(
                "Skipping '{}': no shadow map texture bound",
                shader.variant_key()
            );
            return None;
        };

        let buffer = self.uniform_buffer(
            "ShadowReceiverUniforms",
            &uniforms::pack_shadow_receiver(shader),
        );
        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ShadowReceiverBindGroup"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: SHADOW_RECEIVER_UNIFORM_BINDING,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: SHADOW_RECEIVER_TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: SHADOW_RECEIVER_SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        }))
    }

    fn build_pipeline(&self, program: &ProgramSnapshot) -> VariantPipeline {
        let key = program.variant_key();
        let entries = match program {
            ProgramSnapshot::Phong(shader) => phong_layout_entries(shader.flags()),
            ProgramSnapshot::ShadowReceiver(_) => shadow_receiver_layout_entries(),
            ProgramSnapshot::ShadowCaster(_) => shadow_caster_layout_entries(),
        };

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(key.as_str()),
                    entries: &entries,
                });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(key.as_str()),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(key.as_str()),
                source: wgpu::ShaderSource::Wgsl(program.wgsl_source().into()),
            });

        let builder = PipelineBuilder::new(&self.device, &pipeline_layout, &module)
            .with_label(key.as_str())
            .with_vertex_buffer(Vertex::layout());

        let pipeline = if program.is_depth_only() {
            builder
                .depth_only()
                .with_no_culling()
                .with_depth_stencil_biased(SHADOW_MAP_FORMAT, self.settings.shadow_depth_bias)
                .build()
        } else {
            builder
                .with_color_target(self.color_format, Some(wgpu::BlendState::ALPHA_BLENDING))
                .with_object_id_target()
                .with_depth_stencil(Depth::FORMAT, true, wgpu::CompareFunction::Less)
                .build()
        };

        VariantPipeline {
            bind_group_layout,
            pipeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(entries: &[wgpu::BindGroupLayoutEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.binding).collect()
    }

    #[test]
    fn untextured_phong_binds_only_uniforms() {
        let entries = phong_layout_entries(PhongFlags::OBJECT_ID);
        assert_eq!(bindings(&entries), vec![PHONG_UNIFORM_BINDING]);
    }

    #[test]
    fn textured_phong_binds_sampler_and_present_textures() {
        let entries =
            phong_layout_entries(PhongFlags::AMBIENT_TEXTURE | PhongFlags::SPECULAR_TEXTURE);
        assert_eq!(
            bindings(&entries),
            vec![
                PHONG_UNIFORM_BINDING,
                PHONG_SAMPLER_BINDING,
                PHONG_AMBIENT_TEXTURE_BINDING,
                PHONG_SPECULAR_TEXTURE_BINDING,
            ]
        );
    }

    #[test]
    fn receiver_samples_a_depth_array_with_comparison() {
        let entries = shadow_receiver_layout_entries();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            entries[1].ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                view_dimension: wgpu::TextureViewDimension::D2Array,
                ..
            }
        ));
        assert!(matches!(
            entries[2].ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison)
        ));
    }

    #[test]
    fn caster_uniform_is_vertex_only() {
        let entries = shadow_caster_layout_entries();
        assert_eq!(entries[0].visibility, wgpu::ShaderStages::VERTEX);
    }
}
