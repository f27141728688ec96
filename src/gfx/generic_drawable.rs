use glam::{Mat3, Mat4, Vec3, Vec4};

use super::drawable::{DrawContext, Drawable, ID_UNDEFINED};
use super::light_setup::{get_light_position_relative_to_camera, LightSetup};
use super::material::PhongMaterialData;
use super::shaders::{
    phong_shader_key, shadow_receiver_shader_key, PhongFlags, PhongShader, ShadowReceiverShader,
    DEFAULT_SHADOW_BIAS,
};
use super::shadows::LightSetupShadowMaps;
use crate::asset::{Handle, Mesh};
use crate::renderer::ShaderProgram;
use crate::resource::{
    Resource, ResourceDataState, ResourceKey, ResourceManager, ResourcePolicy, ShaderManager,
    ShadowMapRegistry,
};
use crate::scene::Camera;

/// Construction parameters for a [`GenericDrawable`].
pub struct GenericDrawableConfig {
    pub node: hecs::Entity,
    pub mesh: Handle<Mesh>,
    pub shader_manager: ShaderManager,
    pub light_setup: ResourceKey,
    pub material: ResourceKey,
    pub object_id: i32,
    /// Drawables constructed with a registry receive shadows.
    pub shadow_map_registry: Option<ShadowMapRegistry>,
}

impl GenericDrawableConfig {
    pub fn new(
        node: hecs::Entity,
        mesh: Handle<Mesh>,
        shader_manager: &ShaderManager,
        light_setup: impl Into<ResourceKey>,
        material: impl Into<ResourceKey>,
    ) -> Self {
        Self {
            node,
            mesh,
            shader_manager: shader_manager.clone(),
            light_setup: light_setup.into(),
            material: material.into(),
            object_id: ID_UNDEFINED,
            shadow_map_registry: None,
        }
    }

    pub fn with_object_id(mut self, object_id: i32) -> Self {
        self.object_id = object_id;
        self
    }

    pub fn with_shadow_map_registry(mut self, registry: &ShadowMapRegistry) -> Self {
        self.shadow_map_registry = Some(registry.clone());
        self
    }
}

/// Phong-lit mesh that picks its shader variant from the shared cache and
/// optionally renders through a shadow receiver instead.
pub struct GenericDrawable {
    node: hecs::Entity,
    mesh: Handle<Mesh>,
    object_id: i32,
    shader_manager: ShaderManager,
    light_setup: Resource<LightSetup>,
    material: Resource<PhongMaterialData>,
    shader: Option<Resource<PhongShader>>,
    shadow_map_registry: Option<ShadowMapRegistry>,
    light_setup_shadow_maps: Option<Resource<LightSetupShadowMaps>>,
    shadow_receiver_shader: Option<Resource<ShadowReceiverShader>>,
}

/// Fetch `key`, or park a mutable placeholder under it so a later `set`
/// from the owner is observed through the returned handle. Only the caller
/// that parks the placeholder warns; later callers share it.
fn acquire<T: 'static>(
    manager: &ResourceManager,
    key: &ResourceKey,
    what: &str,
    placeholder: impl FnOnce() -> T,
) -> Resource<T> {
    match manager.get::<T>(key) {
        Some(resource) => resource,
        None => {
            log::warn!("No {} registered under '{}', using an empty one", what, key);
            manager.set(
                key.clone(),
                placeholder(),
                ResourceDataState::Mutable,
                ResourcePolicy::ReferenceCounted,
            )
        }
    }
}

impl GenericDrawable {
    pub fn new(config: GenericDrawableConfig) -> Self {
        let GenericDrawableConfig {
            node,
            mesh,
            shader_manager,
            light_setup,
            material,
            object_id,
            shadow_map_registry,
        } = config;

        let light_setup_shadow_maps = shadow_map_registry.as_ref().map(|registry| {
            acquire(registry, &light_setup, "shadow maps", LightSetupShadowMaps::default)
        });

        let mut drawable = Self {
            node,
            mesh,
            object_id,
            light_setup: acquire(
                &shader_manager,
                &light_setup,
                "light setup",
                LightSetup::no_lights,
            ),
            material: acquire(
                &shader_manager,
                &material,
                "material",
                PhongMaterialData::default,
            ),
            shader_manager,
            shader: None,
            shadow_map_registry,
            light_setup_shadow_maps,
            shadow_receiver_shader: None,
        };

        // resolve now so the first frame does not pay for it
        drawable.update_shader();
        drawable
    }

    pub fn mesh(&self) -> Handle<Mesh> {
        self.mesh
    }

    pub fn object_id(&self) -> i32 {
        self.object_id
    }

    pub fn receives_shadow(&self) -> bool {
        self.shadow_map_registry.is_some()
    }

    pub fn light_setup_key(&self) -> &ResourceKey {
        self.light_setup.key()
    }

    pub fn shader(&self) -> Option<&Resource<PhongShader>> {
        self.shader.as_ref()
    }

    pub fn shadow_receiver_shader(&self) -> Option<&Resource<ShadowReceiverShader>> {
        self.shadow_receiver_shader.as_ref()
    }

    fn phong_flags(&self) -> PhongFlags {
        let material = self.material.borrow();
        let mut flags = PhongFlags::OBJECT_ID;
        if material.ambient_texture.is_some() {
            flags |= PhongFlags::AMBIENT_TEXTURE;
        }
        if material.diffuse_texture.is_some() {
            flags |= PhongFlags::DIFFUSE_TEXTURE;
        }
        if material.specular_texture.is_some() {
            flags |= PhongFlags::SPECULAR_TEXTURE;
        }
        flags
    }

    fn shadow_layer_count(&self) -> Option<u32> {
        let maps = self.light_setup_shadow_maps.as_ref()?.borrow();
        maps.first().map(|light| light.layer_count() as u32)
    }

    /// Make sure the held variants match the current light count, material
    /// flags and shadow layer count. Cheap when nothing changed.
    pub fn update_shader(&mut self) {
        let light_count = self.light_setup.borrow().len() as u32;
        let flags = self.phong_flags();

        let up_to_date = self.shader.as_ref().is_some_and(|shader| {
            let shader = shader.borrow();
            shader.light_count() == light_count && shader.flags() == flags
        });

        if !up_to_date {
            let key = phong_shader_key(light_count, flags);
            let shader = match self.shader_manager.get::<PhongShader>(&key) {
                Some(shader) => shader,
                None => {
                    log::debug!("Creating Phong variant '{}'", key);
                    self.shader_manager.set(
                        key,
                        PhongShader::new(flags, light_count),
                        ResourceDataState::Final,
                        ResourcePolicy::ReferenceCounted,
                    )
                }
            };
            if let Some(previous) = self.shader.replace(shader) {
                self.shader_manager.release(previous);
            }
        }

        let Some(layer_count) = self.shadow_layer_count() else {
            return;
        };

        let receiver_up_to_date = self
            .shadow_receiver_shader
            .as_ref()
            .is_some_and(|shader| shader.borrow().layer_count() == layer_count);

        if !receiver_up_to_date {
            let key = shadow_receiver_shader_key(layer_count);
            let shader = match self.shader_manager.get::<ShadowReceiverShader>(&key) {
                Some(shader) => shader,
                None => {
                    log::debug!("Creating shadow receiver variant '{}'", key);
                    let mut shader = ShadowReceiverShader::new(layer_count);
                    shader.set_shadow_bias(DEFAULT_SHADOW_BIAS);
                    self.shader_manager.set(
                        key,
                        shader,
                        ResourceDataState::Final,
                        ResourcePolicy::ReferenceCounted,
                    )
                }
            };
            if let Some(previous) = self.shadow_receiver_shader.replace(shader) {
                self.shader_manager.release(previous);
            }
        }
    }

    /// Returns false when there is no shadow light to receive from.
    fn draw_shadow_receiver(
        &self,
        transformation: &Mat4,
        camera: &Camera,
        ctx: &mut DrawContext<'_>,
    ) -> bool {
        let (Some(maps), Some(shader)) = (
            self.light_setup_shadow_maps.as_ref(),
            self.shadow_receiver_shader.as_ref(),
        ) else {
            return false;
        };
        let maps = maps.borrow();
        let Some(light) = maps.first() else {
            return false;
        };

        let mut shader = shader.borrow_mut();
        shader
            .set_transformation_projection_matrix(camera.projection_matrix() * *transformation)
            .set_model_matrix(ctx.node.absolute_transformation)
            .set_shadowmap_matrices(&light.layer_matrices())
            .set_light_direction(light.light_direction())
            .set_shadowmap_texture(light.shadow_texture());

        log::trace!("Drawing {:?} through '{}'", self.node, shader.variant_key());
        ctx.target.draw(self.mesh, ShaderProgram::ShadowReceiver(&shader));
        true
    }

    fn draw_phong(&self, transformation: &Mat4, camera: &Camera, ctx: &mut DrawContext<'_>) {
        let Some(shader) = self.shader.as_ref() else {
            return;
        };

        let camera_matrix = camera.camera_matrix();
        let (light_positions, light_colors): (Vec<Vec3>, Vec<Vec4>) = self
            .light_setup
            .borrow()
            .iter()
            .map(|light| {
                (
                    get_light_position_relative_to_camera(light, transformation, &camera_matrix),
                    light.color,
                )
            })
            .unzip();

        let object_id = if ctx.node.id == ID_UNDEFINED {
            self.object_id
        } else {
            ctx.node.id
        };

        let material = self.material.borrow();
        let mut shader = shader.borrow_mut();
        shader
            .set_ambient_color(material.ambient_color)
            .set_diffuse_color(material.diffuse_color)
            .set_specular_color(material.specular_color)
            .set_shininess(material.shininess)
            .set_object_id(object_id as u32)
            .set_light_positions(&light_positions)
            .set_light_colors(&light_colors)
            .set_transformation_matrix(*transformation)
            .set_projection_matrix(camera.projection_matrix())
            .set_normal_matrix(Mat3::from_mat4(*transformation));

        if let Some(texture) = material.ambient_texture {
            shader.bind_ambient_texture(texture);
        }
        if let Some(texture) = material.diffuse_texture {
            shader.bind_diffuse_texture(texture);
        }
        if let Some(texture) = material.specular_texture {
            shader.bind_specular_texture(texture);
        }

        log::trace!("Drawing {:?} through '{}'", self.node, shader.variant_key());
        ctx.target.draw(self.mesh, ShaderProgram::Phong(&shader));
    }
}

impl Drawable for GenericDrawable {
    fn draw(&mut self, transformation: &Mat4, camera: &Camera, ctx: &mut DrawContext<'_>) {
        self.update_shader();

        if self.draw_shadow_receiver(transformation, camera, ctx) {
            return;
        }

        self.draw_phong(transformation, camera, ctx);
    }

    fn set_light_setup(&mut self, light_setup: &ResourceKey) {
        let previous = std::mem::replace(
            &mut self.light_setup,
            acquire(
                &self.shader_manager,
                light_setup,
                "light setup",
                LightSetup::no_lights,
            ),
        );
        self.shader_manager.release(previous);

        if let Some(registry) = &self.shadow_map_registry {
            let maps = acquire(
                registry,
                light_setup,
                "shadow maps",
                LightSetupShadowMaps::default,
            );
            if let Some(previous) = self.light_setup_shadow_maps.replace(maps) {
                registry.release(previous);
            }
        }

        self.update_shader();
    }

    fn node(&self) -> hecs::Entity {
        self.node
    }
}
