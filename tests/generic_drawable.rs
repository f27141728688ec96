use glam::{Mat3, Mat4, Vec3, Vec4};

use wgpu_drawables::asset::Handle;
use wgpu_drawables::gfx::shaders::{
    phong_shader_key, PhongFlags, PhongShader, ShadowReceiverShader, DEFAULT_SHADOW_BIAS,
};
use wgpu_drawables::gfx::{
    DrawContext, Drawable, GenericDrawable, GenericDrawableConfig, LightInfo, LightPositionModel,
    LightSetup, LightSetupShadowMaps, NodeInfo, PhongMaterialData, ShadowLight, ID_UNDEFINED,
};
use wgpu_drawables::renderer::{DrawList, ProgramSnapshot};
use wgpu_drawables::resource::{
    Resource, ResourceDataState, ResourceKey, ResourcePolicy, ShaderManager, ShadowMapRegistry,
};
use wgpu_drawables::scene::{Camera, SceneGraph, Transform};

const EPSILON: f32 = 1e-5;

struct Fixture {
    world: hecs::World,
    shaders: ShaderManager,
    shadow_maps: ShadowMapRegistry,
    camera: Camera,
}

impl Fixture {
    fn new() -> Self {
        let shaders = ShaderManager::new();
        shaders.set(
            "default",
            LightSetup::new(vec![LightInfo::global(Vec3::Y, Vec4::ONE)]),
            ResourceDataState::Mutable,
            ResourcePolicy::Resident,
        );
        shaders.set(
            "plain",
            PhongMaterialData::default(),
            ResourceDataState::Mutable,
            ResourcePolicy::Resident,
        );
        Self {
            world: hecs::World::new(),
            shaders,
            shadow_maps: ShadowMapRegistry::new(),
            camera: Camera::default(),
        }
    }

    fn config(&mut self, light_setup: &str, material: &str) -> GenericDrawableConfig {
        let node = self.world.spawn(());
        GenericDrawableConfig::new(node, Handle::new(0), &self.shaders, light_setup, material)
    }

    fn set_light_setup(&self, key: &str, setup: LightSetup) {
        self.shaders
            .set(key, setup, ResourceDataState::Mutable, ResourcePolicy::Resident);
    }

    fn set_material(&self, key: &str, material: PhongMaterialData) {
        self.shaders
            .set(key, material, ResourceDataState::Mutable, ResourcePolicy::Resident);
    }

    fn set_shadow_light(&self, key: &str, light: ShadowLight) {
        self.shadow_maps.set(
            key,
            LightSetupShadowMaps::new(vec![light]),
            ResourceDataState::Mutable,
            ResourcePolicy::Resident,
        );
    }
}

fn draw_with(
    drawable: &mut GenericDrawable,
    node_id: i32,
    absolute: Mat4,
    camera: &Camera,
) -> DrawList {
    let mut list = DrawList::new();
    {
        let transformation = camera.camera_matrix() * absolute;
        let mut ctx = DrawContext {
            node: NodeInfo {
                entity: drawable.node(),
                id: node_id,
                absolute_transformation: absolute,
            },
            target: &mut list,
        };
        drawable.draw(&transformation, camera, &mut ctx);
    }
    list
}

fn only_phong(list: &DrawList) -> PhongShader {
    assert_eq!(list.len(), 1, "expected exactly one draw");
    list.commands()[0]
        .program
        .as_phong()
        .cloned()
        .expect("draw went through the Phong shader")
}

fn only_receiver(list: &DrawList) -> ShadowReceiverShader {
    assert_eq!(list.len(), 1, "expected exactly one draw");
    list.commands()[0]
        .program
        .as_shadow_receiver()
        .cloned()
        .expect("draw went through the shadow receiver")
}

#[test]
fn equal_configurations_share_one_cached_variant() {
    let mut fx = Fixture::new();
    let a = GenericDrawable::new(fx.config("default", "plain"));
    let b = GenericDrawable::new(fx.config("default", "plain"));

    assert_eq!(fx.shaders.count::<PhongShader>(), 1);
    assert!(Resource::ptr_eq(a.shader().unwrap(), b.shader().unwrap()));
    assert!(fx
        .shaders
        .contains::<PhongShader>(&phong_shader_key(1, PhongFlags::OBJECT_ID)));
}

#[test]
fn repeated_draws_do_not_rebuild_the_variant() {
    let mut fx = Fixture::new();
    let mut drawable = GenericDrawable::new(fx.config("default", "plain"));
    let before = drawable.shader().cloned().unwrap();

    for _ in 0..3 {
        draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera);
    }

    assert!(Resource::ptr_eq(&before, drawable.shader().unwrap()));
    assert_eq!(fx.shaders.count::<PhongShader>(), 1);
}

#[test]
fn light_count_change_resolves_a_new_variant() {
    let mut fx = Fixture::new();
    let mut drawable = GenericDrawable::new(fx.config("default", "plain"));
    let shader = only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(shader.light_count(), 1);

    fx.set_light_setup(
        "default",
        LightSetup::new(vec![
            LightInfo::global(Vec3::X, Vec4::ONE),
            LightInfo::global(Vec3::Y, Vec4::ONE),
        ]),
    );

    let shader = only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(shader.light_count(), 2);
    assert_eq!(shader.light_positions().len(), 2);
    assert_eq!(
        drawable.shader().unwrap().key(),
        &phong_shader_key(2, PhongFlags::OBJECT_ID)
    );
    // the one-light variant lost its only holder and its entry is gone
    assert_eq!(fx.shaders.count::<PhongShader>(), 1);
    assert_eq!(fx.shaders.free::<PhongShader>(), 0);
}

#[test]
fn material_texture_change_resolves_a_new_variant() {
    let mut fx = Fixture::new();
    let mut drawable = GenericDrawable::new(fx.config("default", "plain"));

    fx.set_material(
        "plain",
        PhongMaterialData::default().with_diffuse_texture(Handle::new(4)),
    );

    let shader = only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(
        shader.flags(),
        PhongFlags::OBJECT_ID | PhongFlags::DIFFUSE_TEXTURE
    );
}

#[test]
fn phong_draw_writes_camera_space_lights_in_setup_order() {
    let mut fx = Fixture::new();
    fx.set_light_setup(
        "three",
        LightSetup::new(vec![
            LightInfo::new(Vec3::new(1.0, 2.0, 3.0), Vec4::ONE, LightPositionModel::Global),
            LightInfo::new(
                Vec3::new(0.0, 1.0, 0.0),
                Vec4::new(1.0, 0.0, 0.0, 1.0),
                LightPositionModel::Object,
            ),
            LightInfo::new(
                Vec3::new(0.0, 0.5, 0.0),
                Vec4::new(0.0, 0.0, 1.0, 1.0),
                LightPositionModel::Camera,
            ),
        ]),
    );
    let mut drawable = GenericDrawable::new(fx.config("three", "plain"));

    let absolute = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
    let shader = only_phong(&draw_with(&mut drawable, 9, absolute, &fx.camera));

    let camera_matrix = fx.camera.camera_matrix();
    let transformation = camera_matrix * absolute;
    let positions = shader.light_positions();
    let global = camera_matrix.transform_point3(Vec3::new(1.0, 2.0, 3.0));
    assert!(positions[0].abs_diff_eq(global, EPSILON));
    assert!(positions[1].abs_diff_eq(transformation.transform_point3(Vec3::Y), EPSILON));
    assert!(positions[2].abs_diff_eq(Vec3::new(0.0, 0.5, 0.0), EPSILON));
    assert_eq!(
        shader.light_colors(),
        &[
            Vec4::ONE,
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 1.0, 1.0)
        ]
    );

    assert!(shader.transformation_matrix().abs_diff_eq(transformation, EPSILON));
    assert!(shader
        .projection_matrix()
        .abs_diff_eq(fx.camera.projection_matrix(), EPSILON));
    assert!(shader
        .normal_matrix()
        .abs_diff_eq(Mat3::from_mat4(transformation), EPSILON));
    assert_eq!(shader.object_id(), 9);
}

#[test]
fn phong_draw_copies_material_colors() {
    let mut fx = Fixture::new();
    let material = PhongMaterialData::with_colors(
        Vec4::new(0.2, 0.2, 0.2, 1.0),
        Vec4::new(0.5, 0.1, 0.1, 1.0),
        Vec4::new(0.9, 0.9, 0.9, 1.0),
    )
    .with_shininess(12.0);
    fx.set_material("red", material.clone());
    let mut drawable = GenericDrawable::new(fx.config("default", "red"));

    let shader = only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(shader.ambient_color(), material.ambient_color);
    assert_eq!(shader.diffuse_color(), material.diffuse_color);
    assert_eq!(shader.specular_color(), material.specular_color);
    assert_eq!(shader.shininess(), 12.0);
}

#[test]
fn textures_are_bound_only_when_present() {
    let mut fx = Fixture::new();
    fx.set_material(
        "textured",
        PhongMaterialData::default()
            .with_ambient_texture(Handle::new(1))
            .with_specular_texture(Handle::new(3)),
    );
    let mut drawable = GenericDrawable::new(fx.config("default", "textured"));

    let shader = only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(shader.ambient_texture(), Some(Handle::new(1)));
    assert_eq!(shader.diffuse_texture(), None);
    assert_eq!(shader.specular_texture(), Some(Handle::new(3)));
    assert!(!shader.flags().contains(PhongFlags::DIFFUSE_TEXTURE));

    let mut plain = GenericDrawable::new(fx.config("default", "plain"));
    let shader = only_phong(&draw_with(&mut plain, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(
        (
            shader.ambient_texture(),
            shader.diffuse_texture(),
            shader.specular_texture()
        ),
        (None, None, None)
    );
}

#[test]
fn undefined_node_id_falls_back_to_configured_object_id() {
    let mut fx = Fixture::new();
    let config = fx.config("default", "plain").with_object_id(77);
    let mut drawable = GenericDrawable::new(config);

    let list = draw_with(&mut drawable, ID_UNDEFINED, Mat4::IDENTITY, &fx.camera);
    let shader = only_phong(&list);
    assert_eq!(shader.object_id(), 77);

    let shader = only_phong(&draw_with(&mut drawable, 5, Mat4::IDENTITY, &fx.camera));
    assert_eq!(shader.object_id(), 5);
}

#[test]
fn shadow_receiver_path_replaces_phong() {
    let mut fx = Fixture::new();
    let mut light = ShadowLight::new(Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_4));
    light.setup_layers(3);
    light.set_layer_matrix(0, Mat4::from_scale(Vec3::splat(0.5)));
    light.set_shadow_texture(Handle::new(6));
    let direction = light.light_direction();
    fx.set_shadow_light("default", light);

    let config = fx
        .config("default", "plain")
        .with_shadow_map_registry(&fx.shadow_maps);
    let mut drawable = GenericDrawable::new(config);
    assert!(drawable.receives_shadow());

    let absolute = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
    let list = draw_with(&mut drawable, 1, absolute, &fx.camera);
    let receiver = only_receiver(&list);

    assert_eq!(receiver.layer_count(), 3);
    assert_eq!(receiver.shadow_bias(), DEFAULT_SHADOW_BIAS);
    assert!(receiver.light_direction().abs_diff_eq(direction, EPSILON));
    assert_eq!(receiver.shadowmap_texture(), Some(Handle::new(6)));
    assert_eq!(receiver.shadowmap_matrices()[0], Mat4::from_scale(Vec3::splat(0.5)));
    assert_eq!(receiver.model_matrix(), absolute);
    let expected = fx.camera.projection_matrix() * fx.camera.camera_matrix() * absolute;
    assert!(receiver
        .transformation_projection_matrix()
        .abs_diff_eq(expected, EPSILON));

    // the Phong variant was resolved but never fed
    let phong = drawable.shader().unwrap().borrow().clone();
    assert_eq!(phong.transformation_matrix(), Mat4::IDENTITY);
    assert_eq!(phong.light_positions(), &[Vec3::Z]);
}

#[test]
fn receivers_share_a_variant_per_layer_count() {
    let mut fx = Fixture::new();
    let mut light = ShadowLight::new(Mat4::IDENTITY);
    light.setup_layers(2);
    fx.set_shadow_light("default", light);

    let a = GenericDrawable::new(
        fx.config("default", "plain")
            .with_shadow_map_registry(&fx.shadow_maps),
    );
    let b = GenericDrawable::new(
        fx.config("default", "plain")
            .with_shadow_map_registry(&fx.shadow_maps),
    );

    assert_eq!(fx.shaders.count::<ShadowReceiverShader>(), 1);
    assert!(Resource::ptr_eq(
        a.shadow_receiver_shader().unwrap(),
        b.shadow_receiver_shader().unwrap()
    ));
    assert_eq!(
        a.shadow_receiver_shader().unwrap().key(),
        &ResourceKey::from("shadow-receiver-2")
    );
}

#[test]
fn shared_receiver_does_not_keep_another_lights_texture() {
    let mut fx = Fixture::new();
    fx.set_light_setup("untextured", LightSetup::default_lights());

    let mut textured = ShadowLight::new(Mat4::IDENTITY);
    textured.setup_layers(1);
    textured.set_shadow_texture(Handle::new(7));
    fx.set_shadow_light("default", textured);

    let mut bare = ShadowLight::new(Mat4::IDENTITY);
    bare.setup_layers(1);
    fx.set_shadow_light("untextured", bare);

    let mut a = GenericDrawable::new(
        fx.config("default", "plain")
            .with_shadow_map_registry(&fx.shadow_maps),
    );
    let mut b = GenericDrawable::new(
        fx.config("untextured", "plain")
            .with_shadow_map_registry(&fx.shadow_maps),
    );
    assert!(Resource::ptr_eq(
        a.shadow_receiver_shader().unwrap(),
        b.shadow_receiver_shader().unwrap()
    ));

    let first = only_receiver(&draw_with(&mut a, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(first.shadowmap_texture(), Some(Handle::new(7)));

    let second = only_receiver(&draw_with(&mut b, 2, Mat4::IDENTITY, &fx.camera));
    assert_eq!(second.shadowmap_texture(), None);
}

#[test]
fn switching_light_setup_prunes_the_abandoned_variant() {
    let mut fx = Fixture::new();
    fx.set_light_setup("empty", LightSetup::no_lights());
    let mut drawable = GenericDrawable::new(fx.config("default", "plain"));

    drawable.set_light_setup(&ResourceKey::from("empty"));

    assert!(!fx
        .shaders
        .contains::<PhongShader>(&phong_shader_key(1, PhongFlags::OBJECT_ID)));
    assert_eq!(fx.shaders.free::<PhongShader>(), 0);
}

#[test]
fn receiver_without_shadow_light_draws_phong() {
    let mut fx = Fixture::new();
    let config = fx
        .config("default", "plain")
        .with_shadow_map_registry(&fx.shadow_maps);
    let mut drawable = GenericDrawable::new(config);

    let list = draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera);
    only_phong(&list);
    assert!(drawable.shadow_receiver_shader().is_none());
}

#[test]
fn shadow_light_registered_later_is_picked_up() {
    let mut fx = Fixture::new();
    let config = fx
        .config("default", "plain")
        .with_shadow_map_registry(&fx.shadow_maps);
    let mut drawable = GenericDrawable::new(config);

    let mut light = ShadowLight::new(Mat4::IDENTITY);
    light.setup_layers(4);
    fx.set_shadow_light("default", light);

    let receiver = only_receiver(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(receiver.layer_count(), 4);
}

#[test]
fn switching_light_setup_refetches_lights_and_shadow_maps() {
    let mut fx = Fixture::new();
    fx.set_light_setup("empty", LightSetup::no_lights());
    let mut light = ShadowLight::new(Mat4::IDENTITY);
    light.setup_layers(2);
    fx.set_shadow_light("empty", light);

    let config = fx
        .config("default", "plain")
        .with_shadow_map_registry(&fx.shadow_maps);
    let mut drawable = GenericDrawable::new(config);
    only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));

    drawable.set_light_setup(&ResourceKey::from("empty"));
    assert_eq!(drawable.light_setup_key(), &ResourceKey::from("empty"));
    assert_eq!(drawable.shader().unwrap().borrow().light_count(), 0);

    let receiver = only_receiver(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(receiver.layer_count(), 2);
}

#[test]
fn missing_light_setup_is_observed_once_registered() {
    let mut fx = Fixture::new();
    let mut drawable = GenericDrawable::new(fx.config("late", "plain"));
    assert_eq!(drawable.shader().unwrap().borrow().light_count(), 0);

    fx.set_light_setup("late", LightSetup::default_lights());

    let shader = only_phong(&draw_with(&mut drawable, 1, Mat4::IDENTITY, &fx.camera));
    assert_eq!(shader.light_count(), 1);
}

#[test]
fn dropping_drawables_evicts_their_variants() {
    let mut fx = Fixture::new();
    let a = GenericDrawable::new(fx.config("default", "plain"));
    let b = GenericDrawable::new(fx.config("default", "plain"));

    drop(a);
    assert_eq!(fx.shaders.count::<PhongShader>(), 1);
    drop(b);
    assert_eq!(fx.shaders.count::<PhongShader>(), 0);
}

#[test]
fn removing_a_node_releases_its_variant() {
    let fx = Fixture::new();
    let mut graph = SceneGraph::new();
    let root = graph.add_node(None, Transform::IDENTITY);
    let node = graph.add_node(Some(root), Transform::from_translation(Vec3::X));
    graph.set_node_id(node, 3);
    let group = graph.create_group();

    let drawable = GenericDrawable::new(GenericDrawableConfig::new(
        node,
        Handle::new(0),
        &fx.shaders,
        "default",
        "plain",
    ));
    assert!(graph.attach(group, Box::new(drawable)));

    let mut list = DrawList::new();
    assert_eq!(graph.draw_group(group, &fx.camera, &mut list), 1);
    assert_eq!(only_phong(&list).object_id(), 3);
    assert!(matches!(list.commands()[0].program, ProgramSnapshot::Phong(_)));

    graph.remove_node(root);
    assert_eq!(graph.drawable_count(group), 0);
    assert_eq!(fx.shaders.count::<PhongShader>(), 0);
}
