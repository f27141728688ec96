use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3, Vec4};

use wgpu_drawables::asset::{Assets, Mesh};
use wgpu_drawables::gfx::shaders::PhongShader;
use wgpu_drawables::gfx::{
    GenericDrawable, GenericDrawableConfig, LightSetup, LightSetupShadowMaps, PhongMaterialData,
    ShadowCasterDrawable, ShadowLight,
};
use wgpu_drawables::renderer::vertex::quad;
use wgpu_drawables::renderer::{Depth, DrawList, FrameTargets, ObjectIdTarget, WgpuBackend};
use wgpu_drawables::resource::{
    ResourceDataState, ResourcePolicy, ShaderManager, ShadowMapRegistry,
};
use wgpu_drawables::scene::{Camera, Projection, SceneGraph, Transform};
use wgpu_drawables::RenderSettings;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
const SHADOW_LAYERS: usize = 2;
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn main() {
    wgpu_drawables::init_logging();
    if let Err(err) = pollster::block_on(run()) {
        eprintln!("Demo error: {err}");
    }
}

/// Render one offscreen frame of a lit, shadowed scene. An optional image
/// path argument becomes the ground's diffuse texture.
async fn run() -> Result<(), String> {
    let settings = RenderSettings::load();

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| format!("No suitable adapter: {e}"))?;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| format!("Failed to create device: {e}"))?;

    let mut backend = WgpuBackend::new(&device, &queue, COLOR_FORMAT, settings);
    let mut assets = Assets::new();
    let (vertices, indices) = quad();
    let quad_mesh = assets
        .meshes
        .insert(Mesh::from_vertices(&device, &vertices, &indices));

    let shaders = ShaderManager::new();
    let shadow_maps = ShadowMapRegistry::new();

    let mut ground = PhongMaterialData::with_colors(
        Vec4::new(0.05, 0.05, 0.05, 1.0),
        Vec4::new(0.6, 0.6, 0.55, 1.0),
        Vec4::splat(0.1),
    );
    if let Some(path) = std::env::args().nth(1) {
        let texture = backend.load_texture(&path, true)?;
        ground = ground.with_diffuse_texture(assets.textures.insert(texture));
    }
    let panel = PhongMaterialData::with_colors(
        Vec4::new(0.1, 0.02, 0.02, 1.0),
        Vec4::new(0.8, 0.2, 0.2, 1.0),
        Vec4::ONE,
    )
    .with_shininess(32.0);
    for (key, material) in [("ground", ground), ("panel", panel)] {
        shaders.set(
            key,
            material,
            ResourceDataState::Mutable,
            ResourcePolicy::Resident,
        );
    }
    shaders.set(
        "sun",
        LightSetup::default_lights(),
        ResourceDataState::Mutable,
        ResourcePolicy::Resident,
    );

    let camera = Camera {
        eye: Vec3::new(0.0, 3.0, 6.0),
        target: Vec3::new(0.0, 0.5, 0.0),
        up: Vec3::Y,
        projection: Projection::Perspective {
            fov_y_radians: 50f32.to_radians(),
            aspect: WIDTH as f32 / HEIGHT as f32,
            near: 0.1,
            far: 50.0,
        },
    };

    let mut sun = ShadowLight::new(Mat4::IDENTITY);
    sun.setup_layers(SHADOW_LAYERS);
    sun.setup_split_distances(0.1, 50.0, 2.0);
    sun.set_target(Vec3::new(0.4, 1.0, 0.3), Vec3::Z, &camera.view_proj());
    let layer_cameras: Vec<Camera> = (0..SHADOW_LAYERS)
        .filter_map(|layer| sun.layer_camera(layer).copied())
        .collect();
    let shadow_map = backend.create_shadow_map("SunShadowMap", SHADOW_LAYERS as u32);
    let layer_views: Vec<wgpu::TextureView> = (0..SHADOW_LAYERS as u32)
        .map(|layer| shadow_map.layer_view(layer))
        .collect();
    sun.set_shadow_texture(assets.textures.insert(shadow_map));
    shadow_maps.set(
        "sun",
        LightSetupShadowMaps::new(vec![sun]),
        ResourceDataState::Mutable,
        ResourcePolicy::Resident,
    );

    let mut graph = SceneGraph::new();
    let root = graph.add_node(None, Transform::IDENTITY);
    let ground_node = graph.add_node(
        Some(root),
        Transform::from_trs(
            Vec3::ZERO,
            Quat::from_rotation_x(-FRAC_PI_2),
            Vec3::splat(10.0),
        ),
    );
    let panel_node = graph.add_node(
        Some(root),
        Transform::from_trs(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::splat(2.0)),
    );
    graph.set_node_id(ground_node, 1);
    graph.set_node_id(panel_node, 2);

    let opaque = graph.create_group();
    let casters = graph.create_group();
    for (node, material) in [(ground_node, "ground"), (panel_node, "panel")] {
        let config = GenericDrawableConfig::new(node, quad_mesh, &shaders, "sun", material)
            .with_shadow_map_registry(&shadow_maps);
        graph.attach(opaque, Box::new(GenericDrawable::new(config)));
    }
    graph.attach(
        casters,
        Box::new(ShadowCasterDrawable::new(panel_node, quad_mesh, &shaders)),
    );

    let color = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("DemoColor"),
        size: wgpu::Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
    let object_id = ObjectIdTarget::new(&device, WIDTH, HEIGHT);
    let depth = Depth::new(&device, WIDTH, HEIGHT);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("DemoFrame"),
    });

    for (layer, (view, shadow_camera)) in layer_views.iter().zip(&layer_cameras).enumerate() {
        let mut list = DrawList::new();
        graph.draw_group(casters, shadow_camera, &mut list);
        let issued = backend.submit_shadow_layer(&mut encoder, view, &assets, &list);
        log::info!("Shadow layer {}: {} casters", layer, issued);
    }

    let mut list = DrawList::new();
    graph.draw_group(opaque, &camera, &mut list);
    let targets = FrameTargets {
        color: &color_view,
        object_id: &object_id.view,
        depth: &depth.view,
    };
    let issued = backend.submit(&mut encoder, &targets, &assets, &list);
    queue.submit(Some(encoder.finish()));

    log::info!(
        "Rendered {} draws with {} variant pipelines ({} Phong variants cached)",
        issued,
        backend.pipeline_count(),
        shaders.count::<PhongShader>()
    );
    Ok(())
}
