use glam::{Mat4, Vec2, Vec3};

use crate::asset::Handle;
use crate::renderer::Texture;
use crate::scene::{Camera, Projection};

/// Maps NDC (y up, depth already in [0, 1]) to shadow-texture coordinates
/// (y down).
const NDC_TO_TEXTURE: Mat4 = Mat4::from_cols_array(&[
    0.5, 0.0, 0.0, 0.0, //
    0.0, -0.5, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.5, 0.5, 0.0, 1.0,
]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowLayer {
    /// World space to shadow-texture space.
    pub shadow_matrix: Mat4,
    /// Far end of the layer as non-linear depth in [0, 1].
    pub cut_plane: f32,
    /// Shadow camera fitted by [`ShadowLight::set_target`].
    pub camera: Option<Camera>,
}

impl Default for ShadowLayer {
    fn default() -> Self {
        Self {
            shadow_matrix: Mat4::IDENTITY,
            cut_plane: 1.0,
            camera: None,
        }
    }
}

/// Directional light that owns a layered (cascaded) shadow map.
///
/// The node transformation faces the direction the light travels. Layer
/// matrices come from [`ShadowLight::set_target`] or are written directly by
/// whichever pass renders the shadow maps.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowLight {
    transformation: Mat4,
    layers: Vec<ShadowLayer>,
    shadow_texture: Option<Handle<Texture>>,
}

impl ShadowLight {
    pub fn new(transformation: Mat4) -> Self {
        Self {
            transformation,
            layers: Vec::new(),
            shadow_texture: None,
        }
    }

    /// Reset to `count` identity layers. Call before
    /// [`setup_split_distances`](Self::setup_split_distances).
    pub fn setup_layers(&mut self, count: usize) {
        self.layers = vec![ShadowLayer::default(); count];
    }

    /// Distribute the layer cut planes along a power series between the
    /// camera's near and far planes.
    pub fn setup_split_distances(&mut self, near: f32, far: f32, power: f32) {
        let count = self.layers.len() as f32;
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let linear_depth = near + ((i + 1) as f32 / count).powf(power) * (far - near);
            let non_linear_depth = (far + near - 2.0 * near * far / linear_depth) / (far - near);
            layer.cut_plane = (non_linear_depth + 1.0) / 2.0;
        }
    }

    pub fn cut_z(&self, layer: usize) -> f32 {
        self.layers[layer].cut_plane
    }

    /// Linear view distance of a layer's cut plane.
    pub fn cut_distance(&self, near: f32, far: f32, layer: usize) -> f32 {
        let depth_sample = 2.0 * self.layers[layer].cut_plane - 1.0;
        2.0 * near * far / (far + near - depth_sample * (far - near))
    }

    /// Corners of the slice of the frustum described by `inverse_view_proj`
    /// between NDC depths `z0` and `z1`.
    pub fn frustum_corners(inverse_view_proj: &Mat4, z0: f32, z1: f32) -> [Vec3; 8] {
        let corner = |x: f32, y: f32, z: f32| inverse_view_proj.project_point3(Vec3::new(x, y, z));
        [
            corner(-1.0, -1.0, z0),
            corner(1.0, -1.0, z0),
            corner(-1.0, 1.0, z0),
            corner(1.0, 1.0, z0),
            corner(-1.0, -1.0, z1),
            corner(1.0, -1.0, z1),
            corner(-1.0, 1.0, z1),
            corner(1.0, 1.0, z1),
        ]
    }

    /// Frustum slice covered by `layer` of a camera with the given matrices.
    pub fn layer_frustum_corners(&self, view_proj: &Mat4, layer: usize) -> [Vec3; 8] {
        let z0 = if layer == 0 {
            0.0
        } else {
            self.layers[layer - 1].cut_plane
        };
        let z1 = self.layers[layer].cut_plane;
        Self::frustum_corners(&view_proj.inverse(), z0, z1)
    }

    /// Fit one orthographic shadow camera per layer around the slice of the
    /// main camera frustum that layer covers, and derive the layer's
    /// world-to-shadow-texture matrix from it.
    ///
    /// `light_direction` points towards the light, `screen_direction` is the
    /// up vector of the shadow cameras.
    pub fn set_target(
        &mut self,
        light_direction: Vec3,
        screen_direction: Vec3,
        camera_view_proj: &Mat4,
    ) {
        let Some(light_direction) = light_direction.try_normalize() else {
            log::warn!("Shadow light direction is zero, keeping previous target");
            return;
        };
        if light_direction.cross(screen_direction).length_squared() < 1e-8 {
            log::warn!(
                "Shadow screen direction {:?} is parallel to the light, keeping previous target",
                screen_direction
            );
            return;
        }

        let rotation = Mat4::look_to_rh(Vec3::ZERO, -light_direction, screen_direction);
        self.transformation = rotation.inverse();

        let inverse_view_proj = camera_view_proj.inverse();
        let mut z0 = 0.0;
        for layer in &mut self.layers {
            let corners = Self::frustum_corners(&inverse_view_proj, z0, layer.cut_plane);
            z0 = layer.cut_plane;

            let (min, max) = corners.iter().fold(
                (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
                |(min, max), &corner| {
                    let p = rotation.transform_point3(corner);
                    (min.min(p), max.max(p))
                },
            );
            let mid = (min + max) * 0.5;
            let range = max - min;
            let eye = self.transformation.transform_point3(mid);

            let camera = Camera {
                eye,
                target: eye - light_direction,
                up: screen_direction,
                projection: Projection::Orthographic {
                    size: Vec2::new(range.x, range.y),
                    near: -0.5 * range.z,
                    far: 0.5 * range.z,
                },
            };
            layer.shadow_matrix = NDC_TO_TEXTURE * camera.view_proj();
            layer.camera = Some(camera);
        }
    }

    /// Shadow camera of `layer`, once [`set_target`](Self::set_target) ran.
    pub fn layer_camera(&self, layer: usize) -> Option<&Camera> {
        self.layers.get(layer)?.camera.as_ref()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_matrix(&self, layer: usize) -> Mat4 {
        self.layers[layer].shadow_matrix
    }

    pub fn set_layer_matrix(&mut self, layer: usize, matrix: Mat4) {
        match self.layers.get_mut(layer) {
            Some(data) => data.shadow_matrix = matrix,
            None => log::warn!(
                "Shadow layer {} out of range ({} layers)",
                layer,
                self.layers.len()
            ),
        }
    }

    pub fn layer_matrices(&self) -> Vec<Mat4> {
        self.layers.iter().map(|layer| layer.shadow_matrix).collect()
    }

    pub fn transformation(&self) -> Mat4 {
        self.transformation
    }

    pub fn set_transformation(&mut self, transformation: Mat4) {
        self.transformation = transformation;
    }

    /// Backward axis of the light node, i.e. the direction towards the light.
    pub fn light_direction(&self) -> Vec3 {
        self.transformation.z_axis.truncate()
    }

    pub fn shadow_texture(&self) -> Option<Handle<Texture>> {
        self.shadow_texture
    }

    pub fn set_shadow_texture(&mut self, texture: Handle<Texture>) {
        self.shadow_texture = Some(texture);
    }
}
