use glam::{Mat4, Vec3, Vec4};

/// Space a light position is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightPositionModel {
    /// Already relative to the camera.
    Camera,
    /// Relative to the drawable being lit.
    Object,
    /// World space.
    #[default]
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightInfo {
    pub position: Vec3,
    pub color: Vec4,
    pub model: LightPositionModel,
}

impl LightInfo {
    pub fn new(position: Vec3, color: Vec4, model: LightPositionModel) -> Self {
        Self {
            position,
            color,
            model,
        }
    }

    pub fn global(position: Vec3, color: Vec4) -> Self {
        Self::new(position, color, LightPositionModel::Global)
    }
}

/// Ordered lights shared by every drawable that references the same key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightSetup {
    lights: Vec<LightInfo>,
}

impl LightSetup {
    pub fn new(lights: Vec<LightInfo>) -> Self {
        Self { lights }
    }

    /// Setup with no lights; drawables using it get a zero-light variant.
    pub fn no_lights() -> Self {
        Self::default()
    }

    /// A single white light attached to the camera, slightly above it.
    pub fn default_lights() -> Self {
        Self::new(vec![LightInfo::new(
            Vec3::new(0.0, 0.5, 0.0),
            Vec4::ONE,
            LightPositionModel::Camera,
        )])
    }

    /// One global light on each corner of the box spanned by `min`/`max`.
    pub fn lights_at_box_corners(min: Vec3, max: Vec3, color: Vec4) -> Self {
        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        });
        Self::new(corners.map(|corner| LightInfo::global(corner, color)).collect())
    }

    pub fn push(&mut self, light: LightInfo) {
        self.lights.push(light);
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn lights(&self) -> &[LightInfo] {
        &self.lights
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LightInfo> {
        self.lights.iter()
    }
}

impl std::ops::Index<usize> for LightSetup {
    type Output = LightInfo;

    fn index(&self, index: usize) -> &LightInfo {
        &self.lights[index]
    }
}

impl FromIterator<LightInfo> for LightSetup {
    fn from_iter<I: IntoIterator<Item = LightInfo>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Position of `light` in camera space, given the drawable's
/// object-to-camera `transformation` and the world-to-camera `camera_matrix`.
pub fn get_light_position_relative_to_camera(
    light: &LightInfo,
    transformation: &Mat4,
    camera_matrix: &Mat4,
) -> Vec3 {
    match light.model {
        LightPositionModel::Object => transformation.transform_point3(light.position),
        LightPositionModel::Global => camera_matrix.transform_point3(light.position),
        LightPositionModel::Camera => light.position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_lights_go_through_camera_matrix() {
        let light = LightInfo::global(Vec3::new(1.0, 2.0, 3.0), Vec4::ONE);
        let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let object = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let p = get_light_position_relative_to_camera(&light, &object, &camera);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, -2.0), 1e-6));
    }

    #[test]
    fn object_lights_follow_the_drawable() {
        let light = LightInfo::new(Vec3::X, Vec4::ONE, LightPositionModel::Object);
        let object = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let p = get_light_position_relative_to_camera(&light, &object, &Mat4::IDENTITY);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn camera_lights_are_untouched() {
        let light = LightInfo::new(Vec3::Y, Vec4::ONE, LightPositionModel::Camera);
        let m = Mat4::from_scale(Vec3::splat(3.0));
        assert_eq!(get_light_position_relative_to_camera(&light, &m, &m), Vec3::Y);
    }

    #[test]
    fn box_corner_setup_has_eight_distinct_lights() {
        let setup = LightSetup::lights_at_box_corners(Vec3::ZERO, Vec3::ONE, Vec4::ONE);
        assert_eq!(setup.len(), 8);
        assert_eq!(setup[0].position, Vec3::ZERO);
        assert_eq!(setup[7].position, Vec3::ONE);
        for (i, a) in setup.iter().enumerate() {
            for b in &setup.lights()[i + 1..] {
                assert_ne!(a.position, b.position);
            }
        }
    }
}
