use glam::{Mat4, Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    /// `size` is the full width/height of the view volume.
    Orthographic { size: Vec2, near: f32, far: f32 },
}

impl Projection {
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Projection::Perspective {
                fov_y_radians,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y_radians, aspect, near, far),
            Projection::Orthographic { size, near, far } => {
                let half = size * 0.5;
                Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, near, far)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl Camera {
    /// World space to camera space.
    pub fn camera_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.camera_matrix()
    }

    pub fn position(&self) -> Vec3 {
        self.eye
    }

    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Projection::Perspective {
                fov_y_radians: 60f32.to_radians(),
                aspect: 16.0 / 9.0,
                near: 0.1,
                far: 100.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_proj_is_reasonable() {
        let cam = Camera::default();
        let vp = cam.view_proj();
        let id = vp * vp.inverse();
        assert!(id.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn camera_matrix_moves_eye_to_origin() {
        let cam = Camera::default();
        let p = cam.camera_matrix().transform_point3(cam.eye);
        assert!(p.abs_diff_eq(Vec3::ZERO, 1e-6));
    }

    #[test]
    fn orthographic_maps_extent_to_ndc_edges() {
        let projection = Projection::Orthographic {
            size: Vec2::new(4.0, 2.0),
            near: 0.0,
            far: 10.0,
        };
        let p = projection.matrix().project_point3(Vec3::new(2.0, 1.0, -5.0));
        assert!((p.x - 1.0).abs() < 1e-6 && (p.y - 1.0).abs() < 1e-6);
    }
}
