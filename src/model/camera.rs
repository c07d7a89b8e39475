use glam::{Mat4, Vec3};

use crate::config::ViewConfig;

pub struct Camera {
    /// World-to-view matrix
    pub view: Mat4,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(cfg: &ViewConfig, width: u32, height: u32) -> Self {
        let mut cam = Self {
            view: Mat4::IDENTITY,
            fov_y: cfg.fov_y,
            aspect: 1.0,
            z_near: cfg.z_near,
            z_far: cfg.z_far,
        };
        cam.set_aspect(width, height);
        cam
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        // A zero-height viewport happens while minimized
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn look_at(&mut self, eye: Vec3, target: Vec3) {
        self.view = Mat4::look_at_rh(eye, target, Vec3::Y);
    }

    /// Place the camera at a node of the transform graph; the camera looks down its local -z
    pub fn set_world_transform(&mut self, world: Mat4) {
        self.view = world.inverse();
    }

    pub fn eye(&self) -> Vec3 {
        self.view.inverse().transform_point3(Vec3::ZERO)
    }

    pub fn forward(&self) -> Vec3 {
        self.view.inverse().transform_vector3(Vec3::NEG_Z).normalize_or_zero()
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view
    }
}

/// Eye position on the menu orbit at the given angle
pub fn orbit_eye(radius: f32, height: f32, angle: f32) -> Vec3 {
    Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_tracks_viewport() {
        let mut cam = Camera::new(&ViewConfig::default(), 800, 600);
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
        cam.set_aspect(1920, 1080);
        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        cam.set_aspect(640, 0);
        assert!(cam.aspect.is_finite());
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = Camera::new(&ViewConfig::default(), 800, 600);
        let eye = orbit_eye(150.0, 75.0, 0.0);
        cam.look_at(eye, Vec3::ZERO);

        assert!(cam.eye().abs_diff_eq(Vec3::new(150.0, 75.0, 0.0), 1e-3));
        let expected = (Vec3::ZERO - eye).normalize();
        assert!(cam.forward().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn orbit_keeps_radius_and_height() {
        for step in 0..16 {
            let eye = orbit_eye(150.0, 75.0, step as f32 * 0.4);
            assert!((eye.y - 75.0).abs() < 1e-6);
            assert!((glam::Vec2::new(eye.x, eye.z).length() - 150.0).abs() < 1e-3);
        }
    }
}
