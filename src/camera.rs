use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Perspective camera looking at a fixed target
///
/// Projection parameters are fixed at construction; only `position` moves.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    target: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from_array(config.position),
            target: Vec3::ZERO,
            fov_y: config.fov_degrees.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn clip_planes(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_from_config() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);

        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(camera.target(), Vec3::ZERO);
        assert!((camera.fov_y() - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(camera.clip_planes(), (0.1, 500.0));
    }

    #[test]
    fn forward_points_at_origin() {
        let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        assert_eq!(camera.forward(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 1.0);
        let clip = camera.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
