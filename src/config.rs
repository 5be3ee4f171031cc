use glam::Vec3;

use crate::camera::Camera;

/// Viewport and camera settings for an [`OrbitCamera`](crate::OrbitCamera).
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of the remaining distance covered per zoom step.
    pub zoom_step: f32,
    pub sensitivity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            eye: Vec3::new(0.0, 5.0, 50.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 45.0,
            near: 0.1,
            far: 1000.0,
            zoom_step: 0.1,
            sensitivity: 1.0,
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn eye(mut self, eye: impl Into<Vec3>) -> Self {
        self.eye = eye.into();
        self
    }

    pub fn center(mut self, center: impl Into<Vec3>) -> Self {
        self.center = center.into();
        self
    }

    pub fn up(mut self, up: impl Into<Vec3>) -> Self {
        self.up = up.into();
        self
    }

    pub fn fov(mut self, degrees: f32) -> Self {
        self.fovy = degrees;
        self
    }

    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn zoom_step(mut self, step: f32) -> Self {
        self.zoom_step = step;
        self
    }

    pub fn sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// The initial camera described by this config.
    pub fn camera(&self) -> Camera {
        Camera::new()
            .at(self.eye.x, self.eye.y, self.eye.z)
            .looking_at(self.center)
            .with_up(self.up)
            .with_fov(self.fovy)
            .with_clip(self.near, self.far)
    }
}
