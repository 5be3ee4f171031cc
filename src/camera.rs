use glam::{Mat4, Vec3};

/// A look-at camera: where the eye is, what it looks at, and its lens.
///
/// The view matrix is right-handed and the projection maps depth to `[0, 1]`,
/// matching wgpu's clip space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub fovy: f32, // radians
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 50.0),
            center: Vec3::ZERO,
            up: Vec3::Y,
            fovy: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.eye = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, target: impl Into<Vec3>) -> Self {
        self.center = target.into();
        self
    }

    pub fn with_up(mut self, up: impl Into<Vec3>) -> Self {
        self.up = up.into();
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fovy = fov_degrees.to_radians();
        self
    }

    pub fn with_clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Distance from the eye to the point it looks at.
    pub fn distance(&self) -> f32 {
        self.eye.distance(self.center)
    }

    pub fn look_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.center, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fovy, aspect, self.near, self.far)
    }
}
