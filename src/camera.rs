//! Perspective camera looking at the origin.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view (degrees)
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Camera for a `width` x `height` viewport. A zero height is treated
    /// as one pixel so the aspect stays finite.
    pub fn for_viewport(fov: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        Self::new(fov, aspect_ratio(width, height), near, far)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// New aspect from the viewport size. Call
    /// [`update_projection_matrix`](Self::update_projection_matrix) after.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        let up = if self.position.cross(Vec3::Y).length_squared() > f32::EPSILON {
            Vec3::Y
        } else {
            Vec3::Z
        };
        Mat4::look_at_rh(self.position, Vec3::ZERO, up)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}
