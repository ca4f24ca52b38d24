use glam::Mat4;
use househunt_render::RenderView;

/// Perspective projection parameters. Kept outside the kernel; only the
/// window knows the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    /// Track the surface size. Zero-sized surfaces keep the old aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_matrix(view: &RenderView) -> Mat4 {
        Mat4::look_at_rh(view.eye, view.target, view.up)
    }

    pub fn view_projection(&self, view: &RenderView) -> Mat4 {
        self.matrix() * Self::view_matrix(view)
    }
}
