//! Free-fly Euler camera.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Yaw/pitch camera in degrees with a scroll-controlled field of view.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub world_up: Vec3,
    /// Degrees; -90 looks down -Z.
    yaw: f32,
    /// Degrees, clamped to [-89, 89].
    pitch: f32,
    /// Field of view in degrees, clamped to [1, 90].
    fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    /// Units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    front: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            aspect: 1600.0 / 1200.0,
            speed: 2.5,
            sensitivity: 0.1,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
        };
        camera.update_vectors();
        camera
    }
}

impl Camera {
    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Mouse look from a raw pixel delta. Screen Y grows downward.
    pub fn process_mouse(&mut self, delta_x: f32, delta_y: f32) {
        self.yaw += delta_x * self.sensitivity;
        self.pitch = (self.pitch - delta_y * self.sensitivity).clamp(-89.0, 89.0);
        self.update_vectors();
    }

    /// Move along the view direction (`input.y`) and strafe (`input.x`).
    pub fn process_movement(&mut self, input: Vec2, dt: f32) {
        let velocity = self.speed * dt;
        self.position += self.front * input.y * velocity;
        self.position += self.right * input.x * velocity;
    }

    /// Zoom by narrowing the field of view. Positive `lines` zooms in.
    pub fn process_scroll(&mut self, lines: f32) {
        self.fov_degrees = (self.fov_degrees - lines).clamp(1.0, 90.0);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }
}

/// Per-frame scene uniform: camera matrices and the point light.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = light position, w unused.
    pub light_position: [f32; 4],
    /// rgb = light colour, w unused.
    pub light_color: [f32; 4],
}

impl SceneUniform {
    pub fn new(camera: &Camera, light_position: Vec3, light_color: Vec3) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            light_color: light_color.extend(1.0).to_array(),
        }
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new(&Camera::default(), Vec3::new(2.0, 2.0, 0.0), Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!((camera.front() - Vec3::NEG_Z).length() < 1e-6);
        assert!((camera.right() - Vec3::X).length() < 1e-6);
        assert!((camera.up() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.process_mouse(0.0, -100_000.0);
        assert_eq!(camera.pitch(), 89.0);
        camera.process_mouse(0.0, 100_000.0);
        assert_eq!(camera.pitch(), -89.0);
        assert!(camera.up().y > 0.0);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut camera = Camera::default();
        camera.process_mouse(900.0, 0.0);
        // yaw -90 -> 0 looks down +X
        assert!((camera.front() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn scroll_clamps_field_of_view() {
        let mut camera = Camera::default();
        camera.process_scroll(100.0);
        assert_eq!(camera.fov_degrees(), 1.0);
        camera.process_scroll(-500.0);
        assert_eq!(camera.fov_degrees(), 90.0);
    }

    #[test]
    fn movement_follows_view_axes() {
        let mut camera = Camera::default();
        camera.process_movement(Vec2::new(0.0, 1.0), 2.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, -2.0)).length() < 1e-5);
        camera.process_movement(Vec2::new(-1.0, 0.0), 1.0);
        assert!((camera.position - Vec3::new(-2.5, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn aspect_tracks_surface() {
        let mut camera = Camera::default();
        camera.set_aspect(800, 0);
        assert_eq!(camera.aspect, 800.0);
        camera.set_aspect(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn uniform_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
    }
}
