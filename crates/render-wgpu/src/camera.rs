use glam::{Mat4, Vec3};
use walkscene_assets::CameraConfig;
use walkscene_kernel::CameraRig;

/// Radians of rotation per pixel of pointer motion at pointer speed 1.
const LOOK_RADIANS_PER_PIXEL: f32 = 0.002;
/// Keeps pitch just short of straight up/down so the view basis stays valid.
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.001;

/// First-person camera: position, yaw, pitch, and projection parameters.
///
/// Yaw and pitch are driven by pointer look; position is driven by the
/// locomotion controller through [`CameraRig`].
#[derive(Debug, Clone, Copy)]
pub struct WalkCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub pointer_speed: f32,
}

impl Default for WalkCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl WalkCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: config.position,
            yaw: config.yaw_deg.to_radians(),
            pitch: 0.0,
            fov: config.fov_deg.to_radians(),
            aspect: 16.0 / 9.0,
            near: config.near,
            far: config.far,
            pointer_speed: config.pointer_speed,
        }
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Apply relative pointer motion in pixels.
    pub fn look(&mut self, dx: f32, dy: f32) {
        let k = LOOK_RADIANS_PER_PIXEL * self.pointer_speed;
        self.yaw += dx * k;
        self.pitch = (self.pitch - dy * k).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

impl CameraRig for WalkCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }
}
