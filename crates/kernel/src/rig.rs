use glam::Vec3;

/// Horizontal view direction for a yaw angle.
///
/// Yaw is measured from +X towards +Z, so `-90°` looks down -Z.
pub fn horizontal_forward(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, yaw.sin())
}

/// Camera-right on the ground plane for a yaw angle.
pub fn horizontal_right(yaw: f32) -> Vec3 {
    horizontal_forward(yaw).cross(Vec3::Y)
}

/// The camera object the locomotion controller walks around.
///
/// Rotation belongs to the pointer-look side; the controller only reads yaw
/// and translates.
pub trait CameraRig {
    fn position(&self) -> Vec3;

    fn yaw(&self) -> f32;

    fn translate(&mut self, delta: Vec3);

    /// Move along the camera's right vector.
    fn move_right(&mut self, distance: f32) {
        let right = horizontal_right(self.yaw());
        self.translate(right * distance);
    }

    /// Move along the view direction projected onto the ground plane, so
    /// looking up or down never changes height.
    fn move_forward(&mut self, distance: f32) {
        let forward = horizontal_forward(self.yaw());
        self.translate(forward * distance);
    }
}

/// Position plus yaw; a rig without any projection state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawRig {
    pub position: Vec3,
    pub yaw: f32,
}

impl YawRig {
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self { position, yaw }
    }
}

impl Default for YawRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 5.0),
            yaw: -90.0_f32.to_radians(),
        }
    }
}

impl CameraRig for YawRig {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_rig_looks_down_negative_z() {
        let rig = YawRig::default();
        assert!(close(horizontal_forward(rig.yaw), Vec3::NEG_Z));
        assert!(close(horizontal_right(rig.yaw), Vec3::X));
    }

    #[test]
    fn move_forward_follows_yaw() {
        let mut rig = YawRig::new(Vec3::ZERO, 0.0);
        rig.move_forward(2.0);
        assert!(close(rig.position, Vec3::new(2.0, 0.0, 0.0)));

        let mut turned = YawRig::new(Vec3::ZERO, 90.0_f32.to_radians());
        turned.move_forward(2.0);
        assert!(close(turned.position, Vec3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn move_right_is_perpendicular_to_forward() {
        for deg in [-170.0_f32, -90.0, 0.0, 33.0, 120.0] {
            let yaw = deg.to_radians();
            let dot = horizontal_forward(yaw).dot(horizontal_right(yaw));
            assert!(dot.abs() < 1e-5);
        }
    }

    #[test]
    fn movement_stays_on_ground_plane() {
        let mut rig = YawRig::default();
        let y = rig.position.y;
        rig.move_forward(5.0);
        rig.move_right(-3.0);
        assert_eq!(rig.position.y, y);
    }
}
