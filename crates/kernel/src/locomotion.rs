use crate::rig::CameraRig;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use walkscene_input::{Action, InputState, PointerLock};

/// Tuning for the walk integrator.
///
/// At steady single-axis input speed settles at `acceleration / damping`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocomotionParams {
    pub damping: f32,
    pub acceleration: f32,
}

impl Default for LocomotionParams {
    fn default() -> Self {
        Self {
            damping: 40.0,
            acceleration: 400.0,
        }
    }
}

impl LocomotionParams {
    pub fn terminal_speed(&self) -> f32 {
        self.acceleration / self.damping
    }
}

/// Unit walking direction for the held keys, or zero.
///
/// `x` is `left - right`, `y` is `forward - backward`.
pub fn move_direction(input: &InputState) -> Vec2 {
    let axis = |pos: bool, neg: bool| pos as i8 as f32 - neg as i8 as f32;
    Vec2::new(
        axis(input.left, input.right),
        axis(input.forward, input.backward),
    )
    .normalize_or_zero()
}

/// First-person walk controller.
///
/// Owns the directional flags, the pointer-lock session and a damped
/// horizontal velocity. `velocity.x` is lateral, `velocity.y` is the
/// forward axis; forward input drives it negative.
#[derive(Debug, Clone, Default)]
pub struct LocomotionController {
    params: LocomotionParams,
    input: InputState,
    lock: PointerLock,
    velocity: Vec2,
}

impl LocomotionController {
    pub fn new(params: LocomotionParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> LocomotionParams {
        self.params
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn lock(&self) -> &PointerLock {
        &self.lock
    }

    pub fn is_view_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Fold a host action into the controller's state. Returns `true` if the
    /// host must be asked to capture the pointer.
    pub fn handle(&mut self, action: Action) -> bool {
        action.apply(&mut self.input, &mut self.lock)
    }

    /// Advance one frame and walk `rig`.
    ///
    /// Returns the displacement applied as `(right, forward)` distances,
    /// zero while the view is unlocked. Velocity is damped and accelerated
    /// regardless of the lock so no drift is left over on re-lock.
    pub fn tick(&mut self, dt: f32, rig: &mut impl CameraRig) -> Vec2 {
        let LocomotionParams {
            damping,
            acceleration,
        } = self.params;

        // Forward Euler, not an exact exponential.
        self.velocity.x -= self.velocity.x * damping * dt;
        self.velocity.y -= self.velocity.y * damping * dt;

        let dir = move_direction(&self.input);
        if self.input.forward || self.input.backward {
            self.velocity.y -= dir.y * acceleration * dt;
        }
        if self.input.left || self.input.right {
            self.velocity.x -= dir.x * acceleration * dt;
        }

        if !self.lock.is_locked() {
            return Vec2::ZERO;
        }

        let right = self.velocity.x * dt;
        let forward = -self.velocity.y * dt;
        rig.move_right(right);
        rig.move_forward(forward);
        Vec2::new(right, forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::YawRig;
    use walkscene_input::Direction;

    const DT: f32 = 0.016;

    fn locked() -> LocomotionController {
        let mut c = LocomotionController::default();
        c.handle(Action::RequestLock);
        c.handle(Action::LockResolved(true));
        assert!(c.is_view_locked());
        c
    }

    #[test]
    fn default_constants() {
        let p = LocomotionParams::default();
        assert_eq!(p.damping, 40.0);
        assert_eq!(p.acceleration, 400.0);
        assert_eq!(p.terminal_speed(), 10.0);
    }

    #[test]
    fn direction_is_unit_or_zero_for_every_input() {
        for input in InputState::all_combinations() {
            let d = move_direction(&input);
            assert!(!d.x.is_nan() && !d.y.is_nan());
            let len = d.length();
            assert!(len == 0.0 || (len - 1.0).abs() < 1e-6, "{input:?} -> {d}");
        }
    }

    #[test]
    fn opposite_keys_cancel() {
        let input = InputState {
            forward: true,
            backward: true,
            ..Default::default()
        };
        assert_eq!(move_direction(&input), Vec2::ZERO);
    }

    #[test]
    fn diagonal_is_normalized() {
        let input = InputState {
            forward: true,
            left: true,
            ..Default::default()
        };
        let d = move_direction(&input);
        assert!((d.x - d.y).abs() < 1e-6);
        assert!((d.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn first_tick_matches_euler_step() {
        let mut c = locked();
        let mut rig = YawRig::default();
        c.handle(Action::Press(Direction::Forward));
        c.tick(DT, &mut rig);
        assert!((c.velocity().y - -400.0 * DT).abs() < 1e-5);
        assert_eq!(c.velocity().x, 0.0);
    }

    #[test]
    fn held_forward_converges_without_overshoot() {
        let mut c = locked();
        let mut rig = YawRig::default();
        c.handle(Action::Press(Direction::Forward));

        let limit = c.params().terminal_speed();
        let mut prev = 0.0_f32;
        for i in 0..60 {
            c.tick(DT, &mut rig);
            let speed = c.velocity().y.abs();
            if i == 0 {
                assert!(speed > prev);
            } else {
                assert!(speed + 1e-5 >= prev, "tick {i}: {speed} < {prev}");
            }
            assert!(speed <= limit + 1e-4, "tick {i}: {speed} > {limit}");
            prev = speed;
        }
        assert!((prev - limit).abs() < 1e-3);
    }

    #[test]
    fn released_velocity_decays_without_flipping_sign() {
        let mut c = locked();
        let mut rig = YawRig::default();
        c.set_velocity(Vec2::new(-7.5, 3.0));
        let mut prev = c.velocity();
        for _ in 0..200 {
            c.tick(DT, &mut rig);
            let v = c.velocity();
            assert!(v.length() <= prev.length());
            assert!(v.x <= 0.0 && v.y >= 0.0);
            prev = v;
        }
        assert!(prev.length() < 1e-3);
    }

    #[test]
    fn unlocked_view_never_moves() {
        let mut c = LocomotionController::default();
        let mut rig = YawRig::default();
        let start = rig.position;
        for d in Direction::ALL {
            c.handle(Action::Press(d));
        }
        c.handle(Action::Release(Direction::Backward));
        c.handle(Action::Release(Direction::Right));
        for _ in 0..100 {
            assert_eq!(c.tick(DT, &mut rig), Vec2::ZERO);
        }
        assert_eq!(rig.position, start);
    }

    #[test]
    fn pending_lock_behaves_unlocked() {
        let mut c = LocomotionController::default();
        let mut rig = YawRig::default();
        assert!(c.handle(Action::RequestLock));
        c.handle(Action::Press(Direction::Forward));
        c.tick(DT, &mut rig);
        assert_eq!(rig.position, YawRig::default().position);
    }

    #[test]
    fn velocity_decays_while_unlocked() {
        let mut c = LocomotionController::default();
        let mut rig = YawRig::default();
        c.set_velocity(Vec2::new(5.0, -5.0));
        for _ in 0..100 {
            c.tick(DT, &mut rig);
        }
        assert!(c.velocity().length() < 1e-3);
    }

    #[test]
    fn forward_walks_along_view_direction() {
        let mut c = locked();
        let mut rig = YawRig::default();
        let start = rig.position;
        c.handle(Action::Press(Direction::Forward));
        for _ in 0..30 {
            c.tick(DT, &mut rig);
        }
        let moved = rig.position - start;
        assert!(moved.z < 0.0);
        assert!(moved.x.abs() < 1e-4);
        assert_eq!(moved.y, 0.0);
    }

    #[test]
    fn left_strafes_against_camera_right() {
        let mut c = locked();
        let mut rig = YawRig::default();
        c.handle(Action::Press(Direction::Left));
        let step = c.tick(DT, &mut rig);
        assert!(step.x < 0.0);
        assert!(rig.position.x < YawRig::default().position.x);
    }

    #[test]
    fn translation_is_camera_relative() {
        let mut c = locked();
        let mut rig = YawRig::new(glam::Vec3::ZERO, 0.0);
        c.handle(Action::Press(Direction::Forward));
        c.tick(DT, &mut rig);
        assert!(rig.position.x > 0.0);
        assert!(rig.position.z.abs() < 1e-6);
    }

    #[test]
    fn tick_never_touches_yaw() {
        let mut c = locked();
        let mut rig = YawRig::new(glam::Vec3::ZERO, 1.25);
        c.handle(Action::Press(Direction::Right));
        c.tick(DT, &mut rig);
        assert_eq!(rig.yaw, 1.25);
    }
}
