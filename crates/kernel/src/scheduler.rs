use crate::locomotion::{LocomotionController, LocomotionParams};
use crate::particles::{ParticleField, SmokeParams};
use crate::rig::CameraRig;
use glam::Vec2;

/// What one frame did, for overlays and logs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub displacement: Vec2,
    pub recycled: usize,
}

/// Drives the per-frame components in a fixed order: locomotion, then smoke.
///
/// Single-threaded and non-reentrant; `tick` runs to completion before the
/// frame is presented.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    pub locomotion: LocomotionController,
    pub smoke: ParticleField,
    frame: u64,
}

impl FrameScheduler {
    pub fn new(locomotion: LocomotionParams, smoke: SmokeParams) -> Self {
        Self {
            locomotion: LocomotionController::new(locomotion),
            smoke: ParticleField::new(smoke),
            frame: 0,
        }
    }

    /// Frames ticked so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn tick(&mut self, dt: f32, rig: &mut impl CameraRig) -> FrameReport {
        let displacement = self.locomotion.tick(dt, rig);
        self.finish(displacement)
    }

    /// Like [`tick`](Self::tick), but walks in steps of at most `max_step`
    /// seconds that sum to `dt`. Smoke still advances exactly once.
    pub fn tick_substepped(
        &mut self,
        dt: f32,
        max_step: f32,
        rig: &mut impl CameraRig,
    ) -> FrameReport {
        if max_step.is_nan() || max_step <= 0.0 {
            return self.tick(dt, rig);
        }
        let mut remaining = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut displacement = Vec2::ZERO;
        while remaining > 0.0 {
            let step = remaining.min(max_step);
            displacement += self.locomotion.tick(step, rig);
            remaining -= step;
        }
        self.finish(displacement)
    }

    fn finish(&mut self, displacement: Vec2) -> FrameReport {
        let recycled = self.smoke.tick();
        self.frame += 1;
        FrameReport {
            frame: self.frame,
            displacement,
            recycled,
        }
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(LocomotionParams::default(), SmokeParams::default())
    }
}
