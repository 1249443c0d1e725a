//! Frame kernel: the stateful per-frame core of the scene.
//!
//! # Invariants
//! - Locomotion and particles share no state; they are composed only by the
//!   [`FrameScheduler`], which ticks locomotion first, then particles.
//! - No operation blocks or fails; every tick completes synchronously.
//! - Ticking never waits on decorative assets.

pub mod audio;
pub mod locomotion;
pub mod particles;
pub mod rig;
pub mod scheduler;

pub use audio::PositionalEmitter;
pub use locomotion::{LocomotionController, LocomotionParams};
pub use particles::{Particle, ParticleField, SmokeParams};
pub use rig::{CameraRig, YawRig};
pub use scheduler::{FrameReport, FrameScheduler};
