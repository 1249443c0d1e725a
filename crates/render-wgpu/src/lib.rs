//! wgpu render backend for the walkable scene.
//!
//! Draws a tinted ground plane, lit proxy boxes for loaded models and the
//! smoke field as additive camera-facing billboards.
//!
//! # Invariants
//! - Renderer never mutates kernel state; the host clears the smoke dirty
//!   flag after [`WgpuRenderer::upload_smoke`].
//! - Nodes whose models are pending or failed are skipped, never waited on.

mod camera;
mod gpu;
mod shaders;

pub use camera::WalkCamera;
pub use gpu::{SceneStyle, WgpuRenderer};
