//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read a [`FrameView`]; they never mutate the kernel or scene.
//! - A frame can be rendered whether or not decorative models have loaded.

mod renderer;

pub use renderer::{DebugTextRenderer, FrameView, Renderer};
