//! Developer Tooling: frame and scene inspector.
//!
//! # Invariants
//! - Tools only read state; nothing here mutates the kernel or scene.

mod inspector;

pub use inspector::{FrameSummary, NodeInfo, SceneInspector};
