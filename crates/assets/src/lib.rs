//! Scene assets: YAML configuration, binary glTF import, background loading.
//!
//! Decorative models load off the frame loop. The kernel never waits on
//! them; a node that is still pending or failed to load is simply not drawn.
//!
//! # Layout
//! - [`config`]: the declarative scene description and its presets.
//! - [`gltf`]: header-level import of `.glb` / `.gltf` files.
//! - [`scene`]: per-node load status and the loaders that fill it in.

pub mod config;
pub mod gltf;
pub mod scene;

pub use config::{
    AudioConfig, CameraConfig, GroundConfig, LightConfig, LightingConfig, ModelConfig, Preset,
    SceneConfig, SmokeConfig,
};
pub use gltf::{AssetId, ModelInfo, import_model, parse_model};
pub use scene::{LoadOutcome, NodeStatus, Scene, SceneNode, load_model, load_scene, spawn_loader};

/// Errors from asset and configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a glTF file: {0}")]
    BadMagic(String),
    #[error("unsupported glTF container version {0}")]
    UnsupportedVersion(u32),
    #[error("truncated glTF container: {0}")]
    Truncated(&'static str),
    #[error("first glTF chunk is not JSON (type {0:#010x})")]
    MissingJsonChunk(u32),
    #[error("invalid scene configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}
