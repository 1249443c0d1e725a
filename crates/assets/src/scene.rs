use crate::AssetError;
use crate::config::{AudioConfig, ModelConfig, SceneConfig};
use crate::gltf::{ModelInfo, import_model};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use walkscene_common::Transform;

/// Load state of a decorative node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatus {
    Pending,
    Loaded(ModelInfo),
    Failed(String),
}

impl NodeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Loaded(_) => "loaded",
            NodeStatus::Failed(_) => "failed",
        }
    }
}

/// A model placed in the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub path: PathBuf,
    pub transform: Transform,
    pub audio: Option<AudioConfig>,
    pub status: NodeStatus,
}

impl SceneNode {
    fn from_config(model: &ModelConfig) -> Self {
        Self {
            name: model.name.clone(),
            path: model.path.clone(),
            transform: model.transform(),
            audio: model.audio.clone(),
            status: NodeStatus::Pending,
        }
    }

    pub fn model(&self) -> Option<&ModelInfo> {
        match &self.status {
            NodeStatus::Loaded(info) => Some(info),
            _ => None,
        }
    }
}

/// Result of one background model load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub index: usize,
    pub result: Result<ModelInfo, AssetError>,
}

/// Decorative scene graph. Nodes exist from the start and fill in as their
/// models arrive; the frame loop renders whatever is loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    /// Every configured model as a pending node.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            nodes: config.models.iter().map(SceneNode::from_config).collect(),
        }
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn pending_count(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Pending))
    }

    pub fn loaded_count(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Loaded(_)))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&NodeStatus) -> bool) -> usize {
        self.nodes.iter().filter(|n| pred(&n.status)).count()
    }

    /// Attach a finished load. Failures are recorded and logged, never
    /// propagated.
    pub fn apply(&mut self, outcome: LoadOutcome) {
        let Some(node) = self.nodes.get_mut(outcome.index) else {
            tracing::warn!(index = outcome.index, "load outcome for unknown node");
            return;
        };
        node.status = match outcome.result {
            Ok(info) => {
                tracing::info!(node = %node.name, id = %info.id, "model loaded");
                NodeStatus::Loaded(info)
            }
            Err(e) => {
                tracing::error!(node = %node.name, "failed to load {}: {e}", node.path.display());
                NodeStatus::Failed(e.to_string())
            }
        };
    }

    /// Drain whatever the background loader has finished so far.
    pub fn poll(&mut self, rx: &mpsc::Receiver<LoadOutcome>) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }
}

/// Load one model relative to `base_dir`.
pub async fn load_model(base_dir: &Path, model: &ModelConfig) -> Result<ModelInfo, AssetError> {
    import_model(base_dir.join(&model.path))
}

/// Validate `config` and load every model.
///
/// Only an invalid configuration is an error; models that fail to load are
/// kept as [`NodeStatus::Failed`] nodes.
pub async fn load_scene(config: &SceneConfig, base_dir: &Path) -> Result<Scene, AssetError> {
    config.validate()?;
    let mut scene = Scene::from_config(config);
    for (index, model) in config.models.iter().enumerate() {
        let result = load_model(base_dir, model).await;
        scene.apply(LoadOutcome { index, result });
    }
    Ok(scene)
}

/// Load every model of `config` on a worker thread, streaming outcomes in
/// node order. The receiver disconnects once all loads are done.
pub fn spawn_loader(config: &SceneConfig, base_dir: PathBuf) -> mpsc::Receiver<LoadOutcome> {
    let (tx, rx) = mpsc::channel();
    let models = config.models.clone();
    let spawned = std::thread::Builder::new()
        .name("walkscene-loader".into())
        .spawn(move || {
            for (index, model) in models.iter().enumerate() {
                tracing::debug!(node = %model.name, "loading {}", model.path.display());
                let result = pollster::block_on(load_model(&base_dir, model));
                if tx.send(LoadOutcome { index, result }).is_err() {
                    tracing::debug!("scene dropped before loading finished");
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!("failed to start model loader: {e}");
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use crate::gltf::tests::{CUBE_GLTF, glb};

    fn write_assets(dir: &Path) {
        std::fs::create_dir_all(dir.join("Assets")).unwrap();
        std::fs::write(dir.join("Assets/mountain.glb"), glb(CUBE_GLTF)).unwrap();
        // BoomBox.glb intentionally missing
    }

    #[test]
    fn nodes_start_pending() {
        let scene = Scene::from_config(&Preset::Showcase.config());
        assert_eq!(scene.nodes().len(), 2);
        assert_eq!(scene.pending_count(), 2);
        assert!(scene.node("boombox").unwrap().audio.is_some());
    }

    #[test]
    fn load_scene_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_assets(dir.path());
        let scene =
            pollster::block_on(load_scene(&Preset::Showcase.config(), dir.path())).unwrap();
        assert_eq!(scene.loaded_count(), 1);
        assert_eq!(scene.failed_count(), 1);
        assert!(scene.node("mountain").unwrap().model().is_some());
        assert_eq!(scene.node("boombox").unwrap().status.label(), "failed");
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut config = Preset::Showcase.config();
        config.camera.far = 0.0;
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            pollster::block_on(load_scene(&config, dir.path())),
            Err(AssetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn background_loader_streams_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        write_assets(dir.path());
        let config = Preset::Showcase.config();
        let mut scene = Scene::from_config(&config);
        let rx = spawn_loader(&config, dir.path().to_path_buf());

        let mut received = 0;
        while let Ok(outcome) = rx.recv() {
            scene.apply(outcome);
            received += 1;
        }
        assert_eq!(received, 2);
        assert_eq!(scene.pending_count(), 0);
        assert_eq!(scene.loaded_count(), 1);
    }

    #[test]
    fn poll_is_non_blocking() {
        let (_tx, rx) = mpsc::channel::<LoadOutcome>();
        let mut scene = Scene::from_config(&Preset::Showcase.config());
        assert_eq!(scene.poll(&rx), 0);
        assert_eq!(scene.pending_count(), 2);
    }

    #[test]
    fn outcome_for_unknown_node_is_ignored() {
        let mut scene = Scene::from_config(&Preset::Showcase.config());
        let before = scene.clone();
        scene.apply(LoadOutcome {
            index: 99,
            result: Err(AssetError::Truncated("header")),
        });
        assert_eq!(scene, before);
    }
}
