use glam::Vec3;
use walkscene_assets::{NodeStatus, Scene, SceneNode};
use walkscene_input::{InputState, LockPhase};
use walkscene_kernel::{CameraRig, FrameScheduler};

/// Scene inspector for developer tooling.
///
/// Provides read-only queries against the kernel and scene for the overlay
/// and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the current frame.
    pub fn summary(scheduler: &FrameScheduler, rig: &impl CameraRig) -> FrameSummary {
        let loco = &scheduler.locomotion;
        let v = loco.velocity();
        let p = rig.position();
        let (smoke_low, smoke_high) = scheduler.smoke.height_range().unwrap_or((0.0, 0.0));
        FrameSummary {
            frame: scheduler.frame(),
            camera: [p.x, p.y, p.z],
            yaw_deg: rig.yaw().to_degrees(),
            velocity: [v.x, v.y],
            lock: loco.lock().phase(),
            held: *loco.input(),
            particle_count: scheduler.smoke.len(),
            smoke_low,
            smoke_high,
            recycled_total: scheduler.smoke.recycled_total(),
        }
    }

    pub fn inspect_node(scene: &Scene, name: &str) -> Option<NodeInfo> {
        scene.node(name).map(NodeInfo::from_node)
    }

    pub fn list_nodes(scene: &Scene) -> Vec<NodeInfo> {
        scene.nodes().iter().map(NodeInfo::from_node).collect()
    }

    /// Gain of the first audio-carrying node as heard from `listener`.
    pub fn audio_gain(scene: &Scene, listener: Vec3) -> Option<f32> {
        scene.nodes().iter().find_map(|node| {
            let audio = node.audio.as_ref()?;
            let facing = node.transform.rotation * Vec3::Z;
            Some(
                audio
                    .emitter
                    .gain_at(node.transform.position, facing, listener),
            )
        })
    }
}

/// Summary of one frame for the inspector.
#[derive(Debug, Clone)]
pub struct FrameSummary {
    pub frame: u64,
    pub camera: [f32; 3],
    pub yaw_deg: f32,
    pub velocity: [f32; 2],
    pub lock: LockPhase,
    pub held: InputState,
    pub particle_count: usize,
    pub smoke_low: f32,
    pub smoke_high: f32,
    pub recycled_total: u64,
}

impl FrameSummary {
    pub fn speed(&self) -> f32 {
        self.velocity[0].hypot(self.velocity[1])
    }
}

impl std::fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame: {} camera=({:.2}, {:.2}, {:.2}) speed={:.2} lock={:?} particles={} smoke_y=[{:.2}, {:.2}]",
            self.frame,
            self.camera[0],
            self.camera[1],
            self.camera[2],
            self.speed(),
            self.lock,
            self.particle_count,
            self.smoke_low,
            self.smoke_high,
        )
    }
}

/// Detailed info about a single scene node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub name: String,
    pub status: &'static str,
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub detail: String,
    pub has_audio: bool,
}

impl NodeInfo {
    fn from_node(node: &SceneNode) -> Self {
        let p = node.transform.position;
        let s = node.transform.scale;
        let detail = match &node.status {
            NodeStatus::Pending => String::new(),
            NodeStatus::Loaded(info) => format!(
                "{} meshes, {} materials, id {}",
                info.mesh_count(),
                info.material_count,
                info.id
            ),
            NodeStatus::Failed(reason) => reason.clone(),
        };
        Self {
            name: node.name.clone(),
            status: node.status.label(),
            position: [p.x, p.y, p.z],
            scale: [s.x, s.y, s.z],
            detail,
            has_audio: node.audio.is_some(),
        }
    }
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node {} [{}] pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            self.name,
            self.status,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )?;
        if !self.detail.is_empty() {
            write!(f, " {}", self.detail)?;
        }
        Ok(())
    }
}
