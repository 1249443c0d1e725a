use glam::Vec3;
use std::fmt::Write;
use walkscene_assets::{NodeStatus, Scene};
use walkscene_kernel::{LocomotionController, ParticleField};

/// Everything a renderer may look at for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub frame: u64,
    pub eye: Vec3,
    /// Camera yaw in radians.
    pub yaw: f32,
    pub locomotion: &'a LocomotionController,
    pub smoke: &'a ParticleField,
    pub scene: &'a Scene,
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given view.
    fn render(&self, view: &FrameView<'_>) -> Self::Output;
}

/// Human-readable frame dump for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also list every smoke particle position.
    pub list_particles: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, view: &FrameView<'_>) -> String {
        let mut out = String::new();
        let v = view.locomotion.velocity();
        let _ = writeln!(out, "=== Frame {} ===", view.frame);
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) yaw={:.1}deg locked={}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.yaw.to_degrees(),
            view.locomotion.is_view_locked()
        );
        let _ = writeln!(out, "Velocity: lateral={:.3} forward={:.3}", v.x, v.y);

        let smoke = view.smoke;
        match smoke.height_range() {
            Some((lo, hi)) => {
                let _ = writeln!(
                    out,
                    "Smoke: particles={} y=[{:.2}, {:.2}] ceiling={:.2} recycled={}",
                    smoke.len(),
                    lo,
                    hi,
                    smoke.ceiling(),
                    smoke.recycled_total()
                );
            }
            None => {
                let _ = writeln!(out, "Smoke: particles=0");
            }
        }
        if self.list_particles {
            for (i, particle) in smoke.particles().enumerate() {
                let (p, v) = (particle.position, particle.velocity);
                let _ = writeln!(
                    out,
                    "  #{i:04} ({:.3}, {:.3}, {:.3}) v=({:.4}, {:.4}, {:.4})",
                    p.x, p.y, p.z, v.x, v.y, v.z
                );
            }
        }

        let _ = writeln!(out, "Nodes: {}", view.scene.nodes().len());
        for node in view.scene.nodes() {
            let p = node.transform.position;
            let detail = match &node.status {
                NodeStatus::Loaded(info) => format!("meshes={}", info.mesh_count()),
                NodeStatus::Failed(reason) => reason.clone(),
                NodeStatus::Pending => String::new(),
            };
            let _ = writeln!(
                out,
                "  [{}] {} pos=({:.2}, {:.2}, {:.2}) {}",
                node.status.label(),
                node.name,
                p.x,
                p.y,
                p.z,
                detail
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkscene_assets::Preset;
    use walkscene_kernel::SmokeParams;

    fn render(list_particles: bool, smoke: &ParticleField) -> String {
        let locomotion = LocomotionController::default();
        let scene = Scene::from_config(&Preset::Showcase.config());
        let view = FrameView {
            frame: 3,
            eye: Vec3::new(0.0, 1.6, 5.0),
            yaw: -90.0_f32.to_radians(),
            locomotion: &locomotion,
            smoke,
            scene: &scene,
        };
        DebugTextRenderer { list_particles }.render(&view)
    }

    #[test]
    fn summary_lines() {
        let smoke = ParticleField::new(SmokeParams::default());
        let output = render(false, &smoke);
        assert!(output.contains("=== Frame 3 ==="));
        assert!(output.contains("locked=false"));
        assert!(output.contains("particles=200"));
        assert!(output.contains("[pending] mountain"));
        assert!(output.contains("[pending] boombox"));
    }

    #[test]
    fn particle_listing_is_opt_in() {
        let smoke = ParticleField::new(SmokeParams {
            count: 3,
            ..SmokeParams::default()
        });
        assert!(!render(false, &smoke).contains("#0000"));
        let listed = render(true, &smoke);
        assert!(listed.contains("#0000"));
        assert!(listed.contains("#0002"));
        let first = listed.lines().find(|l| l.contains("#0000")).unwrap();
        let v = smoke.velocities()[0];
        assert!(first.contains(&format!("v=({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)));
    }

    #[test]
    fn empty_smoke_field() {
        let smoke = ParticleField::new(SmokeParams {
            count: 0,
            ..SmokeParams::default()
        });
        assert!(render(false, &smoke).contains("Smoke: particles=0"));
    }
}
