use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use walkscene_assets::{Preset, Scene, SceneConfig, import_model, load_scene};
use walkscene_input::{Action, Direction};
use walkscene_kernel::{FrameScheduler, ParticleField, YawRig};
use walkscene_render::{DebugTextRenderer, FrameView, Renderer};
use walkscene_tools::SceneInspector;

#[derive(Parser)]
#[command(name = "walkscene-cli", about = "Headless walkscene tool")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and scene defaults
    Info,
    /// Tick the walk controller and smoke without a window
    Simulate {
        /// Number of frames to tick
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        #[arg(long)]
        forward: bool,
        #[arg(long)]
        backward: bool,
        #[arg(long)]
        left: bool,
        #[arg(long)]
        right: bool,
        /// Never acquire the pointer lock, so nothing moves
        #[arg(long)]
        unlocked: bool,
        /// Built-in scene used when no config is given
        #[arg(long, default_value = "showcase")]
        preset: Preset,
        /// Scene description (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Load the scene's models from this directory first
        #[arg(long)]
        assets_dir: Option<PathBuf>,
        /// Dump every N frames (0: only the last)
        #[arg(long, default_value = "0")]
        every: u64,
        /// Include every particle position in dumps
        #[arg(long)]
        list_particles: bool,
    },
    /// Print a preset as YAML, or write it to a file
    Config {
        #[arg(long, default_value = "showcase")]
        preset: Preset,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Read a .glb / .gltf file and print what it contains
    InspectModel { path: PathBuf },
}

fn dump(
    renderer: &DebugTextRenderer,
    scheduler: &FrameScheduler,
    rig: &YawRig,
    scene: &Scene,
) -> String {
    renderer.render(&FrameView {
        frame: scheduler.frame(),
        eye: rig.position,
        yaw: rig.yaw,
        locomotion: &scheduler.locomotion,
        smoke: &scheduler.smoke,
        scene,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Info => {
            let config = SceneConfig::default();
            let smoke = ParticleField::new(config.smoke.params);
            println!("walkscene-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "locomotion: damping={} acceleration={} terminal_speed={}",
                config.locomotion.damping,
                config.locomotion.acceleration,
                config.locomotion.terminal_speed()
            );
            println!(
                "smoke: particles={} origin=({}, {}, {}) ceiling={}",
                smoke.len(),
                smoke.origin().x,
                smoke.origin().y,
                smoke.origin().z,
                smoke.ceiling()
            );
            let presets: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
            println!("presets: {}", presets.join(", "));
        }
        Commands::Simulate {
            frames,
            dt,
            forward,
            backward,
            left,
            right,
            unlocked,
            preset,
            config,
            assets_dir,
            every,
            list_particles,
        } => {
            if !(dt.is_finite() && dt > 0.0) {
                bail!("dt must be a positive number of seconds, got {dt}");
            }
            let config = match config {
                Some(path) => SceneConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => preset.config(),
            };
            if config.locomotion.damping * dt >= 1.0 {
                tracing::warn!(
                    "damping * dt = {} >= 1; the walk velocity will oscillate",
                    config.locomotion.damping * dt
                );
            }
            let scene = match assets_dir {
                Some(dir) => pollster::block_on(load_scene(&config, &dir))?,
                None => {
                    config.validate()?;
                    Scene::from_config(&config)
                }
            };

            let mut scheduler = FrameScheduler::new(config.locomotion, config.smoke.params);
            let mut rig = YawRig::new(config.camera.position, config.camera.yaw_deg.to_radians());
            if !unlocked && scheduler.locomotion.handle(Action::RequestLock) {
                scheduler.locomotion.handle(Action::LockResolved(true));
            }
            let held = [
                (forward, Direction::Forward),
                (backward, Direction::Backward),
                (left, Direction::Left),
                (right, Direction::Right),
            ];
            for (_, direction) in held.iter().filter(|(on, _)| *on) {
                scheduler.locomotion.handle(Action::Press(*direction));
            }

            println!("Simulating {frames} frames at dt={dt}");
            let renderer = DebugTextRenderer { list_particles };
            let mut recycled = 0;
            for _ in 0..frames {
                let report = scheduler.tick(dt, &mut rig);
                recycled += report.recycled;
                tracing::trace!(
                    frame = report.frame,
                    recycled = report.recycled,
                    "step ({:.4}, {:.4})",
                    report.displacement.x,
                    report.displacement.y
                );
                if every > 0 && report.frame % every == 0 && report.frame != frames {
                    print!("{}", dump(&renderer, &scheduler, &rig, &scene));
                }
            }
            print!("{}", dump(&renderer, &scheduler, &rig, &scene));
            println!("{}", SceneInspector::summary(&scheduler, &rig));
            println!("Recycled this run: {recycled}");
            if let Some(gain) = SceneInspector::audio_gain(&scene, rig.position) {
                println!("Audio gain at camera: {gain:.4}");
            }
        }
        Commands::Config { preset, output } => {
            let config = preset.config();
            match output {
                Some(path) => {
                    config.save(&path)?;
                    println!("wrote {} preset to {}", preset.name(), path.display());
                }
                None => print!("{}", config.to_yaml_string()?),
            }
        }
        Commands::InspectModel { path } => {
            let info = import_model(&path).with_context(|| format!("reading {}", path.display()))?;
            println!("Model: {}", path.display());
            println!("  id: {}", info.id);
            println!("  bytes: {}", info.byte_len);
            println!("  nodes: {}", info.node_count);
            println!("  materials: {}", info.material_count);
            println!("  meshes: {}", info.mesh_count());
            for name in &info.mesh_names {
                println!("    - {name}");
            }
            match info.bounds {
                Some((min, max)) => println!(
                    "  bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                    min.x, min.y, min.z, max.x, max.y, max.z
                ),
                None => println!("  bounds: unknown"),
            }
        }
    }

    Ok(())
}
