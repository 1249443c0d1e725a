mod keys;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use walkscene_assets::{LoadOutcome, Preset, Scene, SceneConfig, spawn_loader};
use walkscene_input::{Action, LockPhase};
use walkscene_kernel::{FrameReport, FrameScheduler};
use walkscene_render_wgpu::{SceneStyle, WalkCamera, WgpuRenderer};
use walkscene_tools::SceneInspector;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Longest walk step. Keeps damping * dt below 1 so the Euler step cannot
/// overshoot; longer frames are split into several steps.
const MAX_WALK_STEP: f32 = 0.02;
/// Frames longer than this (debugger pauses, window drags) are cut short.
const MAX_FRAME_DT: f32 = 0.25;

#[derive(Parser)]
#[command(name = "walkscene-desktop", about = "Walk around the scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene description (YAML). Falls back to the preset if unreadable.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in scene used when no config is given
    #[arg(long, default_value = "showcase")]
    preset: Preset,

    /// Directory that model paths are resolved against
    #[arg(long, default_value = ".")]
    assets_dir: PathBuf,
}

/// Application state.
struct AppState {
    config: SceneConfig,
    scheduler: FrameScheduler,
    camera: WalkCamera,
    scene: Scene,
    loader: mpsc::Receiver<LoadOutcome>,
    show_overlay: bool,
    audio_started: bool,
    last_report: Option<FrameReport>,
    last_frame: Instant,
}

impl AppState {
    fn new(config: SceneConfig, assets_dir: PathBuf) -> Self {
        let loader = spawn_loader(&config, assets_dir);
        Self {
            scheduler: FrameScheduler::new(config.locomotion, config.smoke.params),
            camera: WalkCamera::from_config(&config.camera),
            scene: Scene::from_config(&config),
            loader,
            config,
            show_overlay: false,
            audio_started: false,
            last_report: None,
            last_frame: Instant::now(),
        }
    }

    fn update(&mut self, dt: f32) {
        let arrived = self.scene.poll(&self.loader);
        if arrived > 0 {
            tracing::debug!(arrived, pending = self.scene.pending_count(), "models arrived");
        }
        let dt = dt.min(MAX_FRAME_DT);
        let report = self
            .scheduler
            .tick_substepped(dt, MAX_WALK_STEP, &mut self.camera);
        self.last_report = Some(report);
    }

    /// Route an action to the camera and the locomotion core. Returns `true`
    /// if the host must try to capture the pointer.
    fn apply(&mut self, action: Action) -> bool {
        if let Action::Look(delta) = action {
            if self.scheduler.locomotion.is_view_locked() {
                self.camera.look(delta.x, delta.y);
            }
        }
        self.scheduler.locomotion.handle(action)
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(direction) = keys::direction(key) {
            let action = if pressed {
                Action::Press(direction)
            } else {
                Action::Release(direction)
            };
            self.apply(action);
            return;
        }
        if pressed && key == KeyCode::F1 {
            self.show_overlay = !self.show_overlay;
        }
    }

    /// Key-up events stop arriving once focus is gone, so nothing may stay
    /// held.
    fn focus_lost(&mut self) {
        self.apply(Action::ReleaseAll);
        if self.scheduler.locomotion.lock().phase() != LockPhase::Unlocked {
            self.apply(Action::Unlock);
        }
    }

    /// The first click in the view doubles as the user gesture that starts
    /// the soundtrack.
    fn start_audio(&mut self) {
        if self.audio_started {
            return;
        }
        self.audio_started = true;
        match self.config.audio_model() {
            Some((model, audio)) if audio.autoplay => {
                tracing::info!(node = %model.name, "starting track {}", audio.track.display());
            }
            Some((model, _)) => {
                tracing::debug!(node = %model.name, "audio autoplay disabled");
            }
            None => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.scheduler.locomotion.is_view_locked() {
            egui::Area::new(egui::Id::new("click_hint"))
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    let text = match self.scheduler.locomotion.lock().phase() {
                        LockPhase::Pending => "Capturing pointer...",
                        _ => "Click to walk around",
                    };
                    ui.heading(text);
                });
        }

        if !self.show_overlay {
            return;
        }

        let summary = SceneInspector::summary(&self.scheduler, &self.camera);

        egui::SidePanel::left("overlay")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Walkscene");
                ui.separator();
                ui.label(format!("Frame: {}", summary.frame));
                ui.label(format!(
                    "Camera: ({:.1}, {:.1}, {:.1}) yaw {:.0}°",
                    summary.camera[0], summary.camera[1], summary.camera[2], summary.yaw_deg
                ));
                ui.label(format!(
                    "Velocity: ({:.2}, {:.2}) speed {:.2} / {:.2}",
                    summary.velocity[0],
                    summary.velocity[1],
                    summary.speed(),
                    self.config.locomotion.terminal_speed()
                ));
                ui.label(format!("Pointer: {:?}", summary.lock));
                let held = summary.held;
                ui.label(format!(
                    "Held: {}{}{}{}",
                    if held.forward { "W" } else { "-" },
                    if held.left { "A" } else { "-" },
                    if held.backward { "S" } else { "-" },
                    if held.right { "D" } else { "-" },
                ));
                if let Some(report) = &self.last_report {
                    ui.label(format!(
                        "Step: ({:.3}, {:.3}) recycled {}",
                        report.displacement.x, report.displacement.y, report.recycled
                    ));
                }

                ui.separator();
                ui.heading("Smoke");
                ui.label(format!("Particles: {}", summary.particle_count));
                ui.label(format!(
                    "Height: {:.2} .. {:.2}",
                    summary.smoke_low, summary.smoke_high
                ));
                ui.label(format!("Recycled: {}", summary.recycled_total));

                ui.separator();
                ui.heading("Models");
                ui.label(format!(
                    "{} loaded, {} pending, {} failed",
                    self.scene.loaded_count(),
                    self.scene.pending_count(),
                    self.scene.failed_count()
                ));
                for node in SceneInspector::list_nodes(&self.scene) {
                    ui.label(format!("[{}] {}", node.status, node.name));
                    if !node.detail.is_empty() {
                        ui.small(node.detail);
                    }
                }

                if let Some(gain) = SceneInspector::audio_gain(&self.scene, self.camera.position) {
                    ui.separator();
                    ui.label(format!(
                        "Audio gain: {gain:.3}{}",
                        if self.audio_started { "" } else { " (waiting for click)" }
                    ));
                }

                ui.separator();
                ui.small("Click: capture | WASD/arrows: move | Esc: release | F1: overlay");
            });
    }
}

/// Window, device and everything drawn into the surface.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, state: &AppState) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Walkscene")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("walkscene_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            SceneStyle::from_config(&state.config),
            state.scheduler.smoke.len(),
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Capture the pointer. Falls back to confining it where the platform
    /// cannot lock.
    fn grab_pointer(&self) -> bool {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                true
            }
            Err(e) => {
                tracing::warn!("pointer capture refused: {e}");
                false
            }
        }
    }

    fn release_pointer(&self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::debug!("failed to release pointer: {e}");
        }
        self.window.set_cursor_visible(true);
    }

    fn paint_overlay(
        &mut self,
        egui_ctx: &EguiContext,
        view: &wgpu::TextureView,
        full_output: egui::FullOutput,
    ) {
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn request_pointer_lock(&mut self) {
        self.state.start_audio();
        if !self.state.apply(Action::RequestLock) {
            return;
        }
        let granted = self.gpu.as_ref().is_some_and(Gpu::grab_pointer);
        self.state.apply(Action::LockResolved(granted));
    }

    fn release_pointer_lock(&mut self) {
        if self.state.scheduler.locomotion.lock().phase() == LockPhase::Unlocked {
            return;
        }
        self.state.apply(Action::Unlock);
        if let Some(gpu) = &self.gpu {
            gpu.release_pointer();
        }
    }

    fn focus_lost(&mut self) {
        self.state.focus_lost();
        if let Some(gpu) = &self.gpu {
            gpu.release_pointer();
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32();
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let smoke = &mut self.state.scheduler.smoke;
        if smoke.needs_update() {
            gpu.renderer.upload_smoke(&gpu.queue, smoke.positions());
            smoke.mark_uploaded();
        }
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.scene,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.paint_overlay(&self.egui_ctx, &view, full_output);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state) {
            Ok(gpu) => {
                self.state.camera.aspect = gpu.aspect();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                    self.state.camera.aspect = gpu.aspect();
                }
            }
            WindowEvent::Focused(false) => {
                self.focus_lost();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if key == KeyCode::Escape {
                    self.release_pointer_lock();
                } else {
                    self.state
                        .handle_key(key, key_state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.request_pointer_lock();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state
                .apply(Action::Look(Vec2::new(delta.0 as f32, delta.1 as f32)));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("walkscene-desktop starting");

    let config = SceneConfig::load_or_preset(cli.config.as_deref(), cli.preset);
    let state = AppState::new(config, cli.assets_dir);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkscene_input::Direction;

    fn state() -> AppState {
        let mut config = Preset::Showcase.config();
        config.models.clear();
        AppState::new(config, PathBuf::from("."))
    }

    fn lock(state: &mut AppState) {
        assert!(state.apply(Action::RequestLock));
        state.apply(Action::LockResolved(true));
    }

    #[test]
    fn look_only_while_locked() {
        let mut state = state();
        let yaw = state.camera.yaw;
        state.apply(Action::Look(Vec2::new(50.0, 0.0)));
        assert_eq!(state.camera.yaw, yaw);
        lock(&mut state);
        state.apply(Action::Look(Vec2::new(50.0, 0.0)));
        assert!(state.camera.yaw > yaw);
    }

    #[test]
    fn keys_drive_movement_once_locked() {
        let mut state = state();
        state.handle_key(KeyCode::KeyW, true);
        state.update(0.016);
        assert_eq!(state.camera.position, WalkCamera::default().position);
        lock(&mut state);
        for _ in 0..10 {
            state.update(0.016);
        }
        assert!(state.camera.position.z < 5.0);
        state.handle_key(KeyCode::KeyW, false);
        assert!(!state.scheduler.locomotion.input().is_held(Direction::Forward));
    }

    fn walk_one_second(fps: u32) -> f32 {
        let mut state = state();
        lock(&mut state);
        state.handle_key(KeyCode::KeyW, true);
        for _ in 0..fps {
            state.update(1.0 / fps as f32);
        }
        WalkCamera::default().position.z - state.camera.position.z
    }

    #[test]
    fn walk_speed_does_not_depend_on_frame_rate() {
        let slow = walk_one_second(30);
        let fast = walk_one_second(60);
        assert!(fast > 9.0);
        assert!((slow - fast).abs() / fast < 0.03, "30fps {slow} vs 60fps {fast}");
    }

    #[test]
    fn stalls_are_cut_short() {
        let mut stalled = state();
        let mut capped = state();
        for s in [&mut stalled, &mut capped] {
            lock(s);
            s.handle_key(KeyCode::ArrowUp, true);
        }
        stalled.update(5.0);
        capped.update(MAX_FRAME_DT);
        assert!((stalled.camera.position - capped.camera.position).length() < 1e-5);
        assert!(stalled.camera.position.z < WalkCamera::default().position.z);
    }

    #[test]
    fn focus_loss_releases_held_keys() {
        let mut state = state();
        lock(&mut state);
        state.handle_key(KeyCode::KeyW, true);
        state.focus_lost();
        assert!(!state.scheduler.locomotion.is_view_locked());
        assert!(!state.scheduler.locomotion.input().any());
        // The key-up never arrives; frames keep running while unfocused.
        for _ in 0..10 {
            state.update(0.016);
        }
        lock(&mut state);
        let before = state.camera.position;
        for _ in 0..10 {
            state.update(0.016);
        }
        assert_eq!(state.camera.position, before);
    }

    #[test]
    fn f1_toggles_overlay() {
        let mut state = state();
        assert!(!state.show_overlay);
        state.handle_key(KeyCode::F1, true);
        state.handle_key(KeyCode::F1, false);
        assert!(state.show_overlay);
    }
}
