use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use househunt_assets::{AssetError, LoadOptions};
use househunt_input::{Action, InputTracker, MoveKey};
use househunt_kernel::{Game, GameConfig, GameEvent, Hud, Model};
use househunt_render::{RenderView, SceneLighting};
use househunt_render_wgpu::{Projection, WgpuRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "househunt-desktop", about = "Walk the house, shoot the targets")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// House model (glTF or GLB)
    #[arg(long, default_value = "casa.glb")]
    model: PathBuf,

    /// Gameplay config (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for target placement
    #[arg(long)]
    seed: Option<u64>,
}

type LoadResult = Result<Model, AssetError>;

/// Load the model off the render thread. The receiver yields exactly one
/// result, or disconnects if the loader thread could not start.
fn spawn_loader(path: PathBuf, options: LoadOptions) -> Receiver<LoadResult> {
    let (tx, rx) = mpsc::channel();
    let spawned = std::thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            tracing::info!(path = %path.display(), "loading model");
            let _ = tx.send(househunt_assets::load_model(&path, &options));
        });
    if let Err(e) = spawned {
        tracing::error!("failed to start model loader: {e}");
    }
    rx
}

/// Key binding: arrows move, Space fires once per physical press.
fn bind_key(key: KeyCode, pressed: bool, repeat: bool) -> Action {
    let movement = match key {
        KeyCode::ArrowUp => Some(MoveKey::Forward),
        KeyCode::ArrowDown => Some(MoveKey::Backward),
        KeyCode::ArrowLeft => Some(MoveKey::Left),
        KeyCode::ArrowRight => Some(MoveKey::Right),
        _ => None,
    };
    match (movement, key) {
        (Some(k), _) if pressed => Action::Press(k),
        (Some(k), _) => Action::Release(k),
        (None, KeyCode::Space) if pressed && !repeat => Action::Fire,
        _ => Action::Noop,
    }
}

/// Application state.
struct AppState {
    game: Game,
    input: InputTracker,
    lighting: SceneLighting,
    projection: Projection,
    model_rx: Option<Receiver<LoadResult>>,
    cursor_grabbed: bool,
}

impl AppState {
    fn new(config: GameConfig, model_rx: Receiver<LoadResult>) -> Self {
        let input = InputTracker::new(config.mouse_sensitivity);
        Self {
            game: Game::new(config),
            input,
            lighting: SceneLighting::default(),
            projection: Projection::default(),
            model_rx: Some(model_rx),
            cursor_grabbed: false,
        }
    }

    /// Returns true on the frame the model arrives and is installed.
    fn poll_model(&mut self) -> bool {
        let Some(rx) = &self.model_rx else {
            return false;
        };
        let outcome = match rx.try_recv() {
            Err(TryRecvError::Empty) => return false,
            Ok(outcome) => outcome,
            Err(TryRecvError::Disconnected) => Err(AssetError::Io(std::io::Error::other(
                "model loader exited without a result",
            ))),
        };
        self.model_rx = None;
        match outcome {
            Ok(model) => {
                self.game.load_model(model);
                self.game.model().is_some()
            }
            Err(e) => {
                self.game.load_failed(e);
                false
            }
        }
    }

    fn frame(&mut self) {
        let snapshot = self.input.snapshot();
        self.game.tick(&snapshot);
        for event in self.game.drain_events() {
            match event {
                GameEvent::Won { score } => tracing::info!(score, "you win"),
                other => tracing::trace!(event = ?other, "game event"),
            }
        }
    }
}

fn draw_hud(ctx: &EguiContext, hud: &Hud) {
    egui::Area::new(egui::Id::new("score"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(hud.score_text())
                    .size(24.0)
                    .color(egui::Color32::WHITE),
            );
        });

    if let Some(banner) = hud.win_text() {
        egui::Area::new(egui::Id::new("win_banner"))
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(banner)
                        .size(48.0)
                        .color(egui::Color32::WHITE),
                );
            });
    }
}

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
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("House Hunt")
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
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("househunt_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);
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

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn grab_cursor(&self) -> bool {
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
                tracing::warn!("cursor grab unavailable: {e}");
                false
            }
        }
    }

    fn release_cursor(&self) {
        let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        self.window.set_cursor_visible(true);
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

    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        if self.state.poll_model() {
            if let Some(model) = self.state.game.model() {
                gpu.renderer.upload_model(&gpu.device, &gpu.queue, model);
            }
        }
        self.state.frame();

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
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let view = RenderView::from_camera(self.state.game.camera());
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &target,
            &view,
            &self.state.projection,
            &self.state.game,
            &self.state.lighting,
        );

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let hud = self.state.game.hud();
        let full_output = self.egui_ctx.run(raw_input, |ctx| draw_hud(ctx, hud));
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &target,
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
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                self.state
                    .projection
                    .set_viewport(gpu.config.width, gpu.config.height);
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
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if gpu.egui_winit.on_window_event(&gpu.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size.width, new_size.height);
                self.state
                    .projection
                    .set_viewport(gpu.config.width, gpu.config.height);
            }
            WindowEvent::Focused(false) => {
                self.state.input.release_all();
                if self.state.cursor_grabbed {
                    gpu.release_cursor();
                    self.state.cursor_grabbed = false;
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if key == KeyCode::Escape && pressed && self.state.cursor_grabbed {
                    gpu.release_cursor();
                    self.state.cursor_grabbed = false;
                    return;
                }
                self.state.input.apply(bind_key(key, pressed, repeat));
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                if !self.state.cursor_grabbed {
                    self.state.cursor_grabbed = gpu.grab_cursor();
                }
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
            if self.state.cursor_grabbed {
                self.state.input.apply(Action::Look {
                    dx: delta.0 as f32,
                    dy: delta.1 as f32,
                });
            }
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
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    tracing::info!(model = %cli.model.display(), "househunt-desktop starting");

    let options = LoadOptions {
        texture_repeat: config.texture_repeat,
    };
    let model_rx = spawn_loader(cli.model, options);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config, model_rx));
    event_loop.run_app(&mut app)?;

    Ok(())
}
