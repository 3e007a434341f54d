use anyhow::Result;
use clap::Parser;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use swarm_assets::AtlasSource;
use swarm_common::EntityId;
use swarm_input::{Action, PointerButton, PointerTracker};
use swarm_kernel::BatchGenerator;
use swarm_render_wgpu::{Engine, EngineConfig, EngineError, RenderTarget};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Pixels per wheel line.
const LINE_HEIGHT_PX: f32 = 40.0;
const SPAWN_STEP: usize = 10_000;
const TITLE: &str = "Swarm View";

#[derive(Parser)]
#[command(name = "swarm-desktop", about = "GPU particle viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Atlas layer images, one per entity type (overrides the config)
    #[arg(long, num_args = 1..)]
    atlas: Vec<PathBuf>,

    /// Entities spawned at start-up
    #[arg(long, default_value = "100000")]
    initial: usize,

    /// Seed of the demo batch generator
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,

    /// Initial window width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height
    #[arg(long, default_value = "720")]
    height: u32,
}

/// Window-independent application state.
struct AppState {
    engine: Engine,
    pointer: PointerTracker,
    generator: BatchGenerator,
}

impl AppState {
    fn new(config: EngineConfig, seed: u64) -> Self {
        Self {
            engine: Engine::new(config),
            pointer: PointerTracker::new(1, 1),
            generator: BatchGenerator::new(seed),
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Pan(delta) => self.engine.pan(delta.x, delta.y),
            Action::Zoom(factor) => self.engine.zoom(factor),
            Action::PointerMoved(ndc) => self.engine.set_pointer(ndc),
            Action::Click(ndc) => self.engine.click(ndc),
            Action::Spawn(count) => {
                let batch = self.generator.generate(count);
                let accepted = self.engine.ingest_entities(&batch);
                tracing::info!(
                    "spawned {accepted} entities ({} / {} live)",
                    self.engine.live_count(),
                    self.engine.capacity()
                );
            }
            Action::ClearSelection => self.engine.clear_selection(),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Space => self.apply(Action::Spawn(SPAWN_STEP)),
            KeyCode::Escape => self.apply(Action::ClearSelection),
            _ => {}
        }
    }
}

fn title(selection: Option<EntityId>) -> String {
    match selection {
        Some(id) => format!("{TITLE} - entity {id}"),
        None => TITLE.to_string(),
    }
}

struct App {
    state: AppState,
    window: Option<Arc<Window>>,
    initial: usize,
    window_size: PhysicalSize<u32>,
    error: Option<EngineError>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(self.window_size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let target = RenderTarget::Window {
            target: wgpu::SurfaceTarget::from(window.clone()),
            width: size.width,
            height: size.height,
        };
        if let Err(e) = self.state.engine.init(target) {
            tracing::error!("engine start-up failed: {e}");
            self.error = Some(e);
            event_loop.exit();
            return;
        }
        self.state.pointer.set_viewport(size.width, size.height);

        let title_window = window.clone();
        self.state
            .engine
            .on_entity_selected(move |selection| title_window.set_title(&title(selection)));

        self.state.apply(Action::Spawn(self.initial));
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.state.engine.destroy();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.state.engine.resize(size.width, size.height);
                self.state.pointer.set_viewport(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
                if key == KeyCode::Escape {
                    if let Some(window) = &self.window {
                        window.set_title(TITLE);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let px = Vec2::new(position.x as f32, position.y as f32);
                for action in self.state.pointer.moved(px) {
                    self.state.apply(action);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return,
                };
                let pressed = state == ElementState::Pressed;
                if let Some(action) = self.state.pointer.button(button, pressed) {
                    self.state.apply(action);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports positive y when scrolling up.
                let down = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                let action = self.state.pointer.wheel(down);
                self.state.apply(action);
            }
            WindowEvent::RedrawRequested => {
                self.state.engine.render();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("swarm-desktop starting");

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if !cli.atlas.is_empty() {
        config.atlas = AtlasSource::files(cli.atlas.iter().cloned());
    }
    if cli.no_vsync {
        config.vsync = false;
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        state: AppState::new(config, cli.seed),
        window: None,
        initial: cli.initial,
        window_size: PhysicalSize::new(cli.width.max(1), cli.height.max(1)),
        error: None,
    };
    event_loop.run_app(&mut app)?;

    if let Some(e) = app.error {
        return Err(e.into());
    }
    Ok(())
}
