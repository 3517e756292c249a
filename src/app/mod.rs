mod input;
mod timing;

use crate::assets::AssetManager;
use crate::config::{ViewerSettings, SETTINGS_FILE};
use crate::render::{render_stereo, HeadlessBackend, RenderBackend, StereoFrame};
use crate::scene::loader::{self, SceneError};
use crate::scene::SceneModel;
use input::{InputAction, InputState, InteractionMode, KeyEdge};
use timing::FrameTiming;

use glam::{UVec2, Vec2};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

/// Pixel wheel deltas (touchpads) are folded into wheel "lines".
const PIXELS_PER_LINE: f32 = 40.0;

const INSTRUCTIONS: &str = "\
Stereo scene viewer
  W / S     move forward / back
  A / D     strafe left / right
  I / K     move up / down
  mouse     look around (navigation mode)
  N         toggle navigation / select-and-drag mode
  left drag move the picked object or the light (select mode)
  B         rotate the grabbed object
  M         toggle light tuning, then scroll to adjust it
  Esc       quit";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to read scene path: {0}")]
    Prompt(#[source] io::Error),
}

pub struct App {
    window: Option<Arc<Window>>,
    settings: ViewerSettings,
    assets: AssetManager,
    scene: SceneModel,
    input: InputState,
    backend: HeadlessBackend,
    timing: FrameTiming,
    window_size: UVec2,
    /// Last absolute cursor position reported by the window in the
    /// current mode.
    cursor: Option<Vec2>,
    /// Accumulated raw mouse motion, used while the cursor is locked.
    nav_cursor: Vec2,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    failure: Option<AppError>,
}

impl App {
    fn new(settings: ViewerSettings, assets: AssetManager, scene: SceneModel) -> Self {
        let window_size = UVec2::new(settings.window_width, settings.window_height);
        let now = Instant::now();
        Self {
            window: None,
            input: InputState::new(&settings),
            backend: HeadlessBackend::new(window_size),
            timing: FrameTiming::new(settings.window_title.clone(), now),
            settings,
            assets,
            scene,
            window_size,
            cursor: None,
            nav_cursor: Vec2::ZERO,
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: now,
            failure: None,
        }
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.window_size = UVec2::new(new_size.width, new_size.height);
        self.input.resize(new_size.width, new_size.height);
        self.backend.resize(self.window_size);
        log::debug!("Resized to {}x{}", new_size.width, new_size.height);
    }

    fn apply_cursor_mode(&self, mode: InteractionMode) {
        let Some(window) = &self.window else {
            return;
        };
        match mode {
            InteractionMode::Navigation => {
                let grabbed = window
                    .set_cursor_grab(CursorGrabMode::Locked)
                    .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
                if let Err(err) = grabbed {
                    log::warn!("Could not capture the cursor: {}", err);
                }
                window.set_cursor_visible(false);
            }
            InteractionMode::SelectDrag => {
                if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                    log::warn!("Could not release the cursor: {}", err);
                }
                window.set_cursor_visible(true);
            }
        }
    }

    fn apply_action(&mut self, event_loop: &ActiveEventLoop, action: InputAction) {
        match action {
            InputAction::None => {}
            InputAction::Quit => event_loop.exit(),
            InputAction::ModeChanged(mode) => {
                self.cursor = None;
                self.apply_cursor_mode(mode);
            }
            InputAction::ObjectReleased { index, position } => {
                let path = self
                    .scene
                    .object(index)
                    .map(|object| object.path.as_str())
                    .unwrap_or("?");
                log::info!(
                    "Object {} ({}) released at {} {} {}",
                    index,
                    path,
                    position.x,
                    position.y,
                    position.z
                );
            }
        }
    }

    fn render(&mut self) {
        if self.window_size.x == 0 || self.window_size.y == 0 {
            return;
        }
        let frame = StereoFrame::build(&self.scene, self.window_size);
        if let Err(err) = render_stereo(&mut self.backend, &frame, &self.assets) {
            log::warn!("Dropped frame: {}", err);
            return;
        }
        if let Some(title) = self.timing.update(Instant::now(), self.input.mode()) {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = WindowAttributes::default()
            .with_title(self.settings.window_title.clone())
            .with_inner_size(PhysicalSize::new(
                self.settings.window_width,
                self.settings.window_height,
            ))
            .with_resizable(true);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.failure = Some(err.into());
                event_loop.exit();
                return;
            }
        };

        self.update_target_frame_duration(&window);
        self.handle_resize(window.inner_size());
        self.window = Some(window);
        self.apply_cursor_mode(self.input.mode());
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event, is_synthetic, ..
            } => {
                let Some(edge) = KeyEdge::from_winit(event.state, event.repeat, is_synthetic)
                else {
                    return;
                };
                let action = self
                    .input
                    .handle_key(&mut self.scene, event.physical_key, edge);
                self.apply_action(event_loop, action);
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Focused(true) => {
                self.apply_cursor_mode(self.input.mode());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                self.cursor = Some(cursor);
                if self.input.mode() == InteractionMode::SelectDrag {
                    self.input.handle_cursor_moved(&mut self.scene, cursor);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let action =
                    self.input
                        .handle_mouse_button(&mut self.scene, button, state, self.cursor);
                self.apply_action(event_loop, action);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                self.input.handle_scroll(&mut self.scene, lines);
            }
            WindowEvent::RedrawRequested => {
                self.render();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.input.mode() == InteractionMode::Navigation {
                self.nav_cursor += Vec2::new(delta.0 as f32, delta.1 as f32);
                self.input.handle_cursor_moved(&mut self.scene, self.nav_cursor);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

/// Asks for the scene description on stdin. An empty answer opens a file
/// picker; cancelling it yields `None`.
fn prompt_scene_path() -> Result<Option<PathBuf>, AppError> {
    print!("Scene file (leave empty to browse): ");
    io::stdout().flush().map_err(AppError::Prompt)?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).map_err(AppError::Prompt)?;
    let answer = line.trim();
    if !answer.is_empty() {
        return Ok(Some(PathBuf::from(answer)));
    }
    Ok(rfd::FileDialog::new()
        .set_title("Open scene description")
        .add_filter("Scene description", &["txt"])
        .pick_file())
}

fn load_props(settings: &ViewerSettings, assets: &mut AssetManager, scene: &mut SceneModel) {
    scene.props.background = Some(assets.load_model(&settings.background_model));
    scene.props.sky = Some(assets.load_model(&settings.sky_model));
    scene.props.light_marker = Some(assets.load_model(&settings.light_model));
    scene.camera.move_speed = settings.move_speed;
}

pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let settings = ViewerSettings::load_or_default(Path::new(SETTINGS_FILE));
    println!("{}", INSTRUCTIONS);

    let Some(scene_path) = prompt_scene_path()? else {
        log::info!("No scene selected");
        return Ok(());
    };

    let mut assets = AssetManager::new();
    let mut scene = SceneModel::new();
    load_props(&settings, &mut assets, &mut scene);
    loader::load_scene_file(&scene_path, &mut scene, &mut assets)?;
    log::info!("{} meshes resident", assets.len());
    for path in assets.loaded_paths() {
        log::debug!("  {}", path);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings, assets, scene);
    event_loop.run_app(&mut app)?;

    log::info!(
        "Presented {} stereo frames ({} vertices, {} triangles submitted)",
        app.backend.frames_presented(),
        app.backend.vertices_submitted(),
        app.backend.triangles_submitted()
    );
    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
