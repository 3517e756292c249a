//! Input state machine.
//!
//! Two modes: `Navigation` flies the camera pair with relative mouse look,
//! `SelectDrag` frees the cursor so objects and the light can be picked and
//! dragged. The machine owns all transient interaction state (grab target,
//! last cursor sample) and mutates the scene it is handed.

use crate::config::ViewerSettings;
use crate::render::{PickHit, Picker};
use crate::scene::SceneModel;
use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Navigation,
    SelectDrag,
}

impl InteractionMode {
    fn toggled(self) -> Self {
        match self {
            Self::Navigation => Self::SelectDrag,
            Self::SelectDrag => Self::Navigation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabTarget {
    None,
    Object(usize),
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Press,
    Repeat,
    Release,
}

impl KeyEdge {
    /// `None` for the synthetic events winit emits for keys already held
    /// when the window gains or loses focus.
    pub fn from_winit(state: ElementState, repeat: bool, is_synthetic: bool) -> Option<Self> {
        if is_synthetic {
            return None;
        }
        Some(match (state, repeat) {
            (ElementState::Released, _) => Self::Release,
            (ElementState::Pressed, true) => Self::Repeat,
            (ElementState::Pressed, false) => Self::Press,
        })
    }

    fn is_down(self) -> bool {
        self != Self::Release
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Quit,
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    Up,
    Down,
    ToggleLightTuning,
    RotateSelected,
    ToggleMode,
}

pub fn command_for_key(key: PhysicalKey) -> Option<KeyCommand> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        KeyCode::Escape => KeyCommand::Quit,
        KeyCode::KeyW => KeyCommand::Forward,
        KeyCode::KeyS => KeyCommand::Backward,
        KeyCode::KeyA => KeyCommand::StrafeLeft,
        KeyCode::KeyD => KeyCommand::StrafeRight,
        KeyCode::KeyI => KeyCommand::Up,
        KeyCode::KeyK => KeyCommand::Down,
        KeyCode::KeyM => KeyCommand::ToggleLightTuning,
        KeyCode::KeyB => KeyCommand::RotateSelected,
        KeyCode::KeyN => KeyCommand::ToggleMode,
        _ => return None,
    })
}

/// Side effects the host has to carry out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    None,
    Quit,
    ModeChanged(InteractionMode),
    ObjectReleased { index: usize, position: Vec3 },
}

#[derive(Debug, Clone)]
pub struct InputState {
    mode: InteractionMode,
    grab: GrabTarget,
    /// `None` until the first cursor sample after a mode change.
    last_cursor: Option<Vec2>,
    window: Vec2,
    look_sensitivity: f32,
    rotate_step: f32,
    light_step: f32,
    picker: Picker,
}

impl InputState {
    pub fn new(settings: &ViewerSettings) -> Self {
        Self {
            mode: InteractionMode::Navigation,
            grab: GrabTarget::None,
            last_cursor: None,
            window: Vec2::new(settings.window_width as f32, settings.window_height as f32),
            look_sensitivity: settings.look_sensitivity,
            rotate_step: settings.rotate_step,
            light_step: settings.light_step,
            picker: Picker {
                threshold: settings.pick_threshold,
                drag_divisor: settings.drag_divisor,
                vertical_damping: settings.drag_vertical_damping,
            },
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn grab(&self) -> GrabTarget {
        self.grab
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.window = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    pub fn handle_key(
        &mut self,
        scene: &mut SceneModel,
        key: PhysicalKey,
        edge: KeyEdge,
    ) -> InputAction {
        match command_for_key(key) {
            Some(command) => self.handle_command(scene, command, edge),
            None => InputAction::None,
        }
    }

    pub fn handle_command(
        &mut self,
        scene: &mut SceneModel,
        command: KeyCommand,
        edge: KeyEdge,
    ) -> InputAction {
        if !edge.is_down() {
            return InputAction::None;
        }
        match command {
            KeyCommand::Quit => return InputAction::Quit,
            KeyCommand::Forward => scene.camera.advance(1.0),
            KeyCommand::Backward => scene.camera.advance(-1.0),
            KeyCommand::StrafeLeft => scene.camera.strafe(1.0),
            KeyCommand::StrafeRight => scene.camera.strafe(-1.0),
            KeyCommand::Up => scene.camera.rise(1.0),
            KeyCommand::Down => scene.camera.rise(-1.0),
            KeyCommand::RotateSelected => {
                if let GrabTarget::Object(index) = self.grab {
                    if let Some(object) = scene.object_mut(index) {
                        object.rotation.angle += self.rotate_step;
                    }
                }
            }
            KeyCommand::ToggleLightTuning if edge == KeyEdge::Press => {
                scene.light.tuning_enabled = !scene.light.tuning_enabled;
                log::info!(
                    "Light tuning {}",
                    if scene.light.tuning_enabled { "on" } else { "off" }
                );
            }
            KeyCommand::ToggleMode if edge == KeyEdge::Press => {
                self.drop_grab(scene);
                self.mode = self.mode.toggled();
                self.last_cursor = None;
                log::info!("Switched to {:?} mode", self.mode);
                return InputAction::ModeChanged(self.mode);
            }
            KeyCommand::ToggleLightTuning | KeyCommand::ToggleMode => {}
        }
        InputAction::None
    }

    pub fn handle_cursor_moved(&mut self, scene: &mut SceneModel, position: Vec2) {
        let Some(last) = self.last_cursor.replace(position) else {
            return;
        };
        // Screen y grows downward; both modes want up-positive deltas.
        let delta = Vec2::new(position.x - last.x, last.y - position.y);
        match self.mode {
            InteractionMode::Navigation => {
                scene
                    .camera
                    .look(delta.x, delta.y, self.look_sensitivity);
            }
            InteractionMode::SelectDrag => {
                let offset = self.picker.drag_offset(&scene.camera, delta, self.window);
                match self.grab {
                    GrabTarget::Light => scene.light.position += offset,
                    GrabTarget::Object(index) => {
                        if let Some(object) = scene.object_mut(index) {
                            object.position += offset;
                        }
                    }
                    GrabTarget::None => {}
                }
            }
        }
    }

    /// `cursor` is `None` until the window has reported a position in the
    /// current mode; presses without one are ignored.
    pub fn handle_mouse_button(
        &mut self,
        scene: &mut SceneModel,
        button: MouseButton,
        state: ElementState,
        cursor: Option<Vec2>,
    ) -> InputAction {
        if self.mode != InteractionMode::SelectDrag || button != MouseButton::Left {
            return InputAction::None;
        }
        match (state, cursor) {
            (ElementState::Pressed, Some(cursor)) => {
                self.press(scene, cursor);
                InputAction::None
            }
            (ElementState::Pressed, None) => {
                log::debug!("Ignoring press before the first cursor position");
                InputAction::None
            }
            (ElementState::Released, _) => self.release(scene),
        }
    }

    pub fn handle_scroll(&mut self, scene: &mut SceneModel, delta_y: f32) {
        if !scene.light.tuning_enabled {
            return;
        }
        scene.light.tune(self.light_step * delta_y);
        log::debug!(
            "Light ambient {:?}, diffuse {:?}",
            scene.light.ambient,
            scene.light.diffuse
        );
    }

    fn press(&mut self, scene: &mut SceneModel, cursor: Vec2) {
        self.drop_grab(scene);
        self.last_cursor = Some(cursor);
        self.grab = match self.picker.pick(scene, cursor, self.window) {
            Some(PickHit::Object(index)) => {
                scene.clear_selection();
                if let Some(object) = scene.object_mut(index) {
                    object.selected = true;
                }
                GrabTarget::Object(index)
            }
            Some(PickHit::Light) => GrabTarget::Light,
            None => GrabTarget::None,
        };
    }

    fn release(&mut self, scene: &mut SceneModel) -> InputAction {
        let grab = std::mem::replace(&mut self.grab, GrabTarget::None);
        match grab {
            GrabTarget::Object(index) => {
                let Some(object) = scene.object_mut(index) else {
                    return InputAction::None;
                };
                object.selected = false;
                InputAction::ObjectReleased {
                    index,
                    position: object.position,
                }
            }
            GrabTarget::Light => {
                log::debug!("Released light at {:?}", scene.light.position);
                InputAction::None
            }
            GrabTarget::None => InputAction::None,
        }
    }

    fn drop_grab(&mut self, scene: &mut SceneModel) {
        if let GrabTarget::Object(index) = self.grab {
            if let Some(object) = scene.object_mut(index) {
                object.selected = false;
            }
        }
        self.grab = GrabTarget::None;
    }
}
