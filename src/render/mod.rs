mod camera;
mod headless;
pub mod pick;

pub use camera::{projection_matrix, CameraPair, PITCH_LIMIT};
pub use headless::HeadlessBackend;
pub use pick::{PickHit, Picker};

use crate::assets::{AssetManager, MeshHandle};
use crate::scene::{
    compose_transform_matrix, Rotation, SceneModel, BACKGROUND_POSITION, BACKGROUND_SCALE,
    LIGHT_MARKER_SCALE, SKY_SCALE,
};
use glam::{Mat4, UVec2, Vec3, Vec4};

pub const CLEAR_COLOR: Vec4 = Vec4::new(0.75, 0.75, 0.75, 1.0);
pub const SPECULAR: Vec3 = Vec3::ONE;
pub const SHININESS: f32 = 32.0;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render target lost: {0}")]
    TargetLost(String),
    #[error("backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EyeSide {
    Left,
    Right,
}

impl EyeSide {
    pub const BOTH: [EyeSide; 2] = [EyeSide::Left, EyeSide::Right];
}

/// Pixel rectangle with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// The window half an eye renders into.
    pub fn for_eye(eye: EyeSide, window: UVec2) -> Self {
        let half = window.x / 2;
        Self {
            x: match eye {
                EyeSide::Left => 0,
                EyeSide::Right => half,
            },
            y: 0,
            width: half,
            height: window.y,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const PROPS: Self = Self {
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
    };
    pub const OBJECTS: Self = Self {
        constant: 1.0,
        linear: 0.1,
        quadratic: 0.05,
    };
}

/// Point light parameters handed to lit shaders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightUniforms {
    pub position: Vec3,
    pub view_position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    pub shininess: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Lit,
    LightMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRole {
    Background,
    Sky,
    LightMarker,
    Object(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub role: DrawRole,
    pub mesh: MeshHandle,
    pub model: Mat4,
    pub shader: ShaderKind,
    pub attenuation: Attenuation,
}

/// Everything a backend needs to draw one eye.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeFrame {
    pub eye: EyeSide,
    pub viewport: Viewport,
    pub view: Mat4,
    pub projection: Mat4,
    pub clear_color: Vec4,
    pub light: LightUniforms,
    pub draws: Vec<DrawItem>,
}

impl EyeFrame {
    pub fn build(scene: &SceneModel, eye: EyeSide, window: UVec2) -> Self {
        let viewport = Viewport::for_eye(eye, window);
        let light = LightUniforms {
            position: scene.light.position,
            view_position: scene.camera.eye_position(eye),
            ambient: scene.light.ambient,
            diffuse: scene.light.diffuse,
            specular: SPECULAR,
            attenuation: Attenuation::PROPS,
            shininess: SHININESS,
        };

        let mut draws = Vec::with_capacity(scene.objects().len() + 3);
        let props = [
            (
                DrawRole::Background,
                scene.props.background,
                BACKGROUND_POSITION,
                BACKGROUND_SCALE,
                ShaderKind::Lit,
            ),
            (
                DrawRole::Sky,
                scene.props.sky,
                Vec3::ZERO,
                SKY_SCALE,
                ShaderKind::Lit,
            ),
            (
                DrawRole::LightMarker,
                scene.props.light_marker,
                scene.light.position,
                LIGHT_MARKER_SCALE,
                ShaderKind::LightMarker,
            ),
        ];
        for (role, mesh, position, scale, shader) in props {
            if let Some(mesh) = mesh {
                draws.push(DrawItem {
                    role,
                    mesh,
                    model: compose_transform_matrix(position, Rotation::IDENTITY, scale),
                    shader,
                    attenuation: Attenuation::PROPS,
                });
            }
        }
        for (index, object) in scene.objects().iter().enumerate() {
            draws.push(DrawItem {
                role: DrawRole::Object(index),
                mesh: object.mesh,
                model: object.model_matrix(),
                shader: ShaderKind::Lit,
                attenuation: Attenuation::OBJECTS,
            });
        }

        Self {
            eye,
            viewport,
            view: scene.camera.view_matrix(eye),
            projection: projection_matrix(viewport.aspect()),
            clear_color: CLEAR_COLOR,
            light,
            draws,
        }
    }

    /// Light uniforms with the attenuation a given draw expects.
    pub fn light_for(&self, draw: &DrawItem) -> LightUniforms {
        LightUniforms {
            attenuation: draw.attenuation,
            ..self.light
        }
    }
}

/// Both eyes of one displayed frame, taken from the same scene snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoFrame {
    pub left: EyeFrame,
    pub right: EyeFrame,
}

impl StereoFrame {
    pub fn build(scene: &SceneModel, window: UVec2) -> Self {
        Self {
            left: EyeFrame::build(scene, EyeSide::Left, window),
            right: EyeFrame::build(scene, EyeSide::Right, window),
        }
    }

    pub fn eye(&self, eye: EyeSide) -> &EyeFrame {
        match eye {
            EyeSide::Left => &self.left,
            EyeSide::Right => &self.right,
        }
    }
}

/// Graphics API seam. Implementations own shaders, buffers and the swap
/// chain; they receive fully resolved per-eye frames.
pub trait RenderBackend {
    fn resize(&mut self, window: UVec2);
    fn render_eye(&mut self, frame: &EyeFrame, assets: &AssetManager) -> Result<(), RenderError>;
    fn present(&mut self) -> Result<(), RenderError>;
}

/// Draws the left half, then the right half, then presents once.
pub fn render_stereo<B: RenderBackend + ?Sized>(
    backend: &mut B,
    frame: &StereoFrame,
    assets: &AssetManager,
) -> Result<(), RenderError> {
    for eye in EyeSide::BOTH {
        backend.render_eye(frame.eye(eye), assets)?;
    }
    backend.present()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::PlacedObject;

    const WINDOW: UVec2 = UVec2::new(1400, 600);

    fn scene_with_props() -> SceneModel {
        let mut scene = SceneModel::new();
        scene.props.background = Some(MeshHandle::from_index(0));
        scene.props.sky = Some(MeshHandle::from_index(1));
        scene.props.light_marker = Some(MeshHandle::from_index(2));
        scene.add_object(PlacedObject::new(
            MeshHandle::from_index(3),
            "a.obj",
            Vec3::new(1.0, 0.0, 0.0),
            Rotation::from_array([0.3, 0.0, 1.0, 0.0]),
            Vec3::ONE,
        ));
        scene.add_object(PlacedObject::new(
            MeshHandle::from_index(3),
            "a.obj",
            Vec3::new(-1.0, 0.0, 0.0),
            Rotation::IDENTITY,
            Vec3::splat(2.0),
        ));
        scene
    }

    #[test]
    fn viewports_split_the_window() {
        assert_eq!(
            Viewport::for_eye(EyeSide::Left, WINDOW),
            Viewport { x: 0, y: 0, width: 700, height: 600 }
        );
        assert_eq!(
            Viewport::for_eye(EyeSide::Right, WINDOW),
            Viewport { x: 700, y: 0, width: 700, height: 600 }
        );
    }

    #[test]
    fn draw_order_is_props_then_objects() {
        let scene = scene_with_props();
        let frame = EyeFrame::build(&scene, EyeSide::Left, WINDOW);
        let roles: Vec<DrawRole> = frame.draws.iter().map(|draw| draw.role).collect();
        assert_eq!(
            roles,
            vec![
                DrawRole::Background,
                DrawRole::Sky,
                DrawRole::LightMarker,
                DrawRole::Object(0),
                DrawRole::Object(1),
            ]
        );
        assert_eq!(frame.draws[2].shader, ShaderKind::LightMarker);
        assert_eq!(frame.draws[3].attenuation, Attenuation::OBJECTS);
        assert_eq!(frame.light_for(&frame.draws[0]).attenuation, Attenuation::PROPS);
    }

    #[test]
    fn light_marker_follows_light() {
        let mut scene = scene_with_props();
        scene.light.position = Vec3::new(1.0, 2.0, 3.0);
        let frame = EyeFrame::build(&scene, EyeSide::Right, WINDOW);
        let marker = frame
            .draws
            .iter()
            .find(|draw| draw.role == DrawRole::LightMarker)
            .unwrap();
        assert!(marker
            .model
            .abs_diff_eq(Mat4::from_scale_rotation_translation(LIGHT_MARKER_SCALE, glam::Quat::IDENTITY, Vec3::new(1.0, 2.0, 3.0)), 1e-6));
    }

    #[test]
    fn eyes_differ_only_by_position() {
        let scene = scene_with_props();
        let frame = StereoFrame::build(&scene, WINDOW);
        assert_eq!(frame.left.light.view_position, scene.camera.left_eye());
        assert_eq!(frame.right.light.view_position, scene.camera.right_eye());
        assert_eq!(frame.left.projection, frame.right.projection);
        assert_eq!(frame.left.draws, frame.right.draws);
        assert_ne!(frame.left.view, frame.right.view);
    }

    #[test]
    fn missing_props_are_not_drawn() {
        let mut scene = scene_with_props();
        scene.props = Default::default();
        let frame = EyeFrame::build(&scene, EyeSide::Left, WINDOW);
        assert_eq!(frame.draws.len(), 2);
    }

    #[test]
    fn projection_uses_half_width_aspect() {
        let scene = SceneModel::new();
        let frame = EyeFrame::build(&scene, EyeSide::Left, WINDOW);
        assert!(frame
            .projection
            .abs_diff_eq(projection_matrix(700.0 / 600.0), 1e-6));
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<String>,
    }

    impl RenderBackend for RecordingBackend {
        fn resize(&mut self, window: UVec2) {
            self.calls.push(format!("resize {}x{}", window.x, window.y));
        }

        fn render_eye(&mut self, frame: &EyeFrame, _assets: &AssetManager) -> Result<(), RenderError> {
            self.calls.push(format!("{:?}", frame.eye));
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.calls.push("present".to_string());
            Ok(())
        }
    }

    #[test]
    fn stereo_renders_left_then_right_then_presents() {
        let scene = scene_with_props();
        let frame = StereoFrame::build(&scene, WINDOW);
        let mut backend = RecordingBackend::default();
        render_stereo(&mut backend, &frame, &AssetManager::new()).unwrap();
        assert_eq!(backend.calls, vec!["Left", "Right", "present"]);
    }
}
