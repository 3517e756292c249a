pub mod loader;

use crate::assets::MeshHandle;
use crate::render::CameraPair;
use glam::{Mat4, Quat, Vec3};

pub const LIGHT_CHANNEL_MIN: f32 = 0.05;
pub const LIGHT_CHANNEL_MAX: f32 = 0.95;

/// Angle (radians) about an axis, stored as declared in the scene file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub angle: f32,
    pub axis: Vec3,
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        angle: 0.0,
        axis: Vec3::ZERO,
    };

    /// `[angle, axis.x, axis.y, axis.z]`
    pub fn from_array(values: [f32; 4]) -> Self {
        Self {
            angle: values[0],
            axis: Vec3::new(values[1], values[2], values[3]),
        }
    }

    /// A zero-length axis means no rotation.
    pub fn to_quat(self) -> Quat {
        match self.axis.try_normalize() {
            Some(axis) => Quat::from_axis_angle(axis, self.angle),
            None => Quat::IDENTITY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlacedObject {
    pub mesh: MeshHandle,
    pub path: String,
    pub position: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
    pub selected: bool,
}

impl PlacedObject {
    pub fn new(mesh: MeshHandle, path: &str, position: Vec3, rotation: Rotation, scale: Vec3) -> Self {
        Self {
            mesh,
            path: path.to_string(),
            position,
            rotation,
            scale,
            selected: false,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        compose_transform_matrix(self.position, self.rotation, self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub tuning_enabled: bool,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.5, 0.0),
            ambient: Vec3::splat(0.3),
            diffuse: Vec3::splat(0.4),
            tuning_enabled: false,
        }
    }
}

impl LightState {
    /// Shifts ambient and diffuse together, then clamps every channel.
    pub fn tune(&mut self, amount: f32) {
        let min = Vec3::splat(LIGHT_CHANNEL_MIN);
        let max = Vec3::splat(LIGHT_CHANNEL_MAX);
        self.ambient = (self.ambient + Vec3::splat(amount)).clamp(min, max);
        self.diffuse = (self.diffuse + Vec3::splat(amount)).clamp(min, max);
    }
}

/// Fixed scenery drawn around the placed objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneProps {
    pub background: Option<MeshHandle>,
    pub sky: Option<MeshHandle>,
    pub light_marker: Option<MeshHandle>,
}

pub const BACKGROUND_POSITION: Vec3 = Vec3::new(0.0, -0.5, 0.0);
pub const BACKGROUND_SCALE: Vec3 = Vec3::splat(0.5);
pub const SKY_SCALE: Vec3 = Vec3::splat(100.0);
pub const LIGHT_MARKER_SCALE: Vec3 = Vec3::splat(0.2);

#[derive(Debug, Clone, Default)]
pub struct SceneModel {
    pub camera: CameraPair,
    pub light: LightState,
    pub props: SceneProps,
    objects: Vec<PlacedObject>,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&PlacedObject> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut PlacedObject> {
        self.objects.get_mut(index)
    }

    pub fn add_object(&mut self, object: PlacedObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.objects.iter().position(|object| object.selected)
    }

    pub fn clear_selection(&mut self) {
        for object in &mut self.objects {
            object.selected = false;
        }
    }
}

/// translate(position) * rotate(angle, axis) * scale(scale)
pub fn compose_transform_matrix(position: Vec3, rotation: Rotation, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation.to_quat(), position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_clamps_each_channel() {
        let mut light = LightState::default();
        for _ in 0..40 {
            light.tune(0.05 * 3.0);
            for channel in light.ambient.to_array().into_iter().chain(light.diffuse.to_array()) {
                assert!((LIGHT_CHANNEL_MIN..=LIGHT_CHANNEL_MAX).contains(&channel));
            }
        }
        assert_eq!(light.ambient, Vec3::splat(LIGHT_CHANNEL_MAX));

        for _ in 0..40 {
            light.tune(-0.05 * 7.0);
            for channel in light.ambient.to_array().into_iter().chain(light.diffuse.to_array()) {
                assert!((LIGHT_CHANNEL_MIN..=LIGHT_CHANNEL_MAX).contains(&channel));
            }
        }
        assert_eq!(light.diffuse, Vec3::splat(LIGHT_CHANNEL_MIN));
    }

    #[test]
    fn tuning_clamps_channels_independently() {
        let mut light = LightState {
            ambient: Vec3::new(0.1, 0.5, 0.9),
            ..LightState::default()
        };
        light.tune(0.1);
        assert!(light.ambient.abs_diff_eq(Vec3::new(0.2, 0.6, 0.95), 1e-6));
    }

    #[test]
    fn zero_axis_rotation_is_identity() {
        let matrix = compose_transform_matrix(
            Vec3::new(1.0, 2.0, 3.0),
            Rotation::from_array([0.7, 0.0, 0.0, 0.0]),
            Vec3::ONE,
        );
        assert!(matrix.abs_diff_eq(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)), 1e-6));
    }

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let matrix = compose_transform_matrix(
            Vec3::new(0.0, 1.0, 0.0),
            Rotation::from_array([std::f32::consts::FRAC_PI_2, 0.0, 1.0, 0.0]),
            Vec3::splat(2.0),
        );
        let point = matrix.transform_point3(Vec3::X);
        // scale -> (2,0,0), rotate 90° about +Y -> (0,0,-2), translate -> (0,1,-2)
        assert!(point.abs_diff_eq(Vec3::new(0.0, 1.0, -2.0), 1e-5));
    }

    #[test]
    fn selection_helpers() {
        let mut scene = SceneModel::new();
        let handle = MeshHandle::from_index(0);
        scene.add_object(PlacedObject::new(handle, "a.obj", Vec3::ZERO, Rotation::IDENTITY, Vec3::ONE));
        let second =
            scene.add_object(PlacedObject::new(handle, "a.obj", Vec3::X, Rotation::IDENTITY, Vec3::ONE));
        assert_eq!(scene.selected_index(), None);
        scene.object_mut(second).unwrap().selected = true;
        assert_eq!(scene.selected_index(), Some(second));
        scene.clear_selection();
        assert_eq!(scene.selected_index(), None);
    }
}
