//! Screen-space picking.
//!
//! Every candidate's world origin is projected through the eye under the
//! cursor and compared with the cursor in that half-viewport's NDC. The
//! nearest candidate inside the threshold wins; the light is tested last and
//! only replaces an object when it is strictly closer.

use crate::render::camera::projection_matrix;
use crate::render::{CameraPair, EyeSide};
use crate::scene::SceneModel;
use glam::{Mat4, Vec2, Vec3};

/// What a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickHit {
    Object(usize),
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Picker {
    /// Largest squared NDC distance (after scale normalisation) that counts
    /// as a hit.
    pub threshold: f32,
    pub drag_divisor: f32,
    pub vertical_damping: f32,
}

impl Default for Picker {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            drag_divisor: 8.0,
            vertical_damping: 5.0,
        }
    }
}

impl Picker {
    pub fn pick(&self, scene: &SceneModel, cursor: Vec2, window: Vec2) -> Option<PickHit> {
        let (eye, ndc) = cursor_to_ndc(cursor, window);
        let clip_from_world = clip_from_world(&scene.camera, eye, window);

        let mut best: Option<(usize, f32)> = None;
        for (index, object) in scene.objects().iter().enumerate() {
            let Some(distance) = screen_distance(clip_from_world, object.position, ndc) else {
                continue;
            };
            let distance = (distance / object.scale.x).abs();
            if !distance.is_finite() {
                continue;
            }
            // Later objects win ties.
            let accept = match best {
                None => distance < self.threshold,
                Some((_, best_distance)) => distance <= best_distance,
            };
            if accept {
                best = Some((index, distance));
            }
        }

        let bar = best.map_or(self.threshold, |(_, distance)| distance);
        let light_hit = screen_distance(clip_from_world, scene.light.position, ndc)
            .is_some_and(|distance| distance < bar);

        let hit = if light_hit {
            Some(PickHit::Light)
        } else {
            best.map(|(index, _)| PickHit::Object(index))
        };
        log::debug!("Pick at {:?} ({:?} eye, ndc {:?}) -> {:?}", cursor, eye, ndc, hit);
        hit
    }

    /// World-space translation for a cursor move of `delta_px` pixels
    /// (x to the right, y up). Horizontal motion follows the camera's current
    /// right vector, vertical motion moves along world up.
    pub fn drag_offset(&self, camera: &CameraPair, delta_px: Vec2, window: Vec2) -> Vec3 {
        let dx = delta_px.x / (window.x / self.drag_divisor);
        let dy = delta_px.y / (window.y / self.drag_divisor);
        camera.drag_right() * dx + Vec3::Y * (dy / self.vertical_damping)
    }
}

pub fn eye_under_cursor(cursor_x: f32, window_width: f32) -> EyeSide {
    if cursor_x < window_width / 2.0 {
        EyeSide::Left
    } else {
        EyeSide::Right
    }
}

/// Maps a window pixel to the NDC of the half-viewport it falls in.
pub fn cursor_to_ndc(cursor: Vec2, window: Vec2) -> (EyeSide, Vec2) {
    let eye = eye_under_cursor(cursor.x, window.x);
    let x = 4.0 * cursor.x / window.x
        - match eye {
            EyeSide::Left => 1.0,
            EyeSide::Right => 3.0,
        };
    let y = 1.0 - 2.0 * cursor.y / window.y;
    (eye, Vec2::new(x, y))
}

pub fn clip_from_world(camera: &CameraPair, eye: EyeSide, window: Vec2) -> Mat4 {
    let aspect = (window.x / 2.0) / window.y;
    projection_matrix(aspect) * camera.view_matrix(eye)
}

/// Squared NDC distance between a projected point and `ndc`. Points at or
/// behind the eye plane have no screen position.
pub fn screen_distance(clip_from_world: Mat4, point: Vec3, ndc: Vec2) -> Option<f32> {
    let clip = clip_from_world * point.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let projected = Vec2::new(clip.x / clip.w, clip.y / clip.w);
    Some((projected - ndc).length_squared())
}
