use glam::{Mat4, Vec3};

use super::EyeSide;

pub const PITCH_LIMIT: f32 = 80.0;
pub const FIELD_OF_VIEW_DEG: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

const WORLD_UP: Vec3 = Vec3::Y;

/// Two parallel eyes separated by a fixed offset.
///
/// Only the left eye, the offset and the look angles are stored. The right
/// eye and the view-at point are derived on every call, so they can never
/// lag behind a mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPair {
    left_eye: Vec3,
    eye_delta: Vec3,
    pub yaw: f32,
    pitch: f32,
    pub move_speed: f32,
}

impl Default for CameraPair {
    fn default() -> Self {
        Self::new(Vec3::new(-0.1, 0.5, 3.0), Vec3::new(0.2, 0.0, 0.0), 0.05)
    }
}

impl CameraPair {
    pub fn new(left_eye: Vec3, eye_delta: Vec3, move_speed: f32) -> Self {
        Self {
            left_eye,
            eye_delta,
            yaw: 0.0,
            pitch: 0.0,
            move_speed,
        }
    }

    pub fn left_eye(&self) -> Vec3 {
        self.left_eye
    }

    pub fn right_eye(&self) -> Vec3 {
        self.left_eye + self.eye_delta
    }

    pub fn eye_delta(&self) -> Vec3 {
        self.eye_delta
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn eye_position(&self, eye: EyeSide) -> Vec3 {
        match eye {
            EyeSide::Left => self.left_eye(),
            EyeSide::Right => self.right_eye(),
        }
    }

    /// Moves the left eye while the right eye stays put; the offset absorbs
    /// the difference.
    pub fn place_left_eye(&mut self, left_eye: Vec3) {
        self.eye_delta = self.right_eye() - left_eye;
        self.left_eye = left_eye;
    }

    /// Replaces the eye separation; the right eye follows the left.
    pub fn set_eye_delta(&mut self, eye_delta: Vec3) {
        self.eye_delta = eye_delta;
    }

    /// Unnormalized look direction. The vertical component is the raw pitch
    /// accumulator, not an angle.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), self.pitch, self.yaw.sin())
    }

    /// Shared view-at point for both eyes.
    pub fn view_at(&self) -> Vec3 {
        self.left_eye + self.forward()
    }

    /// Horizontal vector perpendicular to the forward direction, pointing to
    /// the camera's right.
    pub fn drag_right(&self) -> Vec3 {
        let forward = self.view_at() - self.left_eye;
        Vec3::new(-forward.z, 0.0, forward.x)
    }

    /// True when `eye` sits on the shared view-at point. Its look-at basis
    /// is undefined there and the view matrix comes out as NaN, so nothing
    /// projects or picks through that eye.
    pub fn eye_on_view_at(&self, eye: EyeSide) -> bool {
        (self.view_at() - self.eye_position(eye)).length_squared() < 1e-12
    }

    pub fn view_matrix(&self, eye: EyeSide) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(eye), self.view_at(), WORLD_UP)
    }

    pub fn look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx / sensitivity;
        self.set_pitch(self.pitch + dy / sensitivity);
    }

    /// Steps along the horizontal part of the view direction. `sign` is +1
    /// for forward and -1 for backward.
    pub fn advance(&mut self, sign: f32) {
        let forward = self.view_at() - self.left_eye;
        self.left_eye.x += forward.x * self.move_speed * sign;
        self.left_eye.z += forward.z * self.move_speed * sign;
    }

    /// Side step: +1 moves toward the forward vector rotated a quarter turn
    /// about +Y, -1 the opposite way.
    pub fn strafe(&mut self, sign: f32) {
        let forward = self.view_at() - self.left_eye;
        self.left_eye.x += forward.z * self.move_speed * sign;
        self.left_eye.z -= forward.x * self.move_speed * sign;
    }

    pub fn rise(&mut self, sign: f32) {
        self.left_eye.y += self.move_speed * sign;
    }
}

pub fn projection_matrix(aspect: f32) -> Mat4 {
    Mat4::perspective_rh_gl(
        FIELD_OF_VIEW_DEG.to_radians(),
        aspect.max(1e-3),
        NEAR_PLANE,
        FAR_PLANE,
    )
}
