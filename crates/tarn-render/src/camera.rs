//! First-person camera

use glam::{Mat4, Vec3};
use tarn_core::CameraSettings;

/// Horizontal direction to move in, relative to where the camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDir {
    Forward,
    Back,
    Left,
    Right,
}

/// A yaw/pitch camera positioned in world space.
/// Yaw 0 looks down -Z; positive yaw turns left, positive pitch looks up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstPersonCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

impl Default for FirstPersonCamera {
    fn default() -> Self {
        Self::new(&CameraSettings::default())
    }
}

impl FirstPersonCamera {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            position: Vec3::from(settings.start),
            yaw: 0.0,
            pitch: 0.0,
            fov: settings.fov,
            near: settings.near,
            far: settings.far,
            aspect: 16.0 / 9.0,
        }
    }

    /// Camera-to-world transform
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.yaw)
            * Mat4::from_rotation_x(self.pitch)
    }

    /// World-to-camera transform
    pub fn view_matrix(&self) -> Mat4 {
        self.model_matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    /// Turn by a look delta, clamping pitch to straight up/down
    pub fn look(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(
            -std::f32::consts::FRAC_PI_2,
            std::f32::consts::FRAC_PI_2,
        );
    }

    /// Unit vector on the ground plane for a movement direction
    pub fn ground_direction(&self, dir: MoveDir) -> Vec3 {
        let (s, c) = (-self.yaw).sin_cos();
        match dir {
            MoveDir::Forward => Vec3::new(s, 0.0, -c),
            MoveDir::Back => Vec3::new(-s, 0.0, c),
            MoveDir::Right => Vec3::new(c, 0.0, s),
            MoveDir::Left => Vec3::new(-c, 0.0, -s),
        }
    }

    /// Step along the ground plane; height is left to the caller
    pub fn translate(&mut self, dir: MoveDir, distance: f32) {
        self.position += self.ground_direction(dir) * distance;
    }
}
