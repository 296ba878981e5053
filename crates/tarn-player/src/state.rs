//! Application state shared by the event handlers and the update step

use crate::input::InputState;
use tarn_core::CameraSettings;
use tarn_render::FirstPersonCamera;

/// Camera pose, held input and movement tuning
pub struct AppState {
    pub camera: FirstPersonCamera,
    pub input: InputState,
    pub move_speed: f32,
    pub look_sensitivity: f32,
    /// Height of the eye above the terrain surface
    pub eye_height: f32,
}

impl AppState {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            camera: FirstPersonCamera::new(settings),
            input: InputState::new(),
            move_speed: settings.move_speed,
            look_sensitivity: settings.look_sensitivity,
            eye_height: settings.eye_height,
        }
    }

    /// Turn the camera by the mouse motion gathered since the last call.
    /// Moving the mouse right turns right, moving it down looks down.
    pub fn apply_look(&mut self) {
        let (dx, dy) = self.input.take_look_delta();
        self.camera.look(
            -(dx as f32) * self.look_sensitivity,
            -(dy as f32) * self.look_sensitivity,
        );
    }

    /// Move along the ground for `dt` seconds, then stand on the terrain
    pub fn update(&mut self, dt: f32, height_at: impl Fn(f32, f32) -> f32) {
        let step = self.move_speed * dt;
        for dir in self.input.held_directions() {
            self.camera.translate(dir, step);
        }
        let pos = &mut self.camera.position;
        pos.y = height_at(pos.x, pos.z) + self.eye_height;
    }
}
