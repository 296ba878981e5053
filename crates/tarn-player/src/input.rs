//! Keyboard and mouse-look input state

use std::collections::{HashMap, HashSet};
use tarn_render::MoveDir;
use winit::keyboard::KeyCode;

/// Held keys and the mouse motion accumulated since the last update
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    /// Raw device motion, summed until consumed
    look_delta: (f64, f64),
    /// Key -> movement direction
    move_map: HashMap<KeyCode, MoveDir>,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_down: HashSet::new(),
            look_delta: (0.0, 0.0),
            move_map: Self::default_move_map(),
        }
    }

    fn default_move_map() -> HashMap<KeyCode, MoveDir> {
        HashMap::from([
            (KeyCode::KeyW, MoveDir::Forward),
            (KeyCode::KeyS, MoveDir::Back),
            (KeyCode::KeyA, MoveDir::Left),
            (KeyCode::KeyD, MoveDir::Right),
            (KeyCode::ArrowUp, MoveDir::Forward),
            (KeyCode::ArrowDown, MoveDir::Back),
            (KeyCode::ArrowLeft, MoveDir::Left),
            (KeyCode::ArrowRight, MoveDir::Right),
        ])
    }

    pub fn process_key_down(&mut self, key: KeyCode) {
        self.keys_down.insert(key);
    }

    pub fn process_key_up(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    /// Accumulate raw mouse motion (cursor locked)
    pub fn process_mouse_raw_delta(&mut self, dx: f64, dy: f64) {
        self.look_delta.0 += dx;
        self.look_delta.1 += dy;
    }

    /// Directions with at least one bound key held, each reported once
    pub fn held_directions(&self) -> Vec<MoveDir> {
        let mut dirs = Vec::new();
        for dir in [MoveDir::Forward, MoveDir::Back, MoveDir::Left, MoveDir::Right] {
            let held = self
                .move_map
                .iter()
                .any(|(key, d)| *d == dir && self.keys_down.contains(key));
            if held {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Return the accumulated look delta and reset it
    pub fn take_look_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.look_delta)
    }

    /// Forget held keys, e.g. after focus is lost
    pub fn clear(&mut self) {
        self.keys_down.clear();
        self.look_delta = (0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_transitions() {
        let mut input = InputState::new();

        input.process_key_down(KeyCode::KeyW);
        assert_eq!(input.held_directions(), vec![MoveDir::Forward]);

        input.process_key_up(KeyCode::KeyW);
        assert!(input.held_directions().is_empty());

        // Unbound keys move nothing
        input.process_key_down(KeyCode::KeyZ);
        assert!(input.held_directions().is_empty());
    }

    #[test]
    fn test_direction_reported_once() {
        let mut input = InputState::new();
        input.process_key_down(KeyCode::KeyA);
        input.process_key_down(KeyCode::ArrowLeft);
        input.process_key_down(KeyCode::KeyD);
        assert_eq!(input.held_directions(), vec![MoveDir::Left, MoveDir::Right]);
    }

    #[test]
    fn test_look_delta_accumulates_and_resets() {
        let mut input = InputState::new();
        input.process_mouse_raw_delta(3.0, -1.0);
        input.process_mouse_raw_delta(2.0, 4.0);
        assert_eq!(input.take_look_delta(), (5.0, 3.0));
        assert_eq!(input.take_look_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_clear() {
        let mut input = InputState::new();
        input.process_key_down(KeyCode::KeyS);
        input.process_mouse_raw_delta(1.0, 1.0);
        input.clear();
        assert!(input.held_directions().is_empty());
        assert_eq!(input.take_look_delta(), (0.0, 0.0));
    }
}
