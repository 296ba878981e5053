//! Tarn Player - interactive terrain viewer library
//!
//! This crate provides the `PlayerApp` application handler that flies a
//! first-person camera over the generated scene.

mod clock;
mod input;
mod player_app;
mod state;

pub use clock::FrameClock;
pub use input::InputState;
pub use player_app::PlayerApp;
pub use state::AppState;
