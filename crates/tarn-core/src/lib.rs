//! Tarn Core - Foundational types for the Tarn terrain renderer
//!
//! This crate provides the types that all other Tarn crates depend on:
//! - `TarnConfig` - Layered TOML configuration
//! - `Readiness` - Pending/Ready/Failed state for late-bound resources
//! - Error types and Result alias

mod config;
mod error;
mod readiness;

pub use config::{
    CameraSettings, FoliageSettings, LightSettings, RenderSettings, TarnConfig, TerrainSettings,
    WaterSettings, GRID_CELLS,
};
pub use error::{Result, TarnError};
pub use readiness::Readiness;
