//! Layered configuration
//!
//! Config is resolved with three layers of precedence (highest wins):
//! 1. Environment variables: `TARN_SEED`, `TARN_FOLIAGE_SEED`
//! 2. A TOML file (explicit `--config` path, or `./tarn.toml` if present)
//! 3. Built-in defaults

use crate::error::{Result, TarnError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of cells along each axis of a chunk grid
pub const GRID_CELLS: u32 = 10;

/// Procedural terrain settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Noise seed
    pub seed: u32,
    /// World size of one coarse tile
    pub tile_size: f32,
    /// Coarse tiles along X (must be a multiple of the grid cell count)
    pub tiles_x: u32,
    /// Coarse tiles along Z
    pub tiles_z: u32,
    /// Octaves summed by the height field
    pub octaves: u32,
    /// Tile density multiplier of the mid tier
    pub mid_density: u32,
    /// Tile density multiplier of the detail tier
    pub detail_density: u32,
    /// UV multiplier applied on the mid and detail tiers
    pub detail_uv_tiling: f32,
    /// Finite-difference step as a fraction of a tier's UV grid spacing
    pub normal_epsilon_fraction: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            seed: 2134,
            tile_size: 0.1,
            tiles_x: 100,
            tiles_z: 100,
            octaves: 6,
            mid_density: 5,
            detail_density: 10,
            detail_uv_tiling: 300.0,
            normal_epsilon_fraction: 0.5,
        }
    }
}

impl TerrainSettings {
    pub fn width(&self) -> f32 {
        self.tile_size * self.tiles_x as f32
    }

    pub fn length(&self) -> f32 {
        self.tile_size * self.tiles_z as f32
    }
}

/// Water plane settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    pub enabled: bool,
    pub tile_size: f32,
    pub tiles_x: u32,
    pub tiles_z: u32,
    pub detail_density: u32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tile_size: 0.1,
            tiles_x: 100,
            tiles_z: 100,
            detail_density: 10,
        }
    }
}

/// Tree scattering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoliageSettings {
    /// Number of trees to place
    pub count: u32,
    /// Candidate points below this terrain height are rejected
    pub min_height: f32,
    pub segment_height: f32,
    pub segments: u32,
    /// Placement RNG seed
    pub seed: u64,
}

impl Default for FoliageSettings {
    fn default() -> Self {
        Self {
            count: 20,
            min_height: 0.1,
            segment_height: 0.6,
            segments: 1,
            seed: 12345,
        }
    }
}

/// Directional light settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSettings {
    /// Light position; the light shines from here towards `target`
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: [1.0, 5.0, 4.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

/// First-person camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second
    pub move_speed: f32,
    /// Radians per mouse count
    pub look_sensitivity: f32,
    /// Eye offset above the terrain surface
    pub eye_height: f32,
    pub start: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.01,
            far: 20.0,
            move_speed: 0.1,
            look_sensitivity: 0.003,
            eye_height: 0.1,
            start: [0.0, 1.5, 0.0],
        }
    }
}

/// Render pass and asset settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub shadow_resolution: u32,
    pub outline_resolution: u32,
    pub terrain_texture: String,
    pub terrain_normal_map: String,
    pub water_texture: String,
    pub tree_texture: String,
    pub flat_normal_map: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_resolution: 1024,
            outline_resolution: 4096,
            terrain_texture: "assets/dirt.png".to_string(),
            terrain_normal_map: "assets/dirtnormal.png".to_string(),
            water_texture: "assets/water.png".to_string(),
            tree_texture: "assets/tree.png".to_string(),
            flat_normal_map: "assets/flatnormal.png".to_string(),
        }
    }
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TarnConfig {
    pub terrain: TerrainSettings,
    pub water: WaterSettings,
    pub foliage: FoliageSettings,
    pub light: LightSettings,
    pub camera: CameraSettings,
    pub render: RenderSettings,
}

impl TarnConfig {
    /// Load config with layered precedence: defaults < file < env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => {
                let local = PathBuf::from("tarn.toml");
                if local.exists() {
                    Self::load_file(&local)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from TOML text without touching the environment
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TarnConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(toml::from_str(&content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(seed) = std::env::var("TARN_SEED") {
            match seed.parse() {
                Ok(seed) => self.terrain.seed = seed,
                Err(_) => log::warn!("Ignoring TARN_SEED='{}': not a u32", seed),
            }
        }
        if let Ok(seed) = std::env::var("TARN_FOLIAGE_SEED") {
            match seed.parse() {
                Ok(seed) => self.foliage.seed = seed,
                Err(_) => log::warn!("Ignoring TARN_FOLIAGE_SEED='{}': not a u64", seed),
            }
        }
    }

    /// Check invariants the mesh and render code rely on
    pub fn validate(&self) -> Result<()> {
        let t = &self.terrain;
        check_grid("terrain.tiles_x", t.tiles_x)?;
        check_grid("terrain.tiles_z", t.tiles_z)?;
        check_positive("terrain.tile_size", t.tile_size)?;
        if t.octaves == 0 || t.octaves > 16 {
            return Err(invalid(format!(
                "terrain.octaves must be in 1..=16, got {}",
                t.octaves
            )));
        }
        if t.mid_density == 0 || t.detail_density == 0 {
            return Err(invalid("terrain tier densities must be at least 1"));
        }
        if !(t.normal_epsilon_fraction > 0.0) {
            return Err(invalid("terrain.normal_epsilon_fraction must be positive"));
        }

        let w = &self.water;
        check_grid("water.tiles_x", w.tiles_x)?;
        check_grid("water.tiles_z", w.tiles_z)?;
        check_positive("water.tile_size", w.tile_size)?;
        if w.detail_density == 0 {
            return Err(invalid("water.detail_density must be at least 1"));
        }

        let c = &self.camera;
        if !(c.near > 0.0 && c.far > c.near) {
            return Err(invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                c.near, c.far
            )));
        }

        let r = &self.render;
        if r.shadow_resolution == 0 || r.outline_resolution == 0 {
            return Err(invalid("depth map resolutions must be non-zero"));
        }

        let l = &self.light;
        if l.position == l.target {
            return Err(invalid("light.position and light.target must differ"));
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> TarnError {
    TarnError::InvalidConfig(msg.into())
}

fn check_grid(field: &str, tiles: u32) -> Result<()> {
    if tiles == 0 || tiles % GRID_CELLS != 0 {
        return Err(invalid(format!(
            "{} must be a non-zero multiple of {}, got {}",
            field, GRID_CELLS, tiles
        )));
    }
    Ok(())
}

fn check_positive(field: &str, value: f32) -> Result<()> {
    if !(value > 0.0) {
        return Err(invalid(format!("{} must be positive, got {}", field, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TarnConfig::default();
        config.validate().unwrap();
        assert_eq!(config.terrain.seed, 2134);
        assert!((config.terrain.width() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = TarnConfig::from_toml_str(
            r#"
            [terrain]
            seed = 7
            octaves = 4

            [foliage]
            count = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.terrain.seed, 7);
        assert_eq!(config.terrain.octaves, 4);
        assert_eq!(config.terrain.tiles_x, 100);
        assert_eq!(config.foliage.count, 3);
        assert_eq!(config.render.shadow_resolution, 1024);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = TarnConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = TarnConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_tile_counts_off_the_grid() {
        let err = TarnConfig::from_toml_str("[terrain]\ntiles_x = 95\n").unwrap_err();
        assert!(matches!(err, TarnError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_bad_clip_planes() {
        let err = TarnConfig::from_toml_str("[camera]\nnear = 5.0\nfar = 1.0\n").unwrap_err();
        assert!(matches!(err, TarnError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = TarnConfig::from_toml_str("[terrain\nseed = 1").unwrap_err();
        assert!(matches!(err, TarnError::TomlParseError(_)));
    }
}
