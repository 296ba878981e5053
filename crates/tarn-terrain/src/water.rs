//! Flat water plane split into the same chunk grid as the terrain

use crate::grid::{ChunkGrid, LodPolicy, LodTier, Surface, TierSpec};
use glam::Vec3;
use tarn_core::{Result, WaterSettings};

/// Flat surface at `y = 0`
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatSurface;

impl Surface for FlatSurface {
    fn height(&self, _u: f64, _v: f64) -> f32 {
        0.0
    }

    fn normal(&self, _u: f64, _v: f64, _spec: &TierSpec) -> Vec3 {
        Vec3::Y
    }
}

pub fn water_tiers(settings: &WaterSettings) -> [TierSpec; 2] {
    [
        TierSpec {
            tier: LodTier::Coarse,
            tile_size: settings.tile_size,
            tiles_x: settings.tiles_x,
            tiles_z: settings.tiles_z,
            uv_scale: 1.0,
        },
        TierSpec {
            tier: LodTier::Detail,
            tile_size: settings.tile_size / settings.detail_density as f32,
            tiles_x: settings.tiles_x * settings.detail_density,
            tiles_z: settings.tiles_z * settings.detail_density,
            uv_scale: 1.0,
        },
    ]
}

#[derive(Debug, Clone)]
pub struct Water {
    grid: ChunkGrid,
}

impl Water {
    pub fn generate(settings: &WaterSettings) -> Result<Self> {
        let grid = ChunkGrid::build(&FlatSurface, &water_tiers(settings), LodPolicy::TwoTier)?;
        log::info!("Generated water plane: {} vertices", grid.vertex_count());
        Ok(Self { grid })
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }
}
