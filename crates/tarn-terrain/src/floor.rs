//! The terrain floor: world-space ground queries plus the LOD chunk grid

use std::time::Instant;

use crate::field::{NormalSampling, TerrainField};
use crate::grid::{ChunkGrid, LodPolicy, LodTier, Surface, TierSpec};
use glam::Vec3;
use tarn_core::{Result, TerrainSettings};

/// Height and normal queries in world coordinates.
///
/// World `(x, z)` maps to field space as `u = x / width + 0.5`,
/// `v = -z / length + 0.5`, so the terrain is centred on the origin.
#[derive(Debug, Clone, Copy)]
pub struct Ground {
    field: TerrainField,
    octaves: u32,
    width: f32,
    length: f32,
    tiles: (u32, u32),
    epsilon_fraction: f64,
}

impl Ground {
    pub fn new(settings: &TerrainSettings) -> Self {
        Self {
            field: TerrainField::new(settings.seed),
            octaves: settings.octaves,
            width: settings.width(),
            length: settings.length(),
            tiles: (settings.tiles_x, settings.tiles_z),
            epsilon_fraction: settings.normal_epsilon_fraction,
        }
    }

    pub fn field(&self) -> &TerrainField {
        &self.field
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn to_uv(&self, x: f32, z: f32) -> (f64, f64) {
        (
            x as f64 / self.width as f64 + 0.5,
            -(z as f64) / self.length as f64 + 0.5,
        )
    }

    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let (u, v) = self.to_uv(x, z);
        self.field.height(u, v, self.octaves) as f32
    }

    /// World-space normal sampled at the coarse tile spacing
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let (u, v) = self.to_uv(x, z);
        let sampling = NormalSampling::for_grid(
            self.tiles.0,
            self.tiles.1,
            self.epsilon_fraction,
            self.width as f64,
            self.length as f64,
        );
        self.field.normal_with(u, v, self.octaves, sampling)
    }
}

impl Surface for Ground {
    fn height(&self, u: f64, v: f64) -> f32 {
        self.field.height(u, v, self.octaves) as f32
    }

    fn normal(&self, u: f64, v: f64, spec: &TierSpec) -> Vec3 {
        let sampling = NormalSampling::for_grid(
            spec.tiles_x,
            spec.tiles_z,
            self.epsilon_fraction,
            spec.width() as f64,
            spec.length() as f64,
        );
        self.field.normal_with(u, v, self.octaves, sampling)
    }
}

/// Tier layout of the terrain: coarse, mid and detail tiling of the same extent
pub fn terrain_tiers(settings: &TerrainSettings) -> [TierSpec; 3] {
    let dense = |tier, density: u32| TierSpec {
        tier,
        tile_size: settings.tile_size / density as f32,
        tiles_x: settings.tiles_x * density,
        tiles_z: settings.tiles_z * density,
        uv_scale: settings.detail_uv_tiling,
    };
    [
        TierSpec {
            tier: LodTier::Coarse,
            tile_size: settings.tile_size,
            tiles_x: settings.tiles_x,
            tiles_z: settings.tiles_z,
            uv_scale: 1.0,
        },
        dense(LodTier::Mid, settings.mid_density),
        dense(LodTier::Detail, settings.detail_density),
    ]
}

/// Procedural terrain: ground queries and the pre-built chunk meshes
#[derive(Debug, Clone)]
pub struct Floor {
    ground: Ground,
    grid: ChunkGrid,
}

impl Floor {
    pub fn generate(settings: &TerrainSettings) -> Result<Self> {
        let start = Instant::now();
        let ground = Ground::new(settings);
        let grid = ChunkGrid::build(&ground, &terrain_tiers(settings), LodPolicy::ThreeTier)?;

        log::info!(
            "Generated terrain (seed {}, {:.1}x{:.1}): {} vertices in {:.2?}",
            settings.seed,
            ground.width(),
            ground.length(),
            grid.vertex_count(),
            start.elapsed()
        );

        Ok(Self { ground, grid })
    }

    pub fn ground(&self) -> &Ground {
        &self.ground
    }

    pub fn grid(&self) -> &ChunkGrid {
        &self.grid
    }

    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.ground.height_at(x, z)
    }

    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        self.ground.normal_at(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings() -> TerrainSettings {
        TerrainSettings {
            tiles_x: 10,
            tiles_z: 10,
            tile_size: 1.0,
            mid_density: 2,
            detail_density: 3,
            ..Default::default()
        }
    }

    #[test]
    fn tiers_span_the_same_extent() {
        let tiers = terrain_tiers(&TerrainSettings::default());
        for spec in &tiers {
            assert!((spec.width() - 10.0).abs() < 1e-3);
            assert!((spec.length() - 10.0).abs() < 1e-3);
        }
        assert_eq!(tiers[0].uv_scale, 1.0);
        assert_eq!(tiers[2].uv_scale, 300.0);
        assert_eq!(tiers[2].tiles_x, 1000);
    }

    #[test]
    fn mesh_heights_match_ground_queries() {
        let floor = Floor::generate(&small_settings()).unwrap();
        let cell = floor.grid().cell(3, 6).unwrap();
        for tier in [LodTier::Coarse, LodTier::Mid, LodTier::Detail] {
            for p in &cell.mesh(tier).unwrap().positions {
                let h = floor.height_at(p[0], p[2]);
                assert!((h - p[1]).abs() < 1e-4, "tier {:?}: {} vs {}", tier, h, p[1]);
            }
        }
    }

    #[test]
    fn same_seed_regenerates_the_same_floor() {
        let a = Floor::generate(&small_settings()).unwrap();
        let b = Floor::generate(&small_settings()).unwrap();

        assert_eq!(a.grid().cells().len(), b.grid().cells().len());
        for (ca, cb) in a.grid().cells().iter().zip(b.grid().cells()) {
            assert_eq!((ca.col, ca.row), (cb.col, cb.row));
            for ((ta, ma), (tb, mb)) in ca.meshes().zip(cb.meshes()) {
                assert_eq!(ta, tb);
                assert_eq!(ma, mb);
            }
        }
        for i in -4..=4 {
            let (x, z) = (i as f32 * 1.1, i as f32 * -0.6);
            assert_eq!(a.height_at(x, z), b.height_at(x, z));
            assert_eq!(a.normal_at(x, z), b.normal_at(x, z));
        }
    }

    #[test]
    fn different_seeds_give_different_floors() {
        let a = Floor::generate(&small_settings()).unwrap();
        let b = Floor::generate(&TerrainSettings {
            seed: 99,
            ..small_settings()
        })
        .unwrap();
        let cell = |f: &Floor| f.grid().cell(2, 7).unwrap().mesh(LodTier::Coarse).unwrap().clone();
        assert_ne!(cell(&a).positions, cell(&b).positions);
    }

    #[test]
    fn origin_maps_to_field_centre() {
        let ground = Ground::new(&TerrainSettings::default());
        let (u, v) = ground.to_uv(0.0, 0.0);
        assert_eq!((u, v), (0.5, 0.5));
        let expected = ground.field().height(0.5, 0.5, 6) as f32;
        assert_eq!(ground.height_at(0.0, 0.0), expected);
    }

    #[test]
    fn world_normals_are_unit() {
        let ground = Ground::new(&TerrainSettings::default());
        for i in -5..=5 {
            let n = ground.normal_at(i as f32 * 0.9, i as f32 * -0.7);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.y > 0.0);
        }
    }

    #[test]
    fn every_built_vertex_is_finite() {
        let floor = Floor::generate(&small_settings()).unwrap();
        for cell in floor.grid().cells() {
            for (_, mesh) in cell.meshes() {
                for stream in [&mesh.normals, &mesh.tangents, &mesh.bitangents] {
                    assert!(stream.iter().flatten().all(|c| c.is_finite()));
                }
            }
        }
    }
}
