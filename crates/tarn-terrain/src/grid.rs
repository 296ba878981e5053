//! Chunked mesh grid with camera-driven level of detail
//!
//! The world is split into a fixed `GRID_CELLS x GRID_CELLS` grid. Every cell
//! holds one pre-built patch per detail tier; at draw time each cell picks a
//! tier from its distance (in cells) to the camera.

use crate::mesh::MeshData;
use glam::Vec3;
use tarn_core::{Result, TarnError, GRID_CELLS};

/// Mesh resolution of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LodTier {
    Coarse,
    Mid,
    Detail,
}

impl LodTier {
    pub fn name(&self) -> &'static str {
        match self {
            LodTier::Coarse => "coarse",
            LodTier::Mid => "mid",
            LodTier::Detail => "detail",
        }
    }
}

/// Tiling of one tier across the whole grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSpec {
    pub tier: LodTier,
    pub tile_size: f32,
    pub tiles_x: u32,
    pub tiles_z: u32,
    /// Multiplier applied to the patch UVs
    pub uv_scale: f32,
}

impl TierSpec {
    pub fn width(&self) -> f32 {
        self.tile_size * self.tiles_x as f32
    }

    pub fn length(&self) -> f32 {
        self.tile_size * self.tiles_z as f32
    }

    /// Tiles per cell along (x, z)
    pub fn cell_tiles(&self) -> (u32, u32) {
        (self.tiles_x / GRID_CELLS, self.tiles_z / GRID_CELLS)
    }

    fn validate(&self) -> Result<()> {
        if self.tiles_x == 0
            || self.tiles_z == 0
            || self.tiles_x % GRID_CELLS != 0
            || self.tiles_z % GRID_CELLS != 0
        {
            return Err(TarnError::InvalidMesh(format!(
                "{} tier needs tile counts divisible by {}, got {}x{}",
                self.tier.name(),
                GRID_CELLS,
                self.tiles_x,
                self.tiles_z
            )));
        }
        Ok(())
    }
}

/// Which tiers a grid carries and how they are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LodPolicy {
    /// Detail near the camera, a mid ring, coarse beyond
    ThreeTier,
    /// Detail near the camera, coarse beyond
    TwoTier,
}

impl LodPolicy {
    pub fn tiers(&self) -> &'static [LodTier] {
        match self {
            LodPolicy::ThreeTier => &[LodTier::Coarse, LodTier::Mid, LodTier::Detail],
            LodPolicy::TwoTier => &[LodTier::Coarse, LodTier::Detail],
        }
    }

    /// Tier for cell `(col, row)` given the camera in normalized grid space.
    /// The detail window is the 3x3 block around the camera's cell, the mid
    /// window the 7x7 block. Bounds are strict.
    pub fn select(&self, col: u32, row: u32, nx: f32, nz: f32) -> LodTier {
        let cells = GRID_CELLS as f32;
        let within = |lo: f32, hi: f32| {
            let (c, r) = (col as f32, row as f32);
            (c + lo) / cells < nx
                && nx < (c + hi) / cells
                && (r + lo) / cells < nz
                && nz < (r + hi) / cells
        };

        if within(-1.0, 2.0) {
            return LodTier::Detail;
        }
        match self {
            LodPolicy::ThreeTier if within(-3.0, 4.0) => LodTier::Mid,
            _ => LodTier::Coarse,
        }
    }
}

/// Height and normal source for patch vertices, queried in normalized UV space
pub trait Surface {
    fn height(&self, u: f64, v: f64) -> f32;
    fn normal(&self, u: f64, v: f64, spec: &TierSpec) -> Vec3;
}

/// A cell and the tier it should be drawn at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLod {
    pub col: u32,
    pub row: u32,
    pub tier: LodTier,
}

/// World extent and LOD policy of a grid; enough to pick tiers without meshes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkLayout {
    pub width: f32,
    pub length: f32,
    pub policy: LodPolicy,
}

impl ChunkLayout {
    /// Camera position in normalized grid space; `z` is flipped so it grows with `v`
    pub fn normalized(&self, x: f32, z: f32) -> (f32, f32) {
        (x / self.width + 0.5, -z / self.length + 0.5)
    }

    /// Tier per cell for a camera at world `(x, z)`, column-major
    pub fn select(&self, cam_x: f32, cam_z: f32) -> impl Iterator<Item = CellLod> + '_ {
        let (nx, nz) = self.normalized(cam_x, cam_z);
        (0..GRID_CELLS).flat_map(move |col| {
            (0..GRID_CELLS).map(move |row| CellLod {
                col,
                row,
                tier: self.policy.select(col, row, nx, nz),
            })
        })
    }
}

/// One grid cell with a mesh per tier
#[derive(Debug, Clone)]
pub struct ChunkCell {
    pub col: u32,
    pub row: u32,
    meshes: Vec<(LodTier, MeshData)>,
}

impl ChunkCell {
    pub fn mesh(&self, tier: LodTier) -> Option<&MeshData> {
        self.meshes.iter().find(|(t, _)| *t == tier).map(|(_, m)| m)
    }

    pub fn meshes(&self) -> impl Iterator<Item = (LodTier, &MeshData)> {
        self.meshes.iter().map(|(t, m)| (*t, m))
    }
}

/// Pre-built patches for every cell and tier
#[derive(Debug, Clone)]
pub struct ChunkGrid {
    layout: ChunkLayout,
    cells: Vec<ChunkCell>,
}

impl ChunkGrid {
    /// Build every cell at every tier the policy needs.
    /// All tiers must span the same world extent.
    pub fn build(surface: &impl Surface, tiers: &[TierSpec], policy: LodPolicy) -> Result<Self> {
        for spec in tiers {
            spec.validate()?;
        }
        for tier in policy.tiers() {
            if !tiers.iter().any(|s| s.tier == *tier) {
                return Err(TarnError::InvalidMesh(format!(
                    "grid policy needs a {} tier",
                    tier.name()
                )));
            }
        }

        let first = tiers
            .first()
            .ok_or_else(|| TarnError::InvalidMesh("grid needs at least one tier".into()))?;
        let (width, length) = (first.width(), first.length());
        for spec in tiers {
            if (spec.width() - width).abs() > 1e-3 * width || (spec.length() - length).abs() > 1e-3 * length
            {
                return Err(TarnError::InvalidMesh(format!(
                    "{} tier spans {}x{}, expected {}x{}",
                    spec.tier.name(),
                    spec.width(),
                    spec.length(),
                    width,
                    length
                )));
            }
        }

        let mut cells = Vec::with_capacity((GRID_CELLS * GRID_CELLS) as usize);
        for col in 0..GRID_CELLS {
            for row in 0..GRID_CELLS {
                let mut meshes = Vec::with_capacity(tiers.len());
                for spec in tiers.iter().filter(|s| policy.tiers().contains(&s.tier)) {
                    meshes.push((spec.tier, build_patch(surface, spec, col, row)?));
                }
                cells.push(ChunkCell { col, row, meshes });
            }
        }

        Ok(Self {
            layout: ChunkLayout {
                width,
                length,
                policy,
            },
            cells,
        })
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    pub fn cells(&self) -> &[ChunkCell] {
        &self.cells
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<&ChunkCell> {
        if col >= GRID_CELLS || row >= GRID_CELLS {
            return None;
        }
        self.cells.get((col * GRID_CELLS + row) as usize)
    }

    /// Meshes to draw for a camera at world `(x, z)`
    pub fn visible(&self, cam_x: f32, cam_z: f32) -> impl Iterator<Item = (CellLod, &MeshData)> + '_ {
        self.layout.select(cam_x, cam_z).filter_map(move |lod| {
            self.cell(lod.col, lod.row)
                .and_then(|c| c.mesh(lod.tier))
                .map(|m| (lod, m))
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|c| c.meshes())
            .map(|(_, m)| m.vertex_count())
            .sum()
    }
}

/// Regular patch of one cell at one tier.
///
/// Vertices run with x in the outer loop and z in the inner loop; vertex
/// `(i, j)` sits at `(i * tile - width/2, h, -(j * tile) + length/2)`.
pub fn build_patch(surface: &impl Surface, spec: &TierSpec, col: u32, row: u32) -> Result<MeshData> {
    let (nx, nz) = spec.cell_tiles();
    let (start_x, start_z) = (col * nx, row * nz);
    let half_w = spec.width() / 2.0;
    let half_l = spec.length() / 2.0;

    let vert_count = ((nx + 1) * (nz + 1)) as usize;
    let mut positions = Vec::with_capacity(vert_count);
    let mut normals = Vec::with_capacity(vert_count);
    let mut uvs = Vec::with_capacity(vert_count);

    for i in start_x..=start_x + nx {
        for j in start_z..=start_z + nz {
            let u = i as f64 / spec.tiles_x as f64;
            let v = j as f64 / spec.tiles_z as f64;
            let h = surface.height(u, v);

            positions.push([
                i as f32 * spec.tile_size - half_w,
                h,
                -(j as f32 * spec.tile_size) + half_l,
            ]);
            normals.push(surface.normal(u, v, spec).to_array());
            uvs.push([u as f32 * spec.uv_scale, v as f32 * spec.uv_scale]);
        }
    }

    let stride = nz + 1;
    let mut indices = Vec::with_capacity((nx * nz * 6) as usize);
    for i in 0..nx {
        for j in 0..nz {
            indices.extend_from_slice(&[
                i * stride + j,
                (i + 1) * stride + j,
                (i + 1) * stride + j + 1,
            ]);
            indices.extend_from_slice(&[
                i * stride + j,
                (i + 1) * stride + j + 1,
                i * stride + j + 1,
            ]);
        }
    }

    MeshData::build(&positions, &uvs, &indices, false, Some(&normals))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gentle slope in u so patches have distinct heights
    struct Ramp;

    impl Surface for Ramp {
        fn height(&self, u: f64, v: f64) -> f32 {
            (u * 0.5 + v * 0.25) as f32
        }

        fn normal(&self, _u: f64, _v: f64, _spec: &TierSpec) -> Vec3 {
            Vec3::new(-0.05, 1.0, 0.025).normalize()
        }
    }

    fn tier(tier: LodTier, density: u32) -> TierSpec {
        TierSpec {
            tier,
            tile_size: 0.1 / density as f32,
            tiles_x: 10 * density,
            tiles_z: 10 * density,
            uv_scale: 1.0,
        }
    }

    fn small_grid() -> ChunkGrid {
        ChunkGrid::build(
            &Ramp,
            &[
                tier(LodTier::Coarse, 1),
                tier(LodTier::Mid, 2),
                tier(LodTier::Detail, 3),
            ],
            LodPolicy::ThreeTier,
        )
        .unwrap()
    }

    #[test]
    fn patch_has_expected_counts() {
        let spec = tier(LodTier::Detail, 3);
        let mesh = build_patch(&Ramp, &spec, 4, 7).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.index_count(), 3 * 3 * 6);
    }

    #[test]
    fn patch_faces_point_up() {
        let mesh = build_patch(&Ramp, &tier(LodTier::Coarse, 2), 0, 0).unwrap();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn cells_cover_their_slice_of_the_world() {
        let grid = small_grid();
        let layout = grid.layout();
        for cell in grid.cells() {
            for (_, mesh) in cell.meshes() {
                let (min, max) = mesh.bounds().unwrap();
                let x0 = cell.col as f32 * layout.width / 10.0 - layout.width / 2.0;
                let z1 = layout.length / 2.0 - cell.row as f32 * layout.length / 10.0;
                assert!((min[0] - x0).abs() < 1e-4);
                assert!((max[0] - (x0 + layout.width / 10.0)).abs() < 1e-4);
                assert!((max[2] - z1).abs() < 1e-4);
                assert!((min[2] - (z1 - layout.length / 10.0)).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn neighbouring_cells_share_edges() {
        let grid = small_grid();
        for &t in LodPolicy::ThreeTier.tiers() {
            for col in 0..GRID_CELLS - 1 {
                for row in 0..GRID_CELLS {
                    let left = grid.cell(col, row).unwrap().mesh(t).unwrap();
                    let right = grid.cell(col + 1, row).unwrap().mesh(t).unwrap();
                    let (_, left_max) = left.bounds().unwrap();
                    let (right_min, _) = right.bounds().unwrap();
                    let seam = |m: &MeshData, x: f32| -> Vec<[f32; 3]> {
                        m.positions
                            .iter()
                            .copied()
                            .filter(|p| (p[0] - x).abs() < 1e-5)
                            .collect()
                    };
                    assert_eq!(seam(left, left_max[0]), seam(right, right_min[0]));
                }
            }
        }
    }

    #[test]
    fn detail_window_around_camera() {
        let policy = LodPolicy::ThreeTier;
        // Camera in the middle of cell (5, 5)
        let (nx, nz) = (0.55, 0.55);
        let in_band = |c: u32, lo: u32, hi: u32| (lo..=hi).contains(&c);

        let mut counts = [0; 3];
        for col in 0..GRID_CELLS {
            for row in 0..GRID_CELLS {
                let expected = if in_band(col, 4, 6) && in_band(row, 4, 6) {
                    LodTier::Detail
                } else if in_band(col, 2, 8) && in_band(row, 2, 8) {
                    LodTier::Mid
                } else {
                    LodTier::Coarse
                };
                assert_eq!(policy.select(col, row, nx, nz), expected, "cell ({}, {})", col, row);
                counts[expected as usize] += 1;
            }
        }
        // 3x3 detail block inside a 7x7 mid window
        assert_eq!(counts, [51, 40, 9]);
    }

    #[test]
    fn window_bounds_are_strict() {
        let policy = LodPolicy::ThreeTier;
        // (3 - 1) / 10 == 0.2 exactly: not detail, still inside the mid window
        assert_eq!(policy.select(3, 3, 0.2, 0.35), LodTier::Mid);
        assert_eq!(policy.select(3, 3, 0.2001, 0.35), LodTier::Detail);
    }

    #[test]
    fn two_tier_policy_never_picks_mid() {
        let layout = ChunkLayout {
            width: 10.0,
            length: 10.0,
            policy: LodPolicy::TwoTier,
        };
        let lods: Vec<_> = layout.select(0.0, 0.0).collect();
        assert_eq!(lods.len(), 100);
        assert!(lods.iter().all(|l| l.tier != LodTier::Mid));
        // Camera at the origin sits exactly on the corner of cells 4 and 5,
        // which the strict bounds turn into a 2x2 detail window
        let detail = lods.iter().filter(|l| l.tier == LodTier::Detail).count();
        assert_eq!(detail, 4);
    }

    #[test]
    fn camera_far_away_sees_only_coarse() {
        let grid = small_grid();
        assert!(grid.visible(1000.0, -1000.0).all(|(l, _)| l.tier == LodTier::Coarse));
        assert_eq!(grid.visible(1000.0, -1000.0).count(), 100);
    }

    #[test]
    fn normalized_camera_flips_z() {
        let layout = ChunkLayout {
            width: 10.0,
            length: 10.0,
            policy: LodPolicy::ThreeTier,
        };
        let (nx, nz) = layout.normalized(2.5, 2.5);
        assert!((nx - 0.75).abs() < 1e-5);
        assert!((nz - 0.25).abs() < 1e-5);
    }

    #[test]
    fn rejects_tiles_off_the_grid() {
        let mut bad = tier(LodTier::Coarse, 1);
        bad.tiles_x = 15;
        assert!(ChunkGrid::build(&Ramp, &[bad, tier(LodTier::Detail, 2)], LodPolicy::TwoTier).is_err());
    }

    #[test]
    fn rejects_missing_tier() {
        let err = ChunkGrid::build(&Ramp, &[tier(LodTier::Coarse, 1)], LodPolicy::TwoTier);
        assert!(err.is_err());
    }
}
