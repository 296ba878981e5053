//! Tarn Terrain - Procedural terrain, water and foliage geometry
//!
//! Provides the noise-driven height field, the chunked LOD mesh grid used by
//! both terrain and water, and rejection-sampled trees. Does not depend on
//! tarn-render: everything here is CPU-side vertex data for the renderer to
//! upload.

pub mod field;
pub mod floor;
pub mod foliage;
pub mod grid;
pub mod mesh;
pub mod noise_field;
pub mod props;
pub mod scene;
pub mod water;

pub use field::{NormalSampling, TerrainField};
pub use floor::{terrain_tiers, Floor, Ground};
pub use foliage::{build_tree_mesh, place_trees, Tree};
pub use grid::{CellLod, ChunkCell, ChunkGrid, ChunkLayout, LodPolicy, LodTier, Surface, TierSpec};
pub use mesh::MeshData;
pub use noise_field::NoiseField;
pub use props::{cube_mesh, MarkerCube};
pub use scene::Scene;
pub use water::{FlatSurface, Water};
