//! GPU meshes: interleaved vertex buffers uploaded once from `MeshData`

use bytemuck::{Pod, Zeroable};
use tarn_core::GRID_CELLS;
use tarn_terrain::{CellLod, ChunkGrid, ChunkLayout, LodTier, MeshData};
use wgpu::util::DeviceExt;

/// Interleaved vertex layout shared by every program
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }

    /// Zip the separate streams of a mesh into vertices
    pub fn interleave(mesh: &MeshData) -> Vec<MeshVertex> {
        (0..mesh.vertex_count())
            .map(|i| MeshVertex {
                position: mesh.positions[i],
                normal: mesh.normals[i],
                uv: mesh.uvs[i],
                tangent: mesh.tangents[i],
                bitangent: mesh.bitangents[i],
            })
            .collect()
    }
}

/// Static vertex and index buffers for one mesh
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertices = MeshVertex::interleave(mesh);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    /// One indexed triangle-list draw over the whole mesh
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// GPU copy of a `ChunkGrid`, keeping the layout for per-frame tier selection
pub struct GpuChunkGrid {
    layout: ChunkLayout,
    /// One slot per `LodTier`, each holding cell meshes at `cell_index`
    tiers: [Vec<Option<GpuMesh>>; 3],
}

/// Position of cell `(col, row)` in a tier's mesh list
fn cell_index(col: u32, row: u32) -> usize {
    (col * GRID_CELLS + row) as usize
}

impl GpuChunkGrid {
    pub fn upload(device: &wgpu::Device, label: &str, grid: &ChunkGrid) -> Self {
        let cell_count = (GRID_CELLS * GRID_CELLS) as usize;
        let mut tiers: [Vec<Option<GpuMesh>>; 3] =
            std::array::from_fn(|_| std::iter::repeat_with(|| None).take(cell_count).collect());

        let mut uploaded = 0;
        for cell in grid.cells() {
            for (tier, mesh) in cell.meshes() {
                let name = format!("{} {}x{} {}", label, cell.col, cell.row, tier.name());
                tiers[tier as usize][cell_index(cell.col, cell.row)] =
                    Some(GpuMesh::upload(device, &name, mesh));
                uploaded += 1;
            }
        }
        log::debug!("Uploaded {} '{}' chunk meshes", uploaded, label);

        Self {
            layout: grid.layout(),
            tiers,
        }
    }

    pub fn layout(&self) -> ChunkLayout {
        self.layout
    }

    fn get(&self, lod: CellLod) -> Option<&GpuMesh> {
        self.tiers[lod.tier as usize]
            .get(cell_index(lod.col, lod.row))?
            .as_ref()
    }

    /// One mesh per cell, at the tier chosen for a camera at world `(x, z)`
    pub fn visible(&self, cam_x: f32, cam_z: f32) -> impl Iterator<Item = &GpuMesh> + '_ {
        self.layout
            .select(cam_x, cam_z)
            .filter_map(move |lod| self.get(lod))
    }

    /// Every cell at a fixed tier
    pub fn at_tier(&self, tier: LodTier) -> impl Iterator<Item = &GpuMesh> + '_ {
        self.tiers[tier as usize].iter().flatten()
    }
}
