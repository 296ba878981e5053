//! CPU-side mesh construction: flat shading, smooth normals, tangent frames

use glam::{Vec2, Vec3};
use tarn_core::{Result, TarnError};

/// A UV determinant this small relative to its two UV edges is degenerate
const UV_DETERMINANT_EPSILON: f32 = 1e-6;

/// Vertex streams ready for upload. All per-vertex vectors have the same length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    /// Triangle list, counter-clockwise front faces
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Build a mesh from raw streams.
    ///
    /// With `flat_shaded` every index gets its own vertex so each triangle
    /// is lit with its face normal. Normals are computed when `normals` is
    /// absent or doesn't match the vertex count.
    pub fn build(
        positions: &[[f32; 3]],
        uvs: &[[f32; 2]],
        indices: &[u32],
        flat_shaded: bool,
        normals: Option<&[[f32; 3]]>,
    ) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(TarnError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if uvs.len() != positions.len() {
            return Err(TarnError::InvalidMesh(format!(
                "{} uvs for {} positions",
                uvs.len(),
                positions.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(TarnError::InvalidMesh(format!(
                "index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }

        let normals = normals.filter(|n| n.len() == positions.len());

        let (positions, uvs, normals, indices) = if flat_shaded {
            let pick3 = |src: &[[f32; 3]]| -> Vec<[f32; 3]> {
                indices.iter().map(|&i| src[i as usize]).collect()
            };
            (
                pick3(positions),
                indices.iter().map(|&i| uvs[i as usize]).collect(),
                normals.map(pick3),
                (0..indices.len() as u32).collect(),
            )
        } else {
            (
                positions.to_vec(),
                uvs.to_vec(),
                normals.map(|n| n.to_vec()),
                indices.to_vec(),
            )
        };

        let normals = match normals {
            Some(n) => n,
            None => smooth_normals(&positions, &indices),
        };
        let (tangents, bitangents) = tangent_frames(&positions, &uvs, &normals, &indices);

        Ok(Self {
            positions,
            normals,
            uvs,
            tangents,
            bitangents,
            indices,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Axis-aligned bounds, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let mut iter = self.positions.iter().map(|&p| Vec3::from(p));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some((min.to_array(), max.to_array()))
    }
}

fn corners(positions: &[[f32; 3]], tri: &[u32]) -> [Vec3; 3] {
    [
        Vec3::from(positions[tri[0] as usize]),
        Vec3::from(positions[tri[1] as usize]),
        Vec3::from(positions[tri[2] as usize]),
    ]
}

/// Area-independent face normals summed onto each corner
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [v1, v2, v3] = corners(positions, tri);
        // Zero-area triangles have no direction to contribute
        let Some(n) = (v3 - v2).cross(v1 - v2).try_normalize() else {
            continue;
        };
        for &i in tri {
            acc[i as usize] += n;
        }
    }

    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

/// Per-vertex tangent and bitangent from UV gradients
fn tangent_frames(
    positions: &[[f32; 3]],
    uvs: &[[f32; 2]],
    normals: &[[f32; 3]],
    indices: &[u32],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut tan_acc = vec![Vec3::ZERO; positions.len()];
    let mut bitan_acc = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let [v1, v2, v3] = corners(positions, tri);
        if (v3 - v2).cross(v1 - v2).try_normalize().is_none() {
            continue;
        }

        let uv1 = Vec2::from(uvs[tri[0] as usize]);
        let uv2 = Vec2::from(uvs[tri[1] as usize]);
        let uv3 = Vec2::from(uvs[tri[2] as usize]);

        let edge1 = v1 - v2;
        let edge2 = v3 - v2;
        let duv1 = uv1 - uv2;
        let duv2 = uv3 - uv2;

        let det = duv1.x * duv2.y - duv1.y * duv2.x;
        if det.abs() <= UV_DETERMINANT_EPSILON * duv1.length() * duv2.length() {
            continue;
        }
        let f = 1.0 / det;

        let tangent = (f * (duv2.y * edge1 - duv1.y * edge2)).try_normalize();
        let bitangent = (f * (duv1.x * edge2 - duv2.x * edge1)).try_normalize();
        if let (Some(t), Some(b)) = (tangent, bitangent) {
            for &i in tri {
                tan_acc[i as usize] += t;
                bitan_acc[i as usize] += b;
            }
        }
    }

    let mut tangents = Vec::with_capacity(positions.len());
    let mut bitangents = Vec::with_capacity(positions.len());
    for ((t, b), n) in tan_acc.into_iter().zip(bitan_acc).zip(normals) {
        let n = Vec3::from(*n).try_normalize().unwrap_or(Vec3::Y);
        let t = t.try_normalize().unwrap_or_else(|| orthogonal_to(n));
        let b = b.try_normalize().unwrap_or_else(|| n.cross(t).normalize_or(Vec3::Z));
        tangents.push(t.to_array());
        bitangents.push(b.to_array());
    }
    (tangents, bitangents)
}

/// Some unit vector perpendicular to `n`
fn orthogonal_to(n: Vec3) -> Vec3 {
    let axis = if n.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    (axis - n * n.dot(axis)).normalize()
}
