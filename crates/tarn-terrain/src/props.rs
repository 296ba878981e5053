//! Small scene props

use crate::mesh::MeshData;
use glam::{Mat4, Quat, Vec3};
use tarn_core::Result;

/// Unit cube centred on the origin, one flat-shaded quad per face
pub fn cube_mesh() -> Result<MeshData> {
    // (outward normal, u axis, v axis) with u x v == normal
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let centre = normal * 0.5;
        let base = positions.len() as u32;
        for (du, dv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            positions.push((centre + u * du + v * dv).to_array());
            uvs.push([du + 0.5, dv + 0.5]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData::build(&positions, &uvs, &indices, true, None)
}

/// Spinning marker cube
#[derive(Debug, Clone)]
pub struct MarkerCube {
    pub position: Vec3,
    pub scale: f32,
    pub mesh: MeshData,
}

impl MarkerCube {
    pub fn new(position: Vec3, scale: f32) -> Result<Self> {
        Ok(Self {
            position,
            scale,
            mesh: cube_mesh()?,
        })
    }

    /// Model transform after spinning `angle` radians about +Y
    pub fn transform(&self, angle: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(angle),
            self.position,
        )
    }
}
