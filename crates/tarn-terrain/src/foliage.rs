//! Procedural tree placement and low-poly tree meshes

use std::f32::consts::PI;

use crate::floor::Ground;
use crate::mesh::MeshData;
use glam::{Mat3, Mat4, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tarn_core::{FoliageSettings, Result};

/// Trunk radius of a tree segment
const TRUNK_RADIUS: f32 = 0.06;
/// Radius of the icosahedron crown at each segment tip
const CROWN_RADIUS: f32 = 0.16;
/// Trees sink this far into the ground so the trunk base is never visible
const SINK_DEPTH: f32 = 0.01;
/// Candidate draws allowed per requested tree
const ATTEMPTS_PER_TREE: u32 = 1000;

/// Ratio of the sides of an icosahedron's golden rectangles
const GOLDEN: f32 = 1.618;

/// A placed tree: world position plus its flat-shaded mesh
#[derive(Debug, Clone)]
pub struct Tree {
    pub x: f32,
    pub z: f32,
    pub mesh: MeshData,
}

impl Tree {
    /// Model transform, with the base resting on the ground
    pub fn transform(&self, ground: &Ground) -> Mat4 {
        let y = ground.height_at(self.x, self.z) - SINK_DEPTH;
        Mat4::from_translation(Vec3::new(self.x, y, self.z))
    }
}

/// Rejection-sample tree positions over the ground's extent.
///
/// Candidates whose ground height is below `min_height` are discarded.
/// Gives up after a bounded number of draws and returns what was placed.
pub fn place_trees(ground: &Ground, settings: &FoliageSettings) -> Result<Vec<Tree>> {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let half_w = ground.width() / 2.0;
    let half_l = ground.length() / 2.0;

    let wanted = settings.count as usize;
    let max_attempts = settings.count.saturating_mul(ATTEMPTS_PER_TREE);
    let mut trees = Vec::with_capacity(wanted);
    let mut attempts = 0;

    while trees.len() < wanted {
        if attempts >= max_attempts {
            log::warn!(
                "Placed only {} of {} trees after {} attempts; terrain may be mostly below {}",
                trees.len(),
                wanted,
                attempts,
                settings.min_height
            );
            break;
        }
        attempts += 1;

        let x = rng.gen_range(-half_w..half_w);
        let z = rng.gen_range(-half_l..half_l);
        if ground.height_at(x, z) < settings.min_height {
            continue;
        }

        let mesh = build_tree_mesh(
            ground.normal_at(x, z),
            settings.segment_height,
            settings.segments,
        )?;
        trees.push(Tree { x, z, mesh });
    }

    log::debug!("Placed {} trees in {} attempts", trees.len(), attempts);
    Ok(trees)
}

/// Frame that leans a tree halfway between the ground normal and straight up.
/// Columns are (tangent, normal, bitangent), so local `y` follows the lean.
///
/// The bitangent is `t x n` rather than `n x t`: with these column positions
/// only that order gives a right-handed frame (determinant +1). The other
/// order mirrors the mesh and turns every trunk and crown face inward.
pub fn lean_frame(ground_normal: Vec3) -> Mat3 {
    let n = ground_normal.lerp(Vec3::Y, 0.5).normalize_or(Vec3::Y);
    let tangent = Vec3::new(-n.y, n.x, 0.0).normalize_or(Vec3::X);
    let bitangent = tangent.cross(n);
    Mat3::from_cols(tangent, n, bitangent)
}

/// Hexagonal trunk segments with an icosahedron crown at each segment tip
pub fn build_tree_mesh(ground_normal: Vec3, segment_height: f32, segments: u32) -> Result<MeshData> {
    let frame = lean_frame(ground_normal);
    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for j in 0..segments {
        let y0 = j as f32 * segment_height;
        let y1 = (j + 1) as f32 * segment_height;

        for i in 0..6 {
            let angle = i as f32 * PI / 3.0;
            let next = (i + 1) as f32 * PI / 3.0;
            let ring = |a: f32, y: f32| Vec3::new(a.cos() * TRUNK_RADIUS, y, a.sin() * TRUNK_RADIUS);

            let base = positions.len() as u32;
            for p in [ring(angle, y0), ring(angle, y1), ring(next, y1), ring(next, y0)] {
                positions.push((frame * p).to_array());
            }
            uvs.extend_from_slice(&[[0.0, 0.0], [0.0, 0.1], [0.1, 0.1], [0.1, 0.0]]);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let tip = frame * Vec3::new(0.0, y1, 0.0);
        add_icosahedron(&mut positions, &mut uvs, &mut indices, tip, CROWN_RADIUS);
    }

    MeshData::build(&positions, &uvs, &indices, true, None)
}

/// Regular icosahedron built from three orthogonal golden rectangles
pub fn add_icosahedron(
    positions: &mut Vec<[f32; 3]>,
    uvs: &mut Vec<[f32; 2]>,
    indices: &mut Vec<u32>,
    center: Vec3,
    radius: f32,
) {
    let norm = (GOLDEN * GOLDEN + 1.0).sqrt();
    let c = GOLDEN / norm * radius;
    let a = 1.0 / norm * radius;

    let base = positions.len() as u32;
    let corners = [
        // xz rectangle
        Vec3::new(a, 0.0, c),
        Vec3::new(-a, 0.0, c),
        Vec3::new(-a, 0.0, -c),
        Vec3::new(a, 0.0, -c),
        // yz rectangle
        Vec3::new(0.0, c, a),
        Vec3::new(0.0, c, -a),
        Vec3::new(0.0, -c, -a),
        Vec3::new(0.0, -c, a),
        // xy rectangle
        Vec3::new(c, a, 0.0),
        Vec3::new(c, -a, 0.0),
        Vec3::new(-c, -a, 0.0),
        Vec3::new(-c, a, 0.0),
    ];
    for p in corners {
        positions.push((center + p).to_array());
    }
    for _ in 0..3 {
        uvs.extend_from_slice(&[[0.9, 0.9], [0.9, 1.0], [1.0, 1.0], [1.0, 0.9]]);
    }

    const FACES: [[u32; 3]; 20] = [
        // across the short edges of each rectangle
        [1, 0, 4],
        [0, 1, 7],
        [3, 2, 5],
        [2, 3, 6],
        [5, 4, 8],
        [4, 5, 11],
        [7, 6, 9],
        [6, 7, 10],
        [9, 8, 0],
        [8, 9, 3],
        [11, 10, 1],
        [10, 11, 2],
        // one per octant
        [4, 0, 8],
        [3, 5, 8],
        [0, 7, 9],
        [1, 4, 11],
        [7, 1, 10],
        [5, 2, 11],
        [6, 3, 9],
        [2, 6, 10],
    ];
    for face in FACES {
        indices.extend(face.iter().map(|i| base + i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_core::TerrainSettings;

    fn ground() -> Ground {
        Ground::new(&TerrainSettings::default())
    }

    fn icosahedron(radius: f32) -> MeshData {
        let (mut p, mut uv, mut idx) = (Vec::new(), Vec::new(), Vec::new());
        add_icosahedron(&mut p, &mut uv, &mut idx, Vec3::ZERO, radius);
        MeshData::build(&p, &uv, &idx, true, None).unwrap()
    }

    #[test]
    fn icosahedron_is_regular() {
        let (mut p, mut uv, mut idx) = (Vec::new(), Vec::new(), Vec::new());
        add_icosahedron(&mut p, &mut uv, &mut idx, Vec3::ZERO, 0.16);
        assert_eq!(p.len(), 12);
        assert_eq!(uv.len(), 12);
        assert_eq!(idx.len(), 60);

        for v in &p {
            assert!((Vec3::from(*v).length() - 0.16).abs() < 1e-5);
        }

        let edge = |t: &[u32]| Vec3::from(p[t[0] as usize]).distance(Vec3::from(p[t[1] as usize]));
        let first = edge(&idx[0..2]);
        for t in idx.chunks_exact(3) {
            for pair in [[t[0], t[1]], [t[1], t[2]], [t[2], t[0]]] {
                assert!((edge(&pair) - first).abs() < 1e-3 * first);
            }
        }
    }

    #[test]
    fn icosahedron_faces_point_outward() {
        let mesh = icosahedron(1.0);
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(Vec3::from(*p).dot(Vec3::from(*n)) > 0.0);
        }
    }

    #[test]
    fn icosahedron_frames_have_no_nan() {
        let mesh = icosahedron(0.16);
        for stream in [&mesh.normals, &mesh.tangents, &mesh.bitangents] {
            for v in stream {
                let v = Vec3::from(*v);
                assert!(v.is_finite());
                assert!((v.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn lean_frame_is_orthonormal() {
        for n in [Vec3::Y, Vec3::new(0.3, 0.9, -0.2).normalize(), Vec3::new(-0.6, 0.5, 0.6).normalize()] {
            let m = lean_frame(n);
            let (t, up, b) = (m.x_axis, m.y_axis, m.z_axis);
            for v in [t, up, b] {
                assert!((v.length() - 1.0).abs() < 1e-5);
            }
            assert!(t.dot(up).abs() < 1e-5);
            assert!(t.dot(b).abs() < 1e-5);
            assert!(up.dot(b).abs() < 1e-5);
            // Halfway between the ground normal and +Y
            assert!(up.y >= n.y - 1e-5);
            // A rotation, so triangle winding survives the lean
            assert!((m.determinant() - 1.0).abs() < 1e-5);
            assert!((b - t.cross(up)).length() < 1e-5);
        }
    }

    #[test]
    fn upright_tree_has_expected_shape() {
        let mesh = build_tree_mesh(Vec3::Y, 0.6, 1).unwrap();
        // 6 quads plus 20 crown faces, all flat shaded
        assert_eq!(mesh.vertex_count(), (6 * 6 + 20 * 3) as usize);
        let (min, max) = mesh.bounds().unwrap();
        assert!(min[1].abs() < 1e-5);
        assert!((max[1] - (0.6 + 0.16 * GOLDEN / (GOLDEN * GOLDEN + 1.0).sqrt())).abs() < 1e-4);
    }

    #[test]
    fn leaning_tree_faces_point_outward() {
        let normal = Vec3::new(0.6, 0.7, -0.3).normalize();
        let mesh = build_tree_mesh(normal, 0.6, 1).unwrap();
        let frame = lean_frame(normal);
        let axis = frame.y_axis;
        // Trunk: away from the leaning axis
        for k in 0..36 {
            let p = Vec3::from(mesh.positions[k]);
            let radial = p - axis * p.dot(axis);
            assert!(radial.dot(Vec3::from(mesh.normals[k])) > 0.0);
        }
        // Crown: away from the segment tip
        let tip = frame * Vec3::new(0.0, 0.6, 0.0);
        for k in 36..mesh.vertex_count() {
            let p = Vec3::from(mesh.positions[k]);
            assert!((p - tip).dot(Vec3::from(mesh.normals[k])) > 0.0);
        }
    }

    #[test]
    fn trunk_faces_point_outward() {
        let mesh = build_tree_mesh(Vec3::Y, 0.6, 2).unwrap();
        // First 36 vertices belong to the trunk of the first segment
        for k in 0..36 {
            let p = Vec3::from(mesh.positions[k]);
            let n = Vec3::from(mesh.normals[k]);
            assert!(Vec3::new(p.x, 0.0, p.z).dot(n) > 0.0);
        }
    }

    #[test]
    fn trees_respect_height_threshold() {
        let ground = ground();
        let settings = FoliageSettings {
            count: 1000,
            segments: 1,
            ..Default::default()
        };
        let trees = place_trees(&ground, &settings).unwrap();
        assert!(!trees.is_empty());
        for tree in &trees {
            assert!(ground.height_at(tree.x, tree.z) >= settings.min_height);
            assert!(tree.x.abs() <= 5.0 && tree.z.abs() <= 5.0);
        }
    }

    #[test]
    fn placement_is_seeded() {
        let ground = ground();
        let settings = FoliageSettings::default();
        let a = place_trees(&ground, &settings).unwrap();
        let b = place_trees(&ground, &settings).unwrap();
        let coords = |t: &[Tree]| t.iter().map(|t| (t.x, t.z)).collect::<Vec<_>>();
        assert_eq!(coords(&a), coords(&b));
    }

    #[test]
    fn unreachable_threshold_gives_up() {
        let settings = FoliageSettings {
            count: 2,
            min_height: 10.0,
            ..Default::default()
        };
        let trees = place_trees(&ground(), &settings).unwrap();
        assert!(trees.is_empty());
    }

    #[test]
    fn tree_sits_just_below_ground() {
        let ground = ground();
        let tree = Tree {
            x: 1.0,
            z: -2.0,
            mesh: MeshData::default(),
        };
        let pos = tree.transform(&ground).w_axis;
        assert!((pos.y - (ground.height_at(1.0, -2.0) - SINK_DEPTH)).abs() < 1e-6);
    }
}
