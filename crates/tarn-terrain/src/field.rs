//! Octave-summed height field and finite-difference normals

use crate::noise_field::NoiseField;
use glam::{DVec3, Vec3};

/// Offset between successive octaves in noise space
const OCTAVE_OFFSET: f64 = 200.0;

/// Finite-difference parameters for normal queries.
///
/// `extent_u` and `extent_v` are the world distances spanned by one unit of
/// `u` and `v`; gradients are divided by them so the normal is correct in
/// world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalSampling {
    pub epsilon: f64,
    pub extent_u: f64,
    pub extent_v: f64,
}

impl NormalSampling {
    /// Plain UV-space differences
    pub const UNIT: Self = Self {
        epsilon: 1e-4,
        extent_u: 1.0,
        extent_v: 1.0,
    };

    /// Step sized to a fraction of a grid's UV spacing
    pub fn for_grid(tiles_x: u32, tiles_z: u32, fraction: f64, width: f64, length: f64) -> Self {
        let spacing = 1.0 / tiles_x.max(tiles_z).max(1) as f64;
        Self {
            epsilon: spacing * fraction,
            extent_u: width,
            extent_v: length,
        }
    }
}

/// Height field over normalized `(u, v)` space
#[derive(Debug, Clone, Copy)]
pub struct TerrainField {
    noise: NoiseField,
}

impl TerrainField {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: NoiseField::new(seed),
        }
    }

    /// Sum of `octaves` noise layers; octave `i` has frequency `2^i`,
    /// amplitude `2^-i` and a diagonal offset of `i * 200`.
    pub fn height(&self, u: f64, v: f64, octaves: u32) -> f64 {
        let mut sum = 0.0;
        for i in 0..octaves {
            let freq = 2f64.powi(i as i32);
            let offset = i as f64 * OCTAVE_OFFSET;
            sum += self.noise.sample(u * freq + offset, v * freq - offset) / freq;
        }
        sum
    }

    /// Surface normal using a fixed small step in UV space
    pub fn normal(&self, u: f64, v: f64, octaves: u32) -> Vec3 {
        self.normal_with(u, v, octaves, NormalSampling::UNIT)
    }

    /// Surface normal by central differences. `v` grows towards world -Z,
    /// hence the sign flip on its gradient.
    pub fn normal_with(&self, u: f64, v: f64, octaves: u32, sampling: NormalSampling) -> Vec3 {
        let e = sampling.epsilon;
        let dhdu = (self.height(u + e, v, octaves) - self.height(u - e, v, octaves))
            / (2.0 * e * sampling.extent_u);
        let dhdv = -(self.height(u, v + e, octaves) - self.height(u, v - e, octaves))
            / (2.0 * e * sampling.extent_v);

        DVec3::new(-dhdu, 1.0, -dhdv).normalize().as_vec3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> impl Iterator<Item = (f64, f64)> {
        (0..15).flat_map(|i| (0..15).map(move |j| (i as f64 / 14.0, j as f64 / 14.0)))
    }

    #[test]
    fn height_is_deterministic() {
        let a = TerrainField::new(2134);
        let b = TerrainField::new(2134);
        for (u, v) in grid_points() {
            assert_eq!(a.height(u, v, 6), b.height(u, v, 6));
        }
    }

    #[test]
    fn six_octaves_stay_within_two() {
        let field = TerrainField::new(2134);
        for (u, v) in grid_points() {
            let h = field.height(u * 40.0 - 20.0, v * 40.0 - 20.0, 6);
            assert!(h.abs() <= 2.0, "height {} exceeds bound", h);
        }
    }

    #[test]
    fn zero_octaves_is_flat() {
        let field = TerrainField::new(3);
        assert_eq!(field.height(0.3, 0.7, 0), 0.0);
        let n = field.normal(0.3, 0.7, 0);
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn truncating_octaves_is_bounded() {
        let field = TerrainField::new(77);
        for (u, v) in grid_points() {
            for (k1, k2) in [(1u32, 3u32), (2, 6), (4, 5)] {
                let bound: f64 = (k1..k2).map(|i| 2f64.powi(-(i as i32))).sum();
                let diff = (field.height(u, v, k2) - field.height(u, v, k1)).abs();
                assert!(diff <= bound + 1e-12, "diff {} > bound {}", diff, bound);
            }
        }
    }

    #[test]
    fn normals_are_unit_and_point_up() {
        let field = TerrainField::new(2134);
        let sampling = NormalSampling::for_grid(100, 100, 0.5, 10.0, 10.0);
        for (u, v) in grid_points() {
            for n in [field.normal(u, v, 6), field.normal_with(u, v, 6, sampling)] {
                assert!((n.length() - 1.0).abs() < 1e-5);
                assert!(n.y > 0.0);
                assert!(n.is_finite());
            }
        }
    }

    #[test]
    fn normal_matches_height_slope() {
        // Compare the normal's implied slope with a coarse height difference
        // along u; world x grows with u so a rising height tilts the normal to -x.
        let field = TerrainField::new(2134);
        let sampling = NormalSampling {
            epsilon: 1e-3,
            extent_u: 10.0,
            extent_v: 10.0,
        };
        let (u, v) = (0.41, 0.63);
        let n = field.normal_with(u, v, 6, sampling);
        let slope = (field.height(u + 1e-3, v, 6) - field.height(u - 1e-3, v, 6)) / (2e-3 * 10.0);
        assert!((-n.x / n.y - slope as f32).abs() < 1e-4);
    }
}
