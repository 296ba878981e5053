//! Seeded 2D noise primitive

use ::noise::{NoiseFn, Simplex};

/// Deterministic, continuous 2D noise in `[-1, 1]`
#[derive(Debug, Clone, Copy)]
pub struct NoiseField {
    simplex: Simplex,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            simplex: Simplex::new(seed),
        }
    }

    /// Sample the field at an arbitrary point.
    /// Simplex can overshoot the unit range slightly; clamping keeps the
    /// bound without breaking continuity.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        self.simplex.get([x, z]).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> impl Iterator<Item = (f64, f64)> {
        (0..200).map(|i| {
            let t = i as f64;
            (t * 0.173 - 17.0, t * -0.311 + 42.5)
        })
    }

    #[test]
    fn same_seed_same_values() {
        let a = NoiseField::new(2134);
        let b = NoiseField::new(2134);
        for (x, z) in sample_points() {
            assert_eq!(a.sample(x, z), b.sample(x, z));
        }
    }

    #[test]
    fn output_stays_in_unit_range() {
        let field = NoiseField::new(2134);
        for (x, z) in sample_points() {
            let s = field.sample(x * 13.7, z * 9.1);
            assert!((-1.0..=1.0).contains(&s), "sample {} out of range", s);
        }
    }

    #[test]
    fn nearby_points_give_nearby_values() {
        let field = NoiseField::new(99);
        for (x, z) in sample_points() {
            let d = (field.sample(x, z) - field.sample(x + 1e-6, z)).abs();
            assert!(d < 1e-3, "jump of {} at ({}, {})", d, x, z);
        }
    }

    #[test]
    fn seeds_change_the_field() {
        let a = NoiseField::new(1);
        let b = NoiseField::new(2);
        assert!(sample_points().any(|(x, z)| a.sample(x, z) != b.sample(x, z)));
    }

    #[test]
    fn handles_large_and_negative_inputs() {
        let field = NoiseField::new(5);
        for &(x, z) in &[(-1.0e6, 3.5), (1.0e7, -2.0e7), (-0.5, -0.5)] {
            assert!(field.sample(x, z).is_finite());
        }
    }
}
