use std::f64::consts::TAU;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Lattice size of the permutation and gradient tables.
pub const NOISE_PERIOD: usize = 32;

/// Seeded, tileable 2D gradient noise.
///
/// Gradients are `NOISE_PERIOD` unit vectors at evenly spaced angles; the
/// permutation table is a Fisher-Yates shuffle of `0..NOISE_PERIOD`.
#[derive(Debug, Clone)]
pub struct NoiseField {
    permutations: [usize; NOISE_PERIOD],
    gradients: [(f64, f64); NOISE_PERIOD],
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut permutations: [usize; NOISE_PERIOD] = std::array::from_fn(|i| i);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        permutations.shuffle(&mut rng);

        let gradients = std::array::from_fn(|i| {
            let angle = (i + 1) as f64 * TAU / NOISE_PERIOD as f64;
            (angle.cos(), angle.sin())
        });

        Self {
            permutations,
            gradients,
        }
    }

    /// Noise that repeats every `NOISE_PERIOD` units on both axes.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.sample_periodic(x, y, NOISE_PERIOD as i64)
    }

    /// Noise that repeats every `period` lattice units on both axes.
    pub fn sample_periodic(&self, x: f64, y: f64, period: i64) -> f64 {
        let period = period.max(1);
        let gx = x.floor() as i64;
        let gy = y.floor() as i64;

        self.surflet(x, y, gx, gy, period)
            + self.surflet(x, y, gx + 1, gy, period)
            + self.surflet(x, y, gx, gy + 1, period)
            + self.surflet(x, y, gx + 1, gy + 1, period)
    }

    /// Contribution of one lattice corner.
    fn surflet(&self, x: f64, y: f64, grid_x: i64, grid_y: i64, period: i64) -> f64 {
        let dx = x - grid_x as f64;
        let dy = y - grid_y as f64;
        let falloff = falloff(dx.abs()) * falloff(dy.abs());

        let (gx, gy) = self.gradients[self.hash(grid_x, grid_y, period)];
        falloff * (dx * gx + dy * gy)
    }

    fn hash(&self, grid_x: i64, grid_y: i64, period: i64) -> usize {
        let last = NOISE_PERIOD as i64 - 1;
        let px = grid_x.rem_euclid(period).min(last) as usize;
        let index = (self.permutations[px] as i64 + grid_y.rem_euclid(period)).clamp(0, last);
        self.permutations[index as usize]
    }
}

/// `1 - 6t^5 + 15t^4 - 10t^3`: 1 at the corner, 0 one cell away.
fn falloff(t: f64) -> f64 {
    let t3 = t * t * t;
    1.0 - t3 * (t * (6.0 * t - 15.0) + 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn falloff_endpoints() {
        assert!((falloff(0.0) - 1.0).abs() < EPS);
        assert!(falloff(1.0).abs() < EPS);
        assert!((falloff(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn sample_tiles_at_noise_period() {
        let noise = NoiseField::new(7);
        let p = NOISE_PERIOD as f64;
        for i in 0..40 {
            let x = i as f64 * 0.73 + 0.11;
            let y = i as f64 * 1.37 + 0.29;
            let a = noise.sample(x, y);
            assert!((a - noise.sample(x + p, y + p)).abs() < 1e-9, "x={x} y={y}");
            assert!((a - noise.sample(x + 3.0 * p, y)).abs() < 1e-9, "x={x} y={y}");
        }
    }

    #[test]
    fn sample_periodic_tiles_at_custom_period() {
        let noise = NoiseField::new(99);
        for i in 0..25 {
            let x = i as f64 * 0.41;
            let y = i as f64 * 0.23 + 0.5;
            let a = noise.sample_periodic(x, y, 8);
            assert!((a - noise.sample_periodic(x + 8.0, y + 16.0, 8)).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_on_lattice_points() {
        let noise = NoiseField::new(1);
        for gx in -3..5 {
            for gy in -3..5 {
                assert!(noise.sample(gx as f64, gy as f64).abs() < EPS);
            }
        }
    }

    #[test]
    fn same_seed_same_field() {
        let a = NoiseField::new(42);
        let b = NoiseField::new(42);
        for i in 0..20 {
            let x = i as f64 * 0.37;
            assert_eq!(a.sample(x, x * 0.5), b.sample(x, x * 0.5));
        }
    }

    #[test]
    fn permutation_is_a_shuffle() {
        let noise = NoiseField::new(5);
        let mut sorted = noise.permutations;
        sorted.sort_unstable();
        let expected: [usize; NOISE_PERIOD] = std::array::from_fn(|i| i);
        assert_eq!(sorted, expected);
    }

    #[test]
    fn negative_and_large_inputs_stay_in_bounds() {
        let noise = NoiseField::new(3);
        for &(x, y) in &[(-1000.5, 7.25), (1e6 + 0.5, -1e6 + 0.25), (-0.001, -0.999)] {
            let v = noise.sample_periodic(x, y, 1024);
            assert!(v.is_finite());
            assert!(v.abs() < 2.0);
        }
    }
}
