use std::f32::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn mean(data: &[f64]) -> f64 {
    data.iter().fold(0.0, |acc, x| acc + x) / (data.len() as f64)
}

/// Wraps an angle into `[-pi, pi)`.
pub fn angle_normalise(x: f32) -> f32 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

/// Builds an environment generator, falling back to entropy without a seed.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Draws each coordinate uniformly from `[lows[i], highs[i])`.
///
/// Both slices must have the same length; the shorter one bounds the output.
pub fn generate_random_vector<R: Rng>(rng: &mut R, lows: &[f32], highs: &[f32]) -> Vec<f32> {
    lows.iter()
        .zip(highs.iter())
        .map(|(&low, &high)| low + rng.gen::<f32>() * (high - low))
        .collect()
}

#[cfg(test)]
mod test {
    use std::f32::consts::PI;

    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use rand::Rng;

    use super::{angle_normalise, generate_random_vector, mean, seeded_rng};

    #[test]
    fn test_mean() {
        let v = [0.0, 1.0, 2.0];

        assert_eq!(mean(&v), 1.0);

        let v = [];

        assert!(mean(&v).is_nan());
    }

    #[test]
    fn test_angle_normalise() {
        assert_approx_eq!(angle_normalise(0.5), 0.5);
        assert_approx_eq!(angle_normalise(2.0 * PI + 0.5), 0.5, 1e-5);
        assert_approx_eq!(angle_normalise(-2.0 * PI - 0.5), -0.5, 1e-5);
        assert!(angle_normalise(PI) < PI);
    }

    #[test]
    fn test_random_vector_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let v = generate_random_vector(&mut rng, &[-0.05; 4], &[0.05; 4]);
            assert_eq!(v.len(), 4);
            assert!(v.iter().all(|x| (-0.05..=0.05).contains(x)));
        }
    }

    #[test]
    fn test_seeded_rng_repeats() {
        let mut a = seeded_rng(Some(7));
        let mut b = seeded_rng(Some(7));

        for _ in 0..4 {
            assert_eq!(a.gen::<u32>(), b.gen::<u32>());
        }
    }
}
