use std::f64::consts::PI;

use rand::Rng;

/// Pick a uniformly random element, or `None` when the slice is empty.
pub fn sample_uniform<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    Some(&items[rng.gen_range(0..items.len())])
}

/// Pick an element biased toward the start of the slice.
///
/// Draws `b = sin(u * π/2)²` for uniform `u`, folds it into `[0, 0.5]` and
/// scales the result back over the full index range, which concentrates
/// selections near index 0. Used to simulate "most requests hit a small
/// popular pool".
pub fn sample_skewed<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let beta = (rng.gen::<f64>() * PI / 2.0).sin().powi(2);
    let folded = if beta < 0.5 { 2.0 * beta } else { 2.0 * (1.0 - beta) };
    let idx = (folded * items.len() as f64) as usize;
    // folded can reach exactly 1.0, which would index one past the end
    Some(&items[idx.min(items.len() - 1)])
}

/// A random integer in `[0, bound)`. Returns 0 when `bound` is 0.
pub fn random_below<R: Rng + ?Sized>(rng: &mut R, bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    rng.gen_range(0..bound)
}

/// True with probability `p` (clamped to `[0, 1]`).
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen_bool(p.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_returns_member() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = vec!["a", "b", "c", "d"];
        for _ in 0..1000 {
            let picked = sample_uniform(&mut rng, &items).unwrap();
            assert!(items.contains(picked));
        }
    }

    #[test]
    fn uniform_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(7);
        let items: Vec<u32> = vec![];
        assert!(sample_uniform(&mut rng, &items).is_none());
        assert!(sample_skewed(&mut rng, &items).is_none());
    }

    #[test]
    fn uniform_frequencies_are_balanced() {
        let mut rng = StdRng::seed_from_u64(42);
        let items: Vec<usize> = (0..10).collect();
        let mut counts = [0u32; 10];
        let draws = 100_000;
        for _ in 0..draws {
            counts[*sample_uniform(&mut rng, &items).unwrap()] += 1;
        }
        let expected = draws as f64 / 10.0;
        for &c in &counts {
            // within 10% of the expected bucket size
            assert!((c as f64 - expected).abs() < expected * 0.1, "counts: {counts:?}");
        }
    }

    #[test]
    fn skewed_concentrates_on_low_indices() {
        let mut rng = StdRng::seed_from_u64(11);
        let items: Vec<usize> = (0..100).collect();
        let draws = 50_000;
        let mut sum: u64 = 0;
        for _ in 0..draws {
            sum += *sample_skewed(&mut rng, &items).unwrap() as u64;
        }
        let mean = sum as f64 / draws as f64;
        assert!(mean < 50.0, "mean index {mean} not skewed low");
    }

    #[test]
    fn skewed_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = vec![1, 2, 3];
        for _ in 0..10_000 {
            assert!(items.contains(sample_skewed(&mut rng, &items).unwrap()));
        }
    }

    #[test]
    fn random_below_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(random_below(&mut rng, 0), 0);
        for _ in 0..1000 {
            assert!(random_below(&mut rng, 20) < 20);
        }
    }

    #[test]
    fn chance_extremes() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            assert!(!chance(&mut rng, 0.0));
            assert!(chance(&mut rng, 1.0));
        }
    }
}
