use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

/// Source of the uniform draws behind every probability trial and weighted draw.
///
/// Every generator receives its own source, so concurrent sessions share no
/// random state. Any [`RngCore`] is a source; tests substitute
/// [`ForcedDecision`] or [`ConstantDraw`] to pin outcomes.
pub trait RandomSource {
    /// Returns a uniform draw from `[0, 1)`.
    ///
    /// # Returns
    /// A value `u` with `0.0 <= u < 1.0`. Every other method of the trait is
    /// derived from this draw unless overridden.
    fn next_unit(&mut self) -> f64;

    /// One Bernoulli trial: `true` iff a fresh draw is below `probability`.
    ///
    /// Total for every input; probabilities at or below zero (and NaN) never
    /// succeed, probabilities at or above one always do.
    fn decide_with_probability(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// A draw from `[0, upper)`.
    ///
    /// # Arguments
    /// * `upper`: Exclusive upper bound, normally a finite positive total weight.
    fn next_below(&mut self, upper: f64) -> f64 {
        self.next_unit() * upper
    }
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Seeded source used for reproducible runs.
pub fn seeded_source(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Answers every trial with the same outcome; draws return `0.0`.
///
/// Substituted for a real generator to make pool generation deterministic.
#[derive(Debug, Clone, Copy)]
pub struct ForcedDecision(pub bool);

impl RandomSource for ForcedDecision {
    fn next_unit(&mut self) -> f64 {
        0.0
    }

    fn decide_with_probability(&mut self, _probability: f64) -> bool {
        self.0
    }
}

/// Returns the same unit draw every time. Values outside `[0, 1)` are clamped.
///
/// Substituted for a real generator to pin weighted draws to one point of the
/// cumulative distribution.
#[derive(Debug, Clone, Copy)]
pub struct ConstantDraw(pub f64);

impl RandomSource for ConstantDraw {
    fn next_unit(&mut self) -> f64 {
        if self.0.is_nan() {
            return 0.0;
        }
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_draws_stay_in_unit_interval() {
        let mut rng = seeded_source(7);
        for _ in 0..10_000 {
            let u = rng.next_unit();
            assert!((0.0..1.0).contains(&u), "Draw {} out of [0, 1)", u);
        }
    }

    #[test]
    fn trial_extremes_are_deterministic() {
        let mut rng = seeded_source(11);
        for _ in 0..1_000 {
            assert!(rng.decide_with_probability(1.0));
            assert!(!rng.decide_with_probability(0.0));
            assert!(!rng.decide_with_probability(f64::NAN));
        }
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let mut a = seeded_source(42);
        let mut b = seeded_source(42);
        for _ in 0..100 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
    }

    #[test]
    fn forced_and_constant_sources_pin_outcomes() {
        let mut yes = ForcedDecision(true);
        assert!(yes.decide_with_probability(0.0));
        let mut no = ForcedDecision(false);
        assert!(!no.decide_with_probability(1.0));

        let mut half = ConstantDraw(0.5);
        assert!(half.decide_with_probability(0.6));
        assert!(!half.decide_with_probability(0.5));
        assert_eq!(half.next_below(10.0), 5.0);
        assert!(ConstantDraw(1.0).next_unit() < 1.0);
    }

    #[test]
    fn dyn_rng_core_is_a_random_source() {
        let mut rng = seeded_source(3);
        let dyn_rng: &mut dyn RngCore = &mut rng;
        let u = dyn_rng.next_unit();
        assert!((0.0..1.0).contains(&u));
    }
}
