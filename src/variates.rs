//! Random variate sources.
//!
//! The model never touches a random-number generator directly: every duration it needs comes from a
//! [`VariateSource`]. [`RandomVariates`] draws from a seeded PCG stream for real runs, and [`ScriptedVariates`]
//! replays fixed values so that a scenario can be checked by hand.

use rand::distr::Uniform;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;

use std::collections::VecDeque;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Supplier of the random durations a model consumes.
///
/// Invalid parameters (a non-positive mean, `high < low`) produce NaN rather than panicking; the checkpoint model
/// rejects NaN durations with [`Error::BadExecution`].
///
/// [`Error::BadExecution`]: crate::Error::BadExecution
pub trait VariateSource {
    /// Draw from an exponential distribution with the given mean.
    fn exponential(&mut self, mean: f64) -> f64;

    /// Draw uniformly from the closed interval `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Variates drawn from a seeded [`Pcg64`] stream.
#[derive(Debug, Clone)]
pub struct RandomVariates {
    rng: Pcg64,
}

impl RandomVariates {
    pub fn new(rng: Pcg64) -> Self {
        Self { rng }
    }

    /// The same seed always produces the same stream.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self::new(Pcg64::seed_from_u64(seed))
    }

    /// Derive the stream for one replication from the experiment's master seed.
    ///
    /// Consecutive replication indices are spread across the seed space, so replications are independent of each
    /// other and of how many replications are run.
    pub fn for_replication(master_seed: u64, replication: usize) -> Self {
        let seed = master_seed ^ (replication as u64 + 1).wrapping_mul(MIXING_CONSTANT);
        Self::seed_from_u64(seed)
    }
}

impl VariateSource for RandomVariates {
    fn exponential(&mut self, mean: f64) -> f64 {
        match Exp::new(1.0 / mean) {
            Ok(distribution) if mean > 0.0 => distribution.sample(&mut self.rng),
            _ => f64::NAN,
        }
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        match Uniform::new_inclusive(low, high) {
            Ok(distribution) => distribution.sample(&mut self.rng),
            Err(_) => f64::NAN,
        }
    }
}

/// Replays fixed sequences of values, ignoring the requested distribution parameters.
///
/// Each sequence repeats its final value once exhausted; an empty sequence yields `0.0`. Exponential and uniform
/// draws are consumed independently, in the order the model asks for them.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVariates {
    exponential: Script,
    uniform: Script,
}

impl ScriptedVariates {
    pub fn new<E, U>(exponential: E, uniform: U) -> Self
    where
        E: IntoIterator<Item = f64>,
        U: IntoIterator<Item = f64>,
    {
        Self {
            exponential: Script::new(exponential),
            uniform: Script::new(uniform),
        }
    }

    /// Every exponential draw returns `exponential` and every uniform draw returns `uniform`.
    pub fn constant(exponential: f64, uniform: f64) -> Self {
        Self::new([exponential], [uniform])
    }

    /// Number of exponential draws taken so far.
    pub fn exponential_draws(&self) -> usize {
        self.exponential.draws
    }

    /// Number of uniform draws taken so far.
    pub fn uniform_draws(&self) -> usize {
        self.uniform.draws
    }
}

impl VariateSource for ScriptedVariates {
    fn exponential(&mut self, _mean: f64) -> f64 {
        self.exponential.next_value()
    }

    fn uniform(&mut self, _low: f64, _high: f64) -> f64 {
        self.uniform.next_value()
    }
}

#[derive(Debug, Clone, Default)]
struct Script {
    remaining: VecDeque<f64>,
    last: f64,
    draws: usize,
}

impl Script {
    fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            remaining: values.into_iter().collect(),
            last: 0.0,
            draws: 0,
        }
    }

    fn next_value(&mut self) -> f64 {
        self.draws += 1;
        if let Some(value) = self.remaining.pop_front() {
            self.last = value;
        }
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandomVariates::seed_from_u64(123);
        let mut b = RandomVariates::seed_from_u64(123);
        for _ in 0..100 {
            assert_eq!(a.exponential(0.75).to_bits(), b.exponential(0.75).to_bits());
            assert_eq!(a.uniform(0.5, 1.0).to_bits(), b.uniform(0.5, 1.0).to_bits());
        }
    }

    #[test]
    fn wrapping_a_generator_matches_seeding_directly() {
        let mut wrapped = RandomVariates::new(Pcg64::seed_from_u64(5));
        let mut seeded = RandomVariates::seed_from_u64(5);
        assert_eq!(wrapped.uniform(0.0, 1.0).to_bits(), seeded.uniform(0.0, 1.0).to_bits());
    }

    #[test]
    fn replication_streams_differ() {
        let mut first = RandomVariates::for_replication(123, 0);
        let mut second = RandomVariates::for_replication(123, 1);
        assert_ne!(first.exponential(1.0), second.exponential(1.0));
    }

    #[test]
    fn uniform_draws_stay_in_bounds() {
        let mut variates = RandomVariates::seed_from_u64(7);
        for _ in 0..1_000 {
            let value = variates.uniform(0.5, 1.0);
            assert!((0.5..=1.0).contains(&value), "draw {value} escaped [0.5, 1.0]");
        }
    }

    #[test]
    fn exponential_mean_is_close() {
        let mut variates = RandomVariates::seed_from_u64(99);
        let samples = 200_000;
        let mean = (0..samples).map(|_| variates.exponential(0.75)).sum::<f64>() / samples as f64;
        assert!((mean - 0.75).abs() < 0.01, "sample mean {mean} too far from 0.75");
    }

    #[test]
    fn invalid_parameters_produce_nan() {
        let mut variates = RandomVariates::seed_from_u64(1);
        assert!(variates.exponential(0.0).is_nan());
        assert!(variates.exponential(-2.0).is_nan());
        assert!(variates.uniform(1.0, 0.5).is_nan());
    }

    #[test]
    fn scripts_repeat_their_last_value() {
        let mut variates = ScriptedVariates::new([1.0, 2.0], []);
        assert_eq!(1.0, variates.exponential(9.0));
        assert_eq!(2.0, variates.exponential(9.0));
        assert_eq!(2.0, variates.exponential(9.0));
        assert_eq!(0.0, variates.uniform(3.0, 4.0), "empty script should yield zero");
        assert_eq!(3, variates.exponential_draws());
        assert_eq!(1, variates.uniform_draws());
    }
}
