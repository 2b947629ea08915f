//! The contract between the engine and problem-specific solutions.

use rand::Rng;

/// A candidate solution in the population.
///
/// The engine only ever calls these three operations. Everything else
/// about the representation (encoding, validity rules, the problem data it
/// scores against) belongs to the implementer.
///
/// Higher fitness is better.
///
/// # Thread Safety
///
/// Individuals move into worker threads for mutation and breeding, and may
/// be scored in parallel with rayon, hence `Send + Sync + 'static`. `Clone`
/// is needed because a parent can take part in several breeding pairs of
/// the same generation.
///
/// # Implementing
///
/// ```ignore
/// #[derive(Clone)]
/// struct Placement {
///     bits: Vec<bool>,
/// }
///
/// impl Individual for Placement {
///     fn fitness(&self) -> f64 {
///         self.bits.iter().filter(|&&b| b).count() as f64 / self.bits.len() as f64
///     }
///
///     fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
///         let i = rng.random_range(0..self.bits.len());
///         self.bits[i] = !self.bits[i];
///     }
///
///     fn breed<R: Rng + ?Sized>(&self, mother: &Self, rng: &mut R) -> Self {
///         let cut = rng.random_range(0..self.bits.len());
///         let mut bits = self.bits[..cut].to_vec();
///         bits.extend_from_slice(&mother.bits[cut..]);
///         Placement { bits }
///     }
/// }
/// ```
pub trait Individual: Clone + Send + Sync + 'static {
    /// Scores this individual.
    ///
    /// Must be side-effect free: the engine calls it repeatedly while
    /// sorting and expects the same answer each time for the same state.
    fn fitness(&self) -> f64;

    /// Applies a bounded random perturbation in place.
    ///
    /// May retry internally until a domain validity predicate holds, but
    /// must terminate.
    fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Produces a child from `self` (the father) and `mother`.
    ///
    /// Both parents stay usable afterwards. Argument order is preserved by
    /// the engine.
    fn breed<R: Rng + ?Sized>(&self, mother: &Self, rng: &mut R) -> Self;
}

/// Compares two fitness values so that the better one sorts first.
///
/// NaN ranks with negative infinity, below every finite value, so the
/// order stays total and NaN individuals sink to the end.
pub(crate) fn descending(a: f64, b: f64) -> std::cmp::Ordering {
    rank_key(b).total_cmp(&rank_key(a))
}

fn rank_key(fitness: f64) -> f64 {
    if fitness.is_nan() {
        f64::NEG_INFINITY
    } else {
        fitness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_descending_orders_best_first() {
        assert_eq!(descending(0.9, 0.1), Ordering::Less);
        assert_eq!(descending(0.1, 0.9), Ordering::Greater);
        assert_eq!(descending(0.5, 0.5), Ordering::Equal);
    }

    #[test]
    fn test_descending_sends_nan_last() {
        assert_eq!(descending(f64::NAN, -1e300), Ordering::Greater);
        assert_eq!(descending(-1e300, f64::NAN), Ordering::Less);
        assert_eq!(descending(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(descending(f64::NAN, f64::NEG_INFINITY), Ordering::Equal);
    }
}
