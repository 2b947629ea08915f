//! Evolution configuration.
//!
//! [`EvolutionConfig`] holds every parameter of the generational loop and
//! the worker pools it drives.

use crate::error::{EvolveError, Result};

/// Configuration for the evolution engine.
///
/// # Defaults
///
/// ```
/// use u_evolve::evolve::EvolutionConfig;
///
/// let config = EvolutionConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.epochs, 100);
/// assert!((config.threshold - 0.9).abs() < 1e-12);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_evolve::evolve::EvolutionConfig;
///
/// let config = EvolutionConfig::default()
///     .with_population_size(40)
///     .with_retain(0.25)
///     .with_mutate_rate(0.1)
///     .with_workers(4)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionConfig {
    /// Number of individuals in every generation (N).
    pub population_size: usize,

    /// Stop as soon as the best fitness reaches this value. Range (0, 1].
    pub threshold: f64,

    /// Maximum number of generations.
    pub epochs: usize,

    /// Fraction of the sorted population kept as parents purely by rank.
    pub retain: f64,

    /// Probability that a non-retained individual is promoted to parent
    /// anyway, for diversity.
    pub random_select: f64,

    /// Per-parent probability of being sent to the mutation pool.
    pub mutate_rate: f64,

    /// Worker threads per phase. Defaults to the number of logical CPUs.
    pub workers: usize,

    /// Whether fitness keys are computed with rayon when sorting.
    ///
    /// Has no effect without the `parallel` feature.
    pub parallel_fitness: bool,

    /// Seed for the engine's random draws. `None` picks a random seed.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            threshold: 0.9,
            epochs: 100,
            retain: 0.2,
            random_select: 0.05,
            mutate_rate: 0.01,
            workers: num_cpus::get(),
            parallel_fitness: true,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the stopping threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_epochs(mut self, n: usize) -> Self {
        self.epochs = n;
        self
    }

    /// Sets the retain fraction.
    pub fn with_retain(mut self, ratio: f64) -> Self {
        self.retain = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the diversity-injection probability.
    pub fn with_random_select(mut self, p: f64) -> Self {
        self.random_select = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutate_rate(mut self, rate: f64) -> Self {
        self.mutate_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the number of workers per phase.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Enables or disables parallel fitness scoring.
    pub fn with_parallel_fitness(mut self, parallel: bool) -> Self {
        self.parallel_fitness = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of parents kept by rank each generation: `floor(N * retain)`.
    pub fn retained_count(&self) -> usize {
        (self.population_size as f64 * self.retain) as usize
    }

    /// Validates the configuration.
    ///
    /// Rates are checked even though the builders clamp them, since the
    /// fields are public.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(EvolveError::config("population_size must be at least 2"));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(EvolveError::config(format!(
                "threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        if self.epochs == 0 {
            return Err(EvolveError::config("epochs must be at least 1"));
        }
        for (name, value) in [
            ("retain", self.retain),
            ("random_select", self.random_select),
            ("mutate_rate", self.mutate_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EvolveError::config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if self.workers == 0 {
            return Err(EvolveError::config("workers must be at least 1"));
        }
        let retained = self.retained_count();
        if retained < self.population_size && retained < 2 {
            return Err(EvolveError::config(format!(
                "retain {} keeps {} of {} individuals; breeding needs at least 2 parents",
                self.retain, retained, self.population_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvolutionConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.epochs, 100);
        assert!((config.threshold - 0.9).abs() < 1e-12);
        assert!((config.retain - 0.2).abs() < 1e-12);
        assert!((config.random_select - 0.05).abs() < 1e-12);
        assert!((config.mutate_rate - 0.01).abs() < 1e-12);
        assert_eq!(config.workers, num_cpus::get());
        assert!(config.workers >= 1);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EvolutionConfig::default()
            .with_population_size(30)
            .with_threshold(0.75)
            .with_epochs(12)
            .with_retain(0.3)
            .with_random_select(0.1)
            .with_mutate_rate(0.2)
            .with_workers(3)
            .with_parallel_fitness(false)
            .with_seed(42);

        assert_eq!(config.population_size, 30);
        assert!((config.threshold - 0.75).abs() < 1e-12);
        assert_eq!(config.epochs, 12);
        assert!((config.retain - 0.3).abs() < 1e-12);
        assert!((config.random_select - 0.1).abs() < 1e-12);
        assert!((config.mutate_rate - 0.2).abs() < 1e-12);
        assert_eq!(config.workers, 3);
        assert!(!config.parallel_fitness);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_validate_ok() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_clamp_rates() {
        let config = EvolutionConfig::default()
            .with_retain(1.5)
            .with_random_select(-0.5)
            .with_mutate_rate(2.0);
        assert!((config.retain - 1.0).abs() < 1e-12);
        assert!((config.random_select - 0.0).abs() < 1e-12);
        assert!((config.mutate_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = EvolutionConfig::default().with_population_size(1);
        assert!(matches!(config.validate(), Err(EvolveError::Config(_))));
    }

    #[test]
    fn test_validate_threshold_range() {
        for t in [0.0, -0.1, 1.01, f64::NAN] {
            let config = EvolutionConfig::default().with_threshold(t);
            assert!(config.validate().is_err(), "threshold {t} accepted");
        }
        assert!(EvolutionConfig::default().with_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_zero_epochs() {
        let config = EvolutionConfig::default().with_epochs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_workers() {
        let config = EvolutionConfig::default().with_workers(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rate_set_directly() {
        let mut config = EvolutionConfig::default();
        config.mutate_rate = 1.2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mutate_rate"), "{err}");
    }

    #[test]
    fn test_validate_too_few_parents() {
        // 5 * 0.2 = 1 parent: no distinct pair can be formed.
        let config = EvolutionConfig::default()
            .with_population_size(5)
            .with_retain(0.2);
        assert!(config.validate().is_err());

        let config = EvolutionConfig::default()
            .with_population_size(10)
            .with_retain(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_full_retain_needs_no_breeding() {
        let config = EvolutionConfig::default()
            .with_population_size(3)
            .with_retain(1.0);
        assert_eq!(config.retained_count(), 3);
        assert!(config.validate().is_ok());
    }
}
