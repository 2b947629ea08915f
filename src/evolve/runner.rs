//! Generational loop execution.
//!
//! [`EvolutionRunner`] seeds a population, then evolves it until the best
//! fitness reaches the threshold, the epoch budget is spent, or the
//! caller's cancellation flag is raised.

use super::config::EvolutionConfig;
use super::population::{GenerationStats, Population};
use super::types::Individual;
use crate::error::{EvolveError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of an evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionResult<I: Individual> {
    /// The best individual of the final population.
    pub best: I,

    /// Fitness of `best`.
    pub best_fitness: f64,

    /// Number of generations evolved by this run.
    pub generations: usize,

    /// Whether the run stopped because `best_fitness >= threshold`.
    pub reached_threshold: bool,

    /// Whether the run was stopped by the cancellation flag.
    pub cancelled: bool,

    /// Best fitness of the initial population and after each generation.
    pub fitness_history: Vec<f64>,

    /// Per-generation counters, one entry per evolved generation.
    pub generation_stats: Vec<GenerationStats>,

    /// Wall-clock time spent in the loop.
    pub elapsed: Duration,

    /// The final population, usable with [`EvolutionRunner::resume`].
    pub population: Population<I>,
}

/// Receives the counters of each finished generation.
///
/// Useful for progress reporting or external communication. Closures
/// taking `&GenerationStats` implement it.
pub trait GenerationObserver {
    /// Called after every generation. The default does nothing.
    fn on_generation(&self, _stats: &GenerationStats) {}
}

impl<F: Fn(&GenerationStats)> GenerationObserver for F {
    fn on_generation(&self, stats: &GenerationStats) {
        self(stats)
    }
}

/// Observer that ignores every generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

/// Executes the evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let config = EvolutionConfig::default().with_population_size(50).with_seed(42);
/// let result = EvolutionRunner::run(&config, |rng| Placement::random(&problem, rng))?;
/// println!("best fitness: {}", result.best_fitness);
/// ```
pub struct EvolutionRunner;

impl EvolutionRunner {
    /// Seeds `config.population_size` individuals from `factory` and
    /// evolves them.
    pub fn run<I, F>(config: &EvolutionConfig, factory: F) -> Result<EvolutionResult<I>>
    where
        I: Individual,
        F: FnMut(&mut StdRng) -> I,
    {
        Self::run_with_cancel(config, factory, None)
    }

    /// Like [`run`](Self::run), with an optional cancellation flag.
    ///
    /// The flag is checked before each generation. Once it is `true` the
    /// run stops and returns the best individual found so far with
    /// `cancelled` set; this is not an error.
    pub fn run_with_cancel<I, F>(
        config: &EvolutionConfig,
        factory: F,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<EvolutionResult<I>>
    where
        I: Individual,
        F: FnMut(&mut StdRng) -> I,
    {
        config.validate()?;
        let mut rng = create_rng(config.seed);
        let population = Population::random(config.population_size, &mut rng, factory)?;
        drive(population, config, cancel, &NoopObserver, &mut rng)
    }

    /// Continues evolving an existing population.
    pub fn resume<I: Individual>(
        population: Population<I>,
        config: &EvolutionConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<EvolutionResult<I>> {
        Self::resume_with_observer(population, config, cancel, &NoopObserver)
    }

    /// Continues evolving an existing population, reporting each
    /// generation to `observer`.
    ///
    /// A seeded config is offset by the population's generation count, so
    /// resuming a seeded run continues with a fresh random stream instead of
    /// replaying the first one.
    pub fn resume_with_observer<I, O>(
        population: Population<I>,
        config: &EvolutionConfig,
        cancel: Option<Arc<AtomicBool>>,
        observer: &O,
    ) -> Result<EvolutionResult<I>>
    where
        I: Individual,
        O: GenerationObserver + ?Sized,
    {
        config.validate()?;
        if population.len() != config.population_size {
            return Err(EvolveError::config(format!(
                "population has {} individuals but population_size is {}",
                population.len(),
                config.population_size
            )));
        }
        let mut rng = create_rng(resume_seed(config.seed, population.generation()));
        drive(population, config, cancel, observer, &mut rng)
    }
}

fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    }
}

fn resume_seed(seed: Option<u64>, generation: usize) -> Option<u64> {
    seed.map(|s| s.wrapping_add(generation as u64))
}

fn drive<I, O>(
    mut population: Population<I>,
    config: &EvolutionConfig,
    cancel: Option<Arc<AtomicBool>>,
    observer: &O,
    rng: &mut StdRng,
) -> Result<EvolutionResult<I>>
where
    I: Individual,
    O: GenerationObserver + ?Sized,
{
    info!(
        threshold = config.threshold,
        epochs = config.epochs,
        retain = config.retain,
        random_select = config.random_select,
        mutate_rate = config.mutate_rate,
        workers = config.workers,
        population = population.len(),
        "starting evolution"
    );

    let start = Instant::now();
    let mut fitness_history = Vec::new();
    fitness_history.push(population.best_fitness());
    let mut generation_stats = Vec::new();
    let mut epoch = 0usize;
    let mut cancelled = false;

    while population.best_fitness() < config.threshold && epoch < config.epochs {
        if let Some(ref flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
        }

        let evolved = match population.evolve(config, rng) {
            Ok(evolved) => evolved,
            Err(e) => {
                warn!(error = %e, epoch, "evolution aborted");
                return Err(e);
            }
        };
        population = evolved.population;
        let stats = evolved.stats;
        epoch += 1;

        debug!(
            generation = stats.generation,
            best_fitness = stats.best_fitness,
            promoted = stats.promoted,
            mutated = stats.mutated,
            children = stats.children,
            "generation complete"
        );
        observer.on_generation(&stats);
        fitness_history.push(stats.best_fitness);
        generation_stats.push(stats);
    }

    let elapsed = start.elapsed();
    let best_fitness = population.best_fitness();
    let reached_threshold = best_fitness >= config.threshold;

    let elapsed_ms = elapsed.as_millis() as u64;
    if cancelled {
        info!(generations = epoch, best_fitness, elapsed_ms, "interrupted");
    } else {
        info!(
            generations = epoch,
            best_fitness,
            reached_threshold,
            elapsed_ms,
            "evolution finished"
        );
    }

    Ok(EvolutionResult {
        best: population.best().clone(),
        best_fitness,
        generations: epoch,
        reached_threshold,
        cancelled,
        fitness_history,
        generation_stats,
        elapsed,
        population,
    })
}

// ============================================================================
// Tests
// ============================================================================
