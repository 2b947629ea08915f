//! One generation of individuals and the step that produces the next.
//!
//! [`Population::evolve`] runs the generational algorithm:
//!
//! 1. Stable sort by fitness, best first.
//! 2. Keep the top `floor(N * retain)` as parents.
//! 3. Promote each remaining individual with probability `random_select`.
//! 4. Send each parent to the mutation pool with probability `mutate_rate`.
//! 5. Breed random distinct pairs of parents until the size is back to N.
//! 6. Stable sort parents and children together.
//!
//! Mutation and breeding each get a fresh [`WorkerPool`] that is shut down
//! before the phase returns.

use super::config::EvolutionConfig;
use super::pool::{WorkUnit, WorkerPool};
use super::types::{descending, Individual};
use crate::error::{EvolveError, Phase, PoolError, Result};
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Counters describing how one generation was built.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    /// Parents kept purely by rank.
    pub retained: usize,
    /// Parents promoted by diversity injection.
    pub promoted: usize,
    /// Parents sent to the mutation pool.
    pub mutated: usize,
    /// Children produced by breeding.
    pub children: usize,
    /// Best fitness in the new generation.
    pub best_fitness: f64,
}

/// Output of [`Population::evolve`].
#[derive(Debug, Clone)]
pub struct Evolved<I: Individual> {
    /// The next generation, sorted best first.
    pub population: Population<I>,
    /// How it was built.
    pub stats: GenerationStats,
}

/// An ordered, non-empty generation of individuals.
#[derive(Debug, Clone)]
pub struct Population<I: Individual> {
    individuals: Vec<I>,
    generation: usize,
}

impl<I: Individual> Population<I> {
    /// Wraps an existing set of individuals, sorting them best first.
    ///
    /// Fails when fewer than two individuals are given, since breeding
    /// needs a distinct pair.
    pub fn new(individuals: Vec<I>) -> Result<Self> {
        if individuals.len() < 2 {
            return Err(EvolveError::config(format!(
                "population needs at least 2 individuals, got {}",
                individuals.len()
            )));
        }
        Ok(Self {
            individuals: sort_by_fitness(individuals, false),
            generation: 0,
        })
    }

    /// Seeds a population of `size` individuals from `factory`.
    pub fn random<R, F>(size: usize, rng: &mut R, mut factory: F) -> Result<Self>
    where
        R: Rng + ?Sized,
        F: FnMut(&mut R) -> I,
    {
        let individuals = (0..size).map(|_| factory(&mut *rng)).collect();
        Self::new(individuals)
    }

    /// Number of individuals (N).
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Never true for a constructed population, which holds at least two
    /// individuals.
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Number of completed `evolve` steps.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Individuals, best first.
    pub fn individuals(&self) -> &[I] {
        &self.individuals
    }

    /// Consumes the population, returning its individuals best first.
    pub fn into_individuals(self) -> Vec<I> {
        self.individuals
    }

    /// The best individual.
    pub fn best(&self) -> &I {
        &self.individuals[0]
    }

    /// Fitness of the best individual.
    pub fn best_fitness(&self) -> f64 {
        self.best().fitness()
    }

    /// Produces the next generation.
    ///
    /// The returned population has the same size as `self`. `config` is
    /// validated first. Worker faults are reported with the number of the
    /// generation being built.
    pub fn evolve<R: Rng + ?Sized>(
        self,
        config: &EvolutionConfig,
        rng: &mut R,
    ) -> Result<Evolved<I>> {
        config.validate()?;
        let size = self.individuals.len();
        let generation = self.generation + 1;
        let fault = move |phase: Phase| move |source: PoolError| EvolveError::WorkerFault {
            generation,
            phase,
            source,
        };

        let sorted = sort_by_fitness(self.individuals, config.parallel_fitness);

        let (parents, promoted) = select_parents(sorted, config, rng);
        let retained = parents.len() - promoted;

        let (parents, mutated) =
            mutate_parents(parents, config, rng).map_err(fault(Phase::Mutation))?;

        let needed = size.saturating_sub(parents.len());
        if needed > 0 && parents.len() < 2 {
            return Err(EvolveError::config(format!(
                "generation {generation}: {} parent(s) cannot breed {needed} children",
                parents.len()
            )));
        }
        let children =
            breed_children(&parents, needed, config, rng).map_err(fault(Phase::Breeding))?;
        let child_count = children.len();

        let mut next = parents;
        next.extend(children);
        let individuals = sort_by_fitness(next, config.parallel_fitness);
        debug_assert_eq!(individuals.len(), size);

        let stats = GenerationStats {
            generation,
            retained,
            promoted,
            mutated,
            children: child_count,
            best_fitness: individuals[0].fitness(),
        };

        Ok(Evolved {
            population: Population {
                individuals,
                generation,
            },
            stats,
        })
    }
}

/// Stable sort, best first. Each fitness is computed exactly once.
fn sort_by_fitness<I: Individual>(individuals: Vec<I>, parallel: bool) -> Vec<I> {
    let keys = fitness_keys(&individuals, parallel);
    let mut keyed: Vec<(f64, I)> = keys.into_iter().zip(individuals).collect();
    keyed.sort_by(|a, b| descending(a.0, b.0));
    keyed.into_iter().map(|(_, ind)| ind).collect()
}

#[cfg(feature = "parallel")]
fn fitness_keys<I: Individual>(individuals: &[I], parallel: bool) -> Vec<f64> {
    if parallel {
        individuals.par_iter().map(|i| i.fitness()).collect()
    } else {
        individuals.iter().map(|i| i.fitness()).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn fitness_keys<I: Individual>(individuals: &[I], _parallel: bool) -> Vec<f64> {
    individuals.iter().map(|i| i.fitness()).collect()
}

/// Rank retention followed by diversity injection.
///
/// Returns the parents (retained ones first, in rank order) and how many
/// of them were promoted.
fn select_parents<I, R>(
    sorted: Vec<I>,
    config: &EvolutionConfig,
    rng: &mut R,
) -> (Vec<I>, usize)
where
    I: Individual,
    R: Rng + ?Sized,
{
    let retained = ((sorted.len() as f64 * config.retain) as usize).min(sorted.len());
    let mut parents = Vec::with_capacity(sorted.len());
    let mut promoted = 0;

    for (rank, individual) in sorted.into_iter().enumerate() {
        if rank < retained {
            parents.push(individual);
        } else if config.random_select > 0.0 && rng.random_bool(config.random_select) {
            parents.push(individual);
            promoted += 1;
        }
    }
    (parents, promoted)
}

/// Mutation phase.
///
/// Returns the unmarked parents in their original order followed by the
/// mutated ones in completion order, plus the number mutated. No pool is
/// started when nothing is marked.
fn mutate_parents<I, R>(
    parents: Vec<I>,
    config: &EvolutionConfig,
    rng: &mut R,
) -> std::result::Result<(Vec<I>, usize), PoolError>
where
    I: Individual,
    R: Rng + ?Sized,
{
    let mut kept = Vec::with_capacity(parents.len());
    let mut marked = Vec::new();
    for individual in parents {
        if config.mutate_rate > 0.0 && rng.random_bool(config.mutate_rate) {
            marked.push(WorkUnit::Mutate(individual));
        } else {
            kept.push(individual);
        }
    }

    let count = marked.len();
    if count == 0 {
        return Ok((kept, 0));
    }

    let mutated = WorkerPool::execute(Phase::Mutation, config.workers, rng.random(), marked)?;
    kept.extend(mutated);
    Ok((kept, count))
}

/// Draws a pair of distinct parent indices, re-drawing on equality.
fn draw_pair<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    debug_assert!(len >= 2);
    loop {
        let father = rng.random_range(0..len);
        let mother = rng.random_range(0..len);
        if father != mother {
            return (father, mother);
        }
    }
}

/// Breeding phase: one child per drawn pair, `needed` pairs in total.
fn breed_children<I, R>(
    parents: &[I],
    needed: usize,
    config: &EvolutionConfig,
    rng: &mut R,
) -> std::result::Result<Vec<I>, PoolError>
where
    I: Individual,
    R: Rng + ?Sized,
{
    if needed == 0 {
        return Ok(Vec::new());
    }

    let units: Vec<WorkUnit<I>> = (0..needed)
        .map(|_| {
            let (father, mother) = draw_pair(parents.len(), &mut *rng);
            WorkUnit::Breed {
                father: parents[father].clone(),
                mother: parents[mother].clone(),
            }
        })
        .collect();

    WorkerPool::execute(Phase::Breeding, config.workers, rng.random(), units)
}

// ============================================================================
// Tests
// ============================================================================
