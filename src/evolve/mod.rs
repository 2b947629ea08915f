//! Generational evolution with worker-pool parallelism.
//!
//! A population of candidate solutions is sorted by fitness, the best are
//! kept as parents (plus a few random promotions for diversity), some
//! parents are mutated, and the rest of the next generation is bred from
//! random parent pairs. Mutation and breeding run on a fixed pool of worker
//! threads; everything else runs on the calling thread.
//!
//! # Core Trait
//!
//! - [`Individual`]: a candidate solution with `fitness`, `mutate` and
//!   `breed`. Higher fitness is better.
//!
//! # Key Types
//!
//! - [`EvolutionConfig`]: population size, stopping rules, rates, workers
//! - [`Population`]: one generation and the [`evolve`](Population::evolve) step
//! - [`WorkerPool`]: fan-out/fan-in threads for one phase
//! - [`EvolutionRunner`]: the outer loop, returning an [`EvolutionResult`]
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod pool;
mod population;
mod runner;
mod types;

pub use config::EvolutionConfig;
pub use pool::{WorkUnit, WorkerPool};
pub use population::{Evolved, GenerationStats, Population};
pub use runner::{EvolutionResult, EvolutionRunner, GenerationObserver, NoopObserver};
pub use types::Individual;
