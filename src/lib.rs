//! Generational evolutionary optimization with parallel mutation and
//! breeding.
//!
//! Callers supply a candidate-solution type implementing
//! [`evolve::Individual`] and a factory for random instances. The engine
//! handles selection, dispatches mutation and breeding to a fixed pool of
//! worker threads, keeps the population size constant, and stops on a
//! fitness threshold, an epoch budget or a cancellation flag.
//!
//! # Modules
//!
//! - [`evolve`]: the engine (config, population, worker pool, runner)
//! - [`error`]: error taxonomy
//! - `interrupt` (feature `ctrlc`): Ctrl-C to cancellation flag
//!
//! # Architecture
//!
//! This crate contains no problem-specific concepts. Encodings, scoring,
//! input parsing and output serialization belong to consumers.

pub mod error;
pub mod evolve;
#[cfg(feature = "ctrlc")]
pub mod interrupt;

pub use error::{EvolveError, Phase, PoolError, Result};
