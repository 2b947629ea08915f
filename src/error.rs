//! Error types shared by the evolution engine.
//!
//! Two layers exist: [`PoolError`] describes what went wrong inside a
//! single worker pool, and [`EvolveError`] is what the public API returns,
//! wrapping pool failures with the generation and phase they occurred in.
//!
//! Cancellation is deliberately absent: an interrupted run is reported
//! through [`EvolutionResult::cancelled`](crate::evolve::EvolutionResult::cancelled).

use std::fmt;
use thiserror::Error;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EvolveError>;

/// The kind of work a pool executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// Single individuals perturbed in place.
    Mutation,
    /// Pairs of parents combined into one child.
    Breeding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Mutation => f.write_str("mutation"),
            Phase::Breeding => f.write_str("breeding"),
        }
    }
}

/// Failures raised by a [`WorkerPool`](crate::evolve::WorkerPool).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    /// A worker panicked while running `mutate` or `breed`.
    #[error("worker panicked: {message}")]
    WorkerPanicked { message: String },

    /// Fewer results arrived than units were submitted.
    #[error("expected {expected} results, received {received}")]
    MissingResults { expected: usize, received: usize },

    /// A unit of the wrong kind was submitted to a phase-specific pool.
    #[error("{unit} unit submitted to a {pool} pool")]
    PhaseMismatch { pool: Phase, unit: Phase },

    /// Work was submitted after the pool was shut down.
    #[error("task queue is closed")]
    Disconnected,

    /// A worker thread could not be joined.
    #[error("failed to join worker thread: {0}")]
    Join(String),
}

/// Errors returned by the public evolution API.
#[derive(Debug, Error)]
pub enum EvolveError {
    /// Invalid parameters, detected before any generation runs.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A worker pool failed while building a generation.
    #[error("{phase} fault in generation {generation}: {source}")]
    WorkerFault {
        /// 1-based number of the generation being built.
        generation: usize,
        phase: Phase,
        #[source]
        source: PoolError,
    },

    /// The interrupt handler could not be installed.
    #[error("failed to install interrupt handler: {0}")]
    Interrupt(String),
}

impl EvolveError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        EvolveError::Config(msg.into())
    }
}
