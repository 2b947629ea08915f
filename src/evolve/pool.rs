//! Fan-out/fan-in worker pool for mutation and breeding.
//!
//! A [`WorkerPool`] owns `W` OS threads that pull [`WorkUnit`]s from a
//! shared task channel and push finished individuals onto a shared result
//! channel. Shutdown sends one sentinel per worker and joins every thread,
//! so no work is in flight once it returns.
//!
//! Lifecycle of one phase:
//!
//! ```text
//! spawn ─► submit(units) ─► shutdown() ─► collect(units.len())
//! ```
//!
//! Both channels are unbounded, so `submit` never blocks and results can
//! be drained after the workers have exited.

use super::types::Individual;
use crate::error::{Phase, PoolError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{trace, warn};

/// One unit of work. Ownership moves into the worker that receives it.
#[derive(Debug, Clone)]
pub enum WorkUnit<I> {
    /// Mutate this individual and hand it back.
    Mutate(I),
    /// Breed `father` with `mother` and hand back the child.
    Breed { father: I, mother: I },
}

impl<I> WorkUnit<I> {
    /// The phase this unit belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            WorkUnit::Mutate(_) => Phase::Mutation,
            WorkUnit::Breed { .. } => Phase::Breeding,
        }
    }
}

enum Message<I> {
    Work(WorkUnit<I>),
    Sentinel,
}

type Outcome<I> = Result<I, String>;

/// A fixed-size pool of worker threads dedicated to one [`Phase`].
///
/// # Usage
///
/// ```ignore
/// let mut pool = WorkerPool::spawn(Phase::Mutation, 4, seed)?;
/// pool.submit(marked.into_iter().map(WorkUnit::Mutate))?;
/// pool.shutdown()?;
/// let mutated = pool.collect(count)?;
/// ```
pub struct WorkerPool<I: Individual> {
    phase: Phase,
    tasks: Sender<Message<I>>,
    results: Receiver<Outcome<I>>,
    workers: Vec<JoinHandle<()>>,
    submitted: usize,
}

impl<I: Individual> WorkerPool<I> {
    /// Starts `workers` threads for `phase`.
    ///
    /// Worker `i` draws its randomness from a `StdRng` seeded with
    /// `seed + i`.
    pub fn spawn(phase: Phase, workers: usize, seed: u64) -> Result<Self, PoolError> {
        let workers = workers.max(1);
        let (tasks, task_rx) = unbounded::<Message<I>>();
        let (result_tx, results) = unbounded::<Outcome<I>>();

        let mut pool = Self {
            phase,
            tasks,
            results,
            workers: Vec::with_capacity(workers),
            submitted: 0,
        };

        for i in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let handle = thread::Builder::new()
                .name(format!("{phase}-worker-{i}"))
                .spawn(move || worker_loop(task_rx, result_tx, rng))
                .map_err(|e| PoolError::Spawn(e.to_string()))?;
            pool.workers.push(handle);
        }

        trace!(%phase, workers, "worker pool started");
        Ok(pool)
    }

    /// Spawns a pool, runs `units` through it, tears it down and returns
    /// exactly one result per unit.
    pub fn execute(
        phase: Phase,
        workers: usize,
        seed: u64,
        units: Vec<WorkUnit<I>>,
    ) -> Result<Vec<I>, PoolError> {
        let mut pool = Self::spawn(phase, workers, seed)?;
        let count = pool.submit(units)?;
        pool.shutdown()?;
        pool.collect(count)
    }

    /// The phase this pool serves.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of worker threads still attached to the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Total number of units submitted so far.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Enqueues every unit and returns how many were enqueued.
    ///
    /// Units are checked against the pool phase before any is sent, so a
    /// rejected batch leaves the queue untouched.
    pub fn submit<U>(&mut self, units: U) -> Result<usize, PoolError>
    where
        U: IntoIterator<Item = WorkUnit<I>>,
    {
        if self.workers.is_empty() {
            return Err(PoolError::Disconnected);
        }
        let units: Vec<WorkUnit<I>> = units.into_iter().collect();
        if let Some(unit) = units.iter().find(|u| u.phase() != self.phase) {
            return Err(PoolError::PhaseMismatch {
                pool: self.phase,
                unit: unit.phase(),
            });
        }

        let count = units.len();
        for unit in units {
            self.tasks
                .send(Message::Work(unit))
                .map_err(|_| PoolError::Disconnected)?;
        }
        self.submitted += count;
        Ok(count)
    }

    /// Sends one sentinel per worker and waits for all of them to exit.
    ///
    /// Calling it again is a no-op.
    pub fn shutdown(&mut self) -> Result<(), PoolError> {
        if self.workers.is_empty() {
            return Ok(());
        }
        for _ in 0..self.workers.len() {
            // A send only fails when every worker is already gone, which
            // the joins below report.
            let _ = self.tasks.send(Message::Sentinel);
        }

        let mut failure = None;
        for handle in self.workers.drain(..) {
            if let Err(payload) = handle.join() {
                failure.get_or_insert(PoolError::Join(panic_message(payload.as_ref())));
            }
        }
        trace!(phase = %self.phase, submitted = self.submitted, "worker pool stopped");

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Blocks until exactly `count` results have been received.
    ///
    /// Results arrive in completion order, not submission order. All
    /// `count` results are drained even when one reports a fault; the first
    /// fault is then returned.
    pub fn collect(&self, count: usize) -> Result<Vec<I>, PoolError> {
        let mut out = Vec::with_capacity(count);
        let mut fault = None;

        for received in 0..count {
            match self.results.recv() {
                Ok(Ok(individual)) => out.push(individual),
                Ok(Err(message)) => {
                    warn!(phase = %self.phase, %message, "worker fault");
                    fault.get_or_insert(PoolError::WorkerPanicked { message });
                }
                Err(_) => {
                    return Err(fault.unwrap_or(PoolError::MissingResults {
                        expected: count,
                        received,
                    }));
                }
            }
        }

        match fault {
            Some(err) => Err(err),
            None => Ok(out),
        }
    }
}

impl<I: Individual> Drop for WorkerPool<I> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(phase = %self.phase, error = %e, "worker pool shutdown on drop failed");
        }
    }
}

fn worker_loop<I: Individual>(
    tasks: Receiver<Message<I>>,
    results: Sender<Outcome<I>>,
    mut rng: StdRng,
) {
    while let Ok(message) = tasks.recv() {
        let unit = match message {
            Message::Work(unit) => unit,
            Message::Sentinel => break,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match unit {
            WorkUnit::Mutate(mut individual) => {
                individual.mutate(&mut rng);
                individual
            }
            WorkUnit::Breed { father, mother } => father.breed(&mother, &mut rng),
        }))
        .map_err(|payload| panic_message(payload.as_ref()));

        if results.send(outcome).is_err() {
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
