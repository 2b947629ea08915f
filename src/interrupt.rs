//! Ctrl-C to cancellation flag.
//!
//! The runner only understands an `Arc<AtomicBool>`; this module wires a
//! process signal handler to one so an interactive run can be stopped and
//! still report its best individual.

use crate::error::{EvolveError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Installs a Ctrl-C handler and returns the flag it raises.
///
/// Pass the flag to
/// [`EvolutionRunner::run_with_cancel`](crate::evolve::EvolutionRunner::run_with_cancel).
/// Only one handler can be installed per process; a second call fails.
pub fn cancel_on_ctrlc() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        info!("interrupt received, stopping after the current generation");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| EvolveError::Interrupt(e.to_string()))?;
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_handler_is_rejected() {
        // Whichever call comes first may succeed; the second never does.
        let first = cancel_on_ctrlc();
        let second = cancel_on_ctrlc();
        assert!(matches!(second, Err(EvolveError::Interrupt(_))));
        if let Ok(flag) = first {
            assert!(!flag.load(Ordering::SeqCst));
        }
    }
}
