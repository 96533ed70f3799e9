//! Error types for pool submission

use thiserror::Error;

/// Outcome of a submission that did not produce the job's value
#[derive(Debug, Error)]
pub enum PoolError<E> {
    /// The caller's context ended. When `started` is false the job body
    /// never ran; when true it is still running and will finish on its own.
    #[error("cancelled {}", phase(.started))]
    Cancelled { started: bool },

    /// The pool no longer admits jobs
    #[error("job pool is closed")]
    Closed,

    /// The job panicked; its slot has been released
    #[error("job panicked: {0}")]
    Panicked(String),

    /// The job ran and returned an error
    #[error(transparent)]
    Job(E),
}

fn phase(started: &bool) -> &'static str {
    if *started {
        "while the job was running"
    } else {
        "before the job started"
    }
}

impl<E> PoolError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PoolError::Cancelled { .. })
    }
}
