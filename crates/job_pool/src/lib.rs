//! Job Pool - admission control for expensive blocking work
//!
//! A [`JobPool`] of capacity N runs at most N jobs at a time on tokio's
//! blocking thread pool. Callers wait for a slot asynchronously and may
//! give up while waiting; a job that has started always runs to
//! completion and releases its slot itself.

mod context;
mod error;
mod pool;

pub use context::JobContext;
pub use error::PoolError;
pub use pool::JobPool;
