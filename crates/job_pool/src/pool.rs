//! Semaphore-gated execution on the blocking thread pool

use crate::context::JobContext;
use crate::error::PoolError;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs at most `capacity` blocking jobs at once.
///
/// The semaphore is the only state shared between submissions; the two
/// counters exist for observability and never gate admission.
#[derive(Debug)]
pub struct JobPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    waiting: Arc<AtomicUsize>,
}

impl JobPool {
    /// Create a pool. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        if capacity == 0 {
            tracing::warn!("job pool capacity 0 requested, using 1");
        }
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently executing
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submissions waiting for a slot
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Stop admitting jobs. Running jobs are unaffected.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Run `job` once a slot is free.
    ///
    /// Resolves to exactly one of: the job's value, the job's error, a
    /// panic report, or a cancellation. If `ctx` ends before a slot is
    /// granted the job is never invoked. If it ends while the job runs,
    /// this call returns `Cancelled { started: true }` immediately and the
    /// job keeps its slot until it finishes.
    pub async fn submit<T, E, F>(&self, ctx: &JobContext, job: F) -> Result<T, PoolError<E>>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        if ctx.is_cancelled() {
            return Err(PoolError::Cancelled { started: false });
        }

        let acquired = {
            let _waiting = Gauge::enter(&self.waiting);
            tokio::select! {
                biased;
                _ = ctx.cancelled() => None,
                permit = self.semaphore.clone().acquire_owned() => Some(permit),
            }
        };

        let permit = match acquired {
            None => {
                tracing::debug!(waiting = self.waiting(), "submission cancelled while queued");
                return Err(PoolError::Cancelled { started: false });
            }
            Some(Err(_)) => return Err(PoolError::Closed),
            Some(Ok(permit)) => permit,
        };

        let in_flight = Gauge::enter(&self.in_flight);
        tracing::debug!(
            capacity = self.capacity,
            in_flight = self.in_flight(),
            waiting = self.waiting(),
            "job admitted"
        );

        let handle = tokio::task::spawn_blocking(move || {
            // Both drop when the job returns or unwinds
            let _permit = permit;
            let _in_flight = in_flight;
            job()
        });

        tokio::select! {
            biased;
            joined = handle => match joined {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(PoolError::Job(e)),
                Err(join_error) => {
                    let message = if join_error.is_panic() {
                        panic_message(join_error.into_panic())
                    } else {
                        "job was aborted".to_string()
                    };
                    tracing::warn!(error = %message, "job panicked");
                    Err(PoolError::Panicked(message))
                }
            },
            _ = ctx.cancelled() => {
                tracing::debug!("caller gave up on a running job; it will finish detached");
                Err(PoolError::Cancelled { started: true })
            }
        }
    }
}

/// Increments a counter for as long as it lives
struct Gauge(Arc<AtomicUsize>);

impl Gauge {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Gauge {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_raised() {
        assert_eq!(JobPool::new(0).capacity(), 1);
        assert_eq!(JobPool::new(5).capacity(), 5);
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic payload");
    }

    #[tokio::test]
    async fn test_submit_returns_value() {
        let pool = JobPool::new(2);
        let out: Result<u32, PoolError<()>> = pool.submit(&JobContext::new(), || Ok(21 * 2)).await;
        assert_eq!(out.unwrap(), 42);
        assert_eq!(pool.in_flight(), 0);
    }
}
